//! Ring Buffer Implementation

use crate::Sample;

/// Bounded FIFO over pre-allocated storage
///
/// Pushing into a full buffer overwrites the oldest entry, so `len()` never
/// exceeds `capacity()`.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: Box<[T]>,
    /// Index of the next write
    head: usize,
    /// Number of live entries
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be > 0");
        Self {
            storage: vec![T::default(); capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }
}

impl<T: Copy> RingBuffer<T> {
    /// Push a sample, overwriting the oldest one if the buffer is full
    pub fn push(&mut self, value: T) {
        let capacity = self.capacity();
        if self.len < capacity {
            self.len += 1;
        }
        self.storage[self.head] = value;
        self.head = (self.head + 1) % capacity;
    }

    /// Get the number of samples currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Index of the oldest live sample
    fn tail(&self) -> usize {
        (self.head + self.capacity() - self.len) % self.capacity()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let tail = self.tail();
        let capacity = self.capacity();
        (0..self.len).map(move |i| self.storage[(tail + i) % capacity])
    }
}

impl<T: Sample> RingBuffer<T> {
    /// Number of hits among the live samples
    pub fn hits(&self) -> usize {
        self.iter().filter(|s| s.is_hit()).count()
    }

    /// Fraction of live samples that are hits; 0.0 when empty
    pub fn ratio(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.hits() as f64 / self.len as f64
    }
}
