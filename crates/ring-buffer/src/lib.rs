//! Fixed-Capacity Ring Buffer
//!
//! Provides a bounded FIFO that evicts its oldest entry once full. Used to keep
//! the most recent per-frame samples of each attention signal.

mod buffer;

pub use buffer::RingBuffer;

/// A sample that can be counted as a hit when computing window ratios
pub trait Sample: Copy {
    /// Whether this sample counts towards the ratio numerator
    fn is_hit(&self) -> bool;
}

impl Sample for bool {
    fn is_hit(&self) -> bool {
        *self
    }
}
