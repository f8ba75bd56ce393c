//! Temporal stability windows over per-frame signals

use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};

use crate::config::StabilityConfig;

/// Per-frame samples fed to the stability windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSignals {
    pub face_detected: bool,
    pub eyes_detected: bool,
    pub head_pose_valid: bool,
    /// Gaze score above threshold (not the strict per-eye gate)
    pub gaze_sample: bool,
}

/// Fraction of recent frames in which each signal held, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StabilityRatios {
    pub face: f64,
    pub eye: f64,
    pub pose: f64,
    pub gaze: f64,
}

/// Four independent fixed-capacity boolean windows
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    face: RingBuffer<bool>,
    eye: RingBuffer<bool>,
    pose: RingBuffer<bool>,
    gaze: RingBuffer<bool>,
}

impl StabilityTracker {
    /// # Panics
    ///
    /// Panics if any capacity is zero; [`crate::AttentionConfig::validate`]
    /// rejects such configurations.
    pub fn new(config: &StabilityConfig) -> Self {
        Self {
            face: RingBuffer::new(config.face_window),
            eye: RingBuffer::new(config.eye_window),
            pose: RingBuffer::new(config.pose_window),
            gaze: RingBuffer::new(config.gaze_window),
        }
    }

    /// Append one frame's samples and return the updated ratios
    pub fn record(&mut self, signals: FrameSignals) -> StabilityRatios {
        self.face.push(signals.face_detected);
        self.eye.push(signals.eyes_detected);
        self.pose.push(signals.head_pose_valid);
        self.gaze.push(signals.gaze_sample);
        self.ratios()
    }

    pub fn ratios(&self) -> StabilityRatios {
        StabilityRatios {
            face: self.face.ratio(),
            eye: self.eye.ratio(),
            pose: self.pose.ratio(),
            gaze: self.gaze.ratio(),
        }
    }

    /// Samples currently held per window: (face, eye, pose, gaze)
    pub fn lengths(&self) -> (usize, usize, usize, usize) {
        (self.face.len(), self.eye.len(), self.pose.len(), self.gaze.len())
    }
}

impl Default for StabilityTracker {
    fn default() -> Self {
        Self::new(&StabilityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(face: bool, eyes: bool, pose: bool, gaze: bool) -> FrameSignals {
        FrameSignals {
            face_detected: face,
            eyes_detected: eyes,
            head_pose_valid: pose,
            gaze_sample: gaze,
        }
    }

    #[test]
    fn test_empty_ratios_are_zero() {
        let tracker = StabilityTracker::default();
        assert_eq!(tracker.ratios(), StabilityRatios::default());
    }

    #[test]
    fn test_windows_are_independent() {
        let mut tracker = StabilityTracker::default();
        tracker.record(signals(true, false, true, false));
        let ratios = tracker.record(signals(true, true, false, false));

        assert_eq!(ratios.face, 1.0);
        assert_eq!(ratios.eye, 0.5);
        assert_eq!(ratios.pose, 0.5);
        assert_eq!(ratios.gaze, 0.0);
    }

    #[test]
    fn test_capacities() {
        let mut tracker = StabilityTracker::default();
        for _ in 0..50 {
            tracker.record(FrameSignals::default());
        }
        assert_eq!(tracker.lengths(), (10, 15, 12, 20));
    }

    #[test]
    fn test_gaze_window_eviction() {
        let mut tracker = StabilityTracker::default();
        for _ in 0..20 {
            tracker.record(signals(true, true, true, false));
        }
        assert_eq!(tracker.ratios().gaze, 0.0);

        let ratios = tracker.record(signals(true, true, true, true));
        assert!((ratios.gaze - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_face_window_recovers_after_capacity() {
        let mut tracker = StabilityTracker::default();
        for _ in 0..10 {
            tracker.record(signals(false, false, false, false));
        }
        for _ in 0..10 {
            tracker.record(signals(true, false, false, false));
        }
        // Face window holds 10: only the recent trues remain
        assert_eq!(tracker.ratios().face, 1.0);

        // Pose window holds 12: one false among the last twelve samples
        for _ in 0..12 {
            tracker.record(signals(true, true, true, true));
        }
        tracker.record(signals(true, true, false, true));
        assert!((tracker.ratios().pose - 11.0 / 12.0).abs() < 1e-12);
    }
}
