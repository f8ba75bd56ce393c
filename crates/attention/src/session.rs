//! Session-wide counters and the end-of-session summary

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Overall grade of a session's accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceRating {
    pub fn from_accuracy(accuracy_pct: f64) -> Self {
        if accuracy_pct >= 95.0 {
            PerformanceRating::Excellent
        } else if accuracy_pct >= 85.0 {
            PerformanceRating::Good
        } else if accuracy_pct >= 70.0 {
            PerformanceRating::Fair
        } else {
            PerformanceRating::NeedsImprovement
        }
    }
}

/// Snapshot of a session's statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_frames: u64,
    pub valid_frames: u64,
    pub accuracy_pct: f64,
    pub duration_secs: f64,
    pub average_fps: f64,
    pub rating: PerformanceRating,
    pub alert_episodes: u64,
}

/// Counters spanning a monitoring session
#[derive(Debug, Clone)]
pub struct SessionStats {
    started_at: Instant,
    last_valid_at: Instant,
    total_frames: u64,
    valid_frames: u64,
}

impl SessionStats {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            last_valid_at: now,
            total_frames: 0,
            valid_frames: 0,
        }
    }

    /// Count a processed frame
    pub fn record_frame(&mut self, final_valid: bool) {
        self.total_frames += 1;
        if final_valid {
            self.valid_frames += 1;
        }
    }

    /// Note that the subject was looking at the camera at `now`
    pub fn mark_looking(&mut self, now: Instant) {
        self.last_valid_at = now;
    }

    /// Seconds since the subject was last looking at the camera
    pub fn time_since_valid(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.last_valid_at).as_secs_f64()
    }

    /// Session length in seconds
    pub fn elapsed(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started_at).as_secs_f64()
    }

    /// Valid frames as a percentage of all frames; 0 before any frame
    pub fn accuracy_pct(&self) -> f64 {
        self.valid_frames as f64 / self.total_frames.max(1) as f64 * 100.0
    }

    /// Frames per second, with elapsed time floored at one second
    pub fn fps(&self, now: Instant) -> f64 {
        self.total_frames as f64 / self.elapsed(now).max(1.0)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn valid_frames(&self) -> u64 {
        self.valid_frames
    }

    /// Zero the counters and restart both clocks at `now`
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    pub fn summary(&self, now: Instant, alert_episodes: u64) -> SessionSummary {
        let accuracy_pct = self.accuracy_pct();
        SessionSummary {
            total_frames: self.total_frames,
            valid_frames: self.valid_frames,
            accuracy_pct,
            duration_secs: self.elapsed(now),
            average_fps: self.fps(now),
            rating: PerformanceRating::from_accuracy(accuracy_pct),
            alert_episodes,
        }
    }
}
