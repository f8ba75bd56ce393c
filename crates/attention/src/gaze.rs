//! Gaze classification from iris positions

use serde::{Deserialize, Serialize};

use crate::config::GazeConfig;
use crate::eye::IrisPosition;

/// Result of classifying one frame's iris positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeEstimate {
    /// Both eyes individually centered (instantaneous gate)
    pub looking_at_camera: bool,
    /// `1 - (|avg_x - 0.5| + |avg_y - 0.5|)` over both eyes
    pub score: f64,
    /// `score` above the stability threshold; the sample fed to the gaze window
    pub stable_sample: bool,
}

/// Fuses left/right iris positions into a gaze verdict
#[derive(Debug, Clone)]
pub struct GazeClassifier {
    config: GazeConfig,
}

impl GazeClassifier {
    pub fn new(config: GazeConfig) -> Self {
        Self { config }
    }

    /// Whether a single eye's iris sits inside the centered band
    pub fn is_centered(&self, iris: &IrisPosition) -> bool {
        iris.is_within(self.config.center_min, self.config.center_max)
    }

    /// Continuous score: 1.0 when both averaged ratios are exactly centered
    pub fn score(left: &IrisPosition, right: &IrisPosition) -> f64 {
        let avg_x_deviation = ((left.x + right.x) / 2.0 - 0.5).abs();
        let avg_y_deviation = ((left.y + right.y) / 2.0 - 0.5).abs();
        1.0 - (avg_x_deviation + avg_y_deviation)
    }

    pub fn classify(&self, left: &IrisPosition, right: &IrisPosition) -> GazeEstimate {
        let score = Self::score(left, right);
        GazeEstimate {
            looking_at_camera: self.is_centered(left) && self.is_centered(right),
            score,
            stable_sample: score > self.config.score_threshold,
        }
    }
}

impl Default for GazeClassifier {
    fn default() -> Self {
        Self::new(GazeConfig::default())
    }
}
