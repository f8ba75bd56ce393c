//! Attention estimator configuration

use alerting::AlertConfig;
use serde::{Deserialize, Serialize};

use crate::AttentionError;

/// Frame geometry used to build the pinhole camera model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Eye openness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// Mean eye aspect ratio above which eyes count as open
    pub ear_threshold: f64,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self { ear_threshold: 0.22 }
    }
}

/// Iris gaze settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Lower bound (exclusive) of the centered band
    pub center_min: f64,
    /// Upper bound (exclusive) of the centered band
    pub center_max: f64,
    /// Gaze score above which the stability sample is true
    pub score_threshold: f64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            center_min: 0.4,
            center_max: 0.6,
            score_threshold: 0.8,
        }
    }
}

/// Head pose acceptance limits (degrees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub max_pitch_deg: f64,
    pub max_yaw_deg: f64,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            max_pitch_deg: 15.0,
            max_yaw_deg: 15.0,
        }
    }
}

/// Stability window capacities (frames)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub face_window: usize,
    pub eye_window: usize,
    pub pose_window: usize,
    pub gaze_window: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            face_window: 10,
            eye_window: 15,
            pose_window: 12,
            gaze_window: 20,
        }
    }
}

/// Minimum stability ratios (exclusive) for a valid frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub min_face_stability: f64,
    pub min_eye_stability: f64,
    pub min_pose_stability: f64,
    pub min_gaze_stability: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_face_stability: 0.85,
            min_eye_stability: 0.80,
            min_pose_stability: 0.75,
            min_gaze_stability: 0.70,
        }
    }
}

/// Attention estimator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub frame: FrameConfig,
    pub eye: EyeConfig,
    pub gaze: GazeConfig,
    pub pose: PoseConfig,
    pub stability: StabilityConfig,
    pub decision: DecisionConfig,
    pub alert: AlertConfig,
}

impl AttentionConfig {
    /// Create strict config (tighter gaze band and pose limits)
    pub fn strict() -> Self {
        Self {
            gaze: GazeConfig {
                center_min: 0.42,
                center_max: 0.58,
                ..Default::default()
            },
            pose: PoseConfig {
                max_pitch_deg: 10.0,
                max_yaw_deg: 10.0,
            },
            alert: AlertConfig {
                threshold_seconds: 2.0,
            },
            ..Default::default()
        }
    }

    /// Create lenient config (wider gaze band and pose limits)
    pub fn lenient() -> Self {
        Self {
            gaze: GazeConfig {
                center_min: 0.35,
                center_max: 0.65,
                ..Default::default()
            },
            pose: PoseConfig {
                max_pitch_deg: 25.0,
                max_yaw_deg: 25.0,
            },
            alert: AlertConfig {
                threshold_seconds: 5.0,
            },
            ..Default::default()
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), AttentionError> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(AttentionError::Config(format!(
                "frame size must be positive, got {}x{}",
                self.frame.width, self.frame.height
            )));
        }

        let s = &self.stability;
        if [s.face_window, s.eye_window, s.pose_window, s.gaze_window].contains(&0) {
            return Err(AttentionError::Config(
                "stability windows must hold at least one frame".into(),
            ));
        }

        if !(self.gaze.center_min < self.gaze.center_max) {
            return Err(AttentionError::Config(format!(
                "gaze band ({}, {}) is empty",
                self.gaze.center_min, self.gaze.center_max
            )));
        }

        let d = &self.decision;
        let ratios = [
            ("face", d.min_face_stability),
            ("eye", d.min_eye_stability),
            ("pose", d.min_pose_stability),
            ("gaze", d.min_gaze_stability),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(AttentionError::Config(format!(
                    "{name} stability threshold {value} is outside [0, 1]"
                )));
            }
        }

        if !self.eye.ear_threshold.is_finite()
            || !self.pose.max_pitch_deg.is_finite()
            || !self.pose.max_yaw_deg.is_finite()
        {
            return Err(AttentionError::Config("thresholds must be finite".into()));
        }

        self.alert.validate()?;
        Ok(())
    }
}
