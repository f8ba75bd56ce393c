//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Alerting errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlertError {
    /// Threshold must be finite and non-negative
    #[error("Invalid alert threshold: {0} seconds")]
    InvalidThreshold(f64),
}

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Seconds without a valid gaze before attention is required (default: 3.0)
    pub threshold_seconds: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_seconds: 3.0,
        }
    }
}

impl AlertConfig {
    /// Check that the threshold is usable
    pub fn validate(&self) -> Result<(), AlertError> {
        validate_threshold(self.threshold_seconds)
    }
}

fn validate_threshold(seconds: f64) -> Result<(), AlertError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(AlertError::InvalidThreshold(seconds))
    }
}

/// Per-frame attention status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionStatus {
    /// Subject is looking at the camera this frame
    LookingAtCamera,
    /// Not looking, but still within the grace period
    #[default]
    Adjusting,
    /// Not looking for longer than the alert threshold
    AttentionRequired,
}

impl AttentionStatus {
    /// Whether this status should be surfaced as an alert
    pub fn is_alert(&self) -> bool {
        matches!(self, AttentionStatus::AttentionRequired)
    }
}

/// Alert manager for lapse detection and episode counting
#[derive(Debug)]
pub struct AlertManager {
    /// Configuration
    config: AlertConfig,
    /// Whether a lapse episode is in progress
    active: bool,
    /// Lapse episodes since the last reset
    episodes: u64,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Result<Self, AlertError> {
        config.validate()?;
        info!("Creating alert manager with config: {:?}", config);
        Ok(Self {
            config,
            active: false,
            episodes: 0,
        })
    }

    /// Classify the current frame and track lapse episodes
    pub fn evaluate(&mut self, looking_at_camera: bool, time_since_valid: f64) -> AttentionStatus {
        if looking_at_camera {
            if self.active {
                info!("Attention restored");
            }
            self.active = false;
            return AttentionStatus::LookingAtCamera;
        }

        if time_since_valid > self.config.threshold_seconds {
            if !self.active {
                self.active = true;
                self.episodes += 1;
                warn!(
                    "Attention required: no valid gaze for {:.1}s (episode {})",
                    time_since_valid, self.episodes
                );
            }
            AttentionStatus::AttentionRequired
        } else {
            self.active = false;
            AttentionStatus::Adjusting
        }
    }

    /// Change the alert threshold
    pub fn set_threshold(&mut self, seconds: f64) -> Result<(), AlertError> {
        validate_threshold(seconds)?;
        debug!(
            "Alert threshold changed: {}s -> {}s",
            self.config.threshold_seconds, seconds
        );
        self.config.threshold_seconds = seconds;
        Ok(())
    }

    /// Lapse episodes since the last reset
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Clear episode state
    pub fn reset(&mut self) {
        self.active = false;
        self.episodes = 0;
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self {
            config: AlertConfig::default(),
            active: false,
            episodes: 0,
        }
    }
}
