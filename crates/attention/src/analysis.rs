//! Per-frame attention report

use alerting::AttentionStatus;
use serde::{Deserialize, Serialize};

use crate::pose::HeadPose;
use crate::stability::StabilityRatios;

/// Complete result of processing one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Whether the detector returned landmarks
    pub face_detected: bool,

    /// Whether both eye regions could be measured
    pub eyes_detected: bool,

    /// Pose solved and within the facing limits
    pub head_pose_valid: bool,

    /// Both irises individually centered (instantaneous)
    pub looking_at_camera: bool,

    /// Head pitch in degrees, absent when the solve failed
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,
    pub roll: Option<f64>,

    /// Mean eye aspect ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear: Option<f64>,

    /// Combined gaze score, present only when gaze was evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_score: Option<f64>,

    pub stability: StabilityRatios,

    /// Conjunctive verdict over stability and the instantaneous gaze gate
    pub final_valid: bool,

    /// Seconds since `looking_at_camera` last held
    pub time_since_valid: f64,

    pub accuracy_pct: f64,
    pub fps: f64,
    pub status: AttentionStatus,
}

impl FrameReport {
    /// Solved head pose, if any
    pub fn head_pose(&self) -> Option<HeadPose> {
        match (self.pitch, self.yaw, self.roll) {
            (Some(pitch), Some(yaw), Some(roll)) => Some(HeadPose { pitch, yaw, roll }),
            _ => None,
        }
    }

    /// Check if the frame should raise an attention alert
    pub fn needs_attention(&self) -> bool {
        self.status.is_alert()
    }
}
