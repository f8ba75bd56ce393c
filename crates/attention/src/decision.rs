//! Final attention verdict from stability ratios and the instantaneous gaze gate

use serde::{Deserialize, Serialize};

use crate::config::DecisionConfig;
use crate::stability::StabilityRatios;

/// One conjunct of the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    FaceStability,
    EyeStability,
    PoseStability,
    GazeStability,
    LookingAtCamera,
}

/// Conjunctive threshold rules over the smoothed signals
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// Criteria that fail for this frame, in evaluation order
    pub fn failing(&self, ratios: &StabilityRatios, looking_at_camera: bool) -> Vec<Criterion> {
        let checks = [
            (Criterion::FaceStability, ratios.face > self.config.min_face_stability),
            (Criterion::EyeStability, ratios.eye > self.config.min_eye_stability),
            (Criterion::PoseStability, ratios.pose > self.config.min_pose_stability),
            (Criterion::GazeStability, ratios.gaze > self.config.min_gaze_stability),
            (Criterion::LookingAtCamera, looking_at_camera),
        ];
        checks
            .into_iter()
            .filter(|(_, passed)| !passed)
            .map(|(criterion, _)| criterion)
            .collect()
    }

    /// All five criteria hold
    pub fn is_valid(&self, ratios: &StabilityRatios, looking_at_camera: bool) -> bool {
        ratios.face > self.config.min_face_stability
            && ratios.eye > self.config.min_eye_stability
            && ratios.pose > self.config.min_pose_stability
            && ratios.gaze > self.config.min_gaze_stability
            && looking_at_camera
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_stable() -> StabilityRatios {
        StabilityRatios {
            face: 1.0,
            eye: 1.0,
            pose: 1.0,
            gaze: 1.0,
        }
    }

    #[test]
    fn test_all_conditions_met() {
        let engine = DecisionEngine::default();
        assert!(engine.is_valid(&all_stable(), true));
        assert!(engine.failing(&all_stable(), true).is_empty());
    }

    #[test]
    fn test_each_conjunct_fails_alone() {
        let engine = DecisionEngine::default();

        let cases: [(fn(&mut StabilityRatios), Criterion); 4] = [
            (|r| r.face = 0.85, Criterion::FaceStability),
            (|r| r.eye = 0.80, Criterion::EyeStability),
            (|r| r.pose = 0.75, Criterion::PoseStability),
            (|r| r.gaze = 0.70, Criterion::GazeStability),
        ];
        for (degrade, criterion) in cases {
            let mut ratios = all_stable();
            degrade(&mut ratios);
            assert!(!engine.is_valid(&ratios, true), "{criterion:?} should fail");
            assert_eq!(engine.failing(&ratios, true), vec![criterion]);
        }

        assert!(!engine.is_valid(&all_stable(), false));
        assert_eq!(
            engine.failing(&all_stable(), false),
            vec![Criterion::LookingAtCamera]
        );
    }

    #[test]
    fn test_thresholds_just_above() {
        let engine = DecisionEngine::default();
        let ratios = StabilityRatios {
            face: 0.9,
            eye: 14.0 / 15.0,
            pose: 10.0 / 12.0,
            gaze: 15.0 / 20.0,
        };
        assert!(engine.is_valid(&ratios, true));
    }
}
