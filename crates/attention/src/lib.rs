//! Attention Estimation
//!
//! Frame-at-a-time estimation of whether a subject is attentively facing and
//! looking at the camera, from a facial landmark set:
//! - Eye openness (eye aspect ratio)
//! - Iris-based gaze centering
//! - Head pose from a six-point perspective solve
//! - Sliding stability windows and a conjunctive final verdict
//! - Session accuracy, FPS and attention-lapse alerting

pub mod analysis;
pub mod config;
pub mod decision;
pub mod eye;
pub mod gaze;
pub mod geometry;
pub mod landmarks;
pub mod pose;
pub mod session;
pub mod stability;

#[cfg(test)]
mod fixtures;

pub use alerting::{AlertConfig, AlertError, AttentionStatus};
pub use analysis::FrameReport;
pub use config::AttentionConfig;
pub use decision::{Criterion, DecisionEngine};
pub use eye::{EyeAnalyzer, EyeState, IrisPosition};
pub use gaze::{GazeClassifier, GazeEstimate};
pub use landmarks::{LandmarkDetector, Landmarks};
pub use pose::{HeadPose, PoseEstimator};
pub use session::{PerformanceRating, SessionStats, SessionSummary};
pub use stability::{FrameSignals, StabilityRatios, StabilityTracker};

use std::time::Instant;

use alerting::AlertManager;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Attention estimation error types
#[derive(Error, Debug)]
pub enum AttentionError {
    #[error("Landmark set too short: need {required} points, got {actual}")]
    MalformedLandmarks { required: usize, actual: usize },

    #[error("Landmark {index} has a non-finite coordinate")]
    InvalidLandmark { index: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Alert(#[from] AlertError),
}

/// Attention monitoring pipeline
pub struct AttentionMonitor {
    config: AttentionConfig,
    eye_analyzer: EyeAnalyzer,
    gaze_classifier: GazeClassifier,
    pose_estimator: PoseEstimator,
    decision: DecisionEngine,
    stability: StabilityTracker,
    session: SessionStats,
    alerts: AlertManager,
}

impl AttentionMonitor {
    /// Create a new attention monitor with configuration
    pub fn new(config: AttentionConfig) -> Result<Self, AttentionError> {
        Self::new_at(config, Instant::now())
    }

    /// Create a monitor whose session clock starts at `now`
    pub fn new_at(config: AttentionConfig, now: Instant) -> Result<Self, AttentionError> {
        config.validate()?;
        info!(
            "Creating attention monitor for {}x{} frames",
            config.frame.width, config.frame.height
        );
        Ok(Self {
            eye_analyzer: EyeAnalyzer::new(config.eye.ear_threshold),
            gaze_classifier: GazeClassifier::new(config.gaze.clone()),
            pose_estimator: PoseEstimator::new(&config.frame, config.pose.clone()),
            decision: DecisionEngine::new(config.decision.clone()),
            stability: StabilityTracker::new(&config.stability),
            session: SessionStats::new(now),
            alerts: AlertManager::new(config.alert.clone())?,
            config,
        })
    }

    /// Run the detector on one image and process its output
    pub fn step<I, D>(&mut self, detector: &mut D, image: &I) -> Result<FrameReport, AttentionError>
    where
        I: ?Sized,
        D: LandmarkDetector<I> + ?Sized,
    {
        self.step_at(detector, image, Instant::now())
    }

    /// Run the detector on an image captured at `now`
    pub fn step_at<I, D>(
        &mut self,
        detector: &mut D,
        image: &I,
        now: Instant,
    ) -> Result<FrameReport, AttentionError>
    where
        I: ?Sized,
        D: LandmarkDetector<I> + ?Sized,
    {
        let landmarks = detector.detect(image);
        self.process_at(landmarks.as_ref(), now)
    }

    /// Process one frame's landmarks; `None` means no face was found
    pub fn process(&mut self, landmarks: Option<&Landmarks>) -> Result<FrameReport, AttentionError> {
        self.process_at(landmarks, Instant::now())
    }

    /// Process one frame observed at `now`
    pub fn process_at(
        &mut self,
        landmarks: Option<&Landmarks>,
        now: Instant,
    ) -> Result<FrameReport, AttentionError> {
        let mut report = FrameReport::default();
        let mut gaze_sample = false;

        if let Some(landmarks) = landmarks {
            landmarks.validate()?;
            report.face_detected = true;

            if let Some(eyes) = self.eye_analyzer.analyze(landmarks) {
                report.eyes_detected = true;
                report.ear = Some(eyes.average_ear());

                // Gaze is only meaningful with open eyes
                if self.eye_analyzer.eyes_open(&eyes) {
                    let gaze = self
                        .gaze_classifier
                        .classify(&eyes.left_iris, &eyes.right_iris);
                    report.looking_at_camera = gaze.looking_at_camera;
                    report.gaze_score = Some(gaze.score);
                    gaze_sample = gaze.stable_sample;
                }
            }

            if let Some(pose) = self.pose_estimator.estimate(landmarks) {
                report.head_pose_valid = self.pose_estimator.is_facing(&pose);
                report.pitch = Some(pose.pitch);
                report.yaw = Some(pose.yaw);
                report.roll = Some(pose.roll);
            }
        }

        report.stability = self.stability.record(FrameSignals {
            face_detected: report.face_detected,
            eyes_detected: report.eyes_detected,
            head_pose_valid: report.head_pose_valid,
            gaze_sample,
        });
        report.final_valid = self
            .decision
            .is_valid(&report.stability, report.looking_at_camera);

        self.session.record_frame(report.final_valid);
        if !report.final_valid {
            debug!(
                "Frame {} rejected: {:?}",
                self.session.total_frames(),
                self.decision
                    .failing(&report.stability, report.looking_at_camera)
            );
        }
        if report.looking_at_camera {
            self.session.mark_looking(now);
        }

        report.time_since_valid = self.session.time_since_valid(now);
        report.accuracy_pct = self.session.accuracy_pct();
        report.fps = self.session.fps(now);
        report.status = self
            .alerts
            .evaluate(report.looking_at_camera, report.time_since_valid);

        trace!(
            "Frame {}: valid={} looking={} stability={:?}",
            self.session.total_frames(),
            report.final_valid,
            report.looking_at_camera,
            report.stability
        );

        Ok(report)
    }

    /// Zero the session counters; stability windows are kept
    pub fn reset_statistics(&mut self) {
        self.reset_statistics_at(Instant::now());
    }

    pub fn reset_statistics_at(&mut self, now: Instant) {
        info!(
            "Resetting statistics after {} frames ({:.1}% valid)",
            self.session.total_frames(),
            self.session.accuracy_pct()
        );
        self.session.reset(now);
        self.alerts.reset();
    }

    /// Change the attention alert threshold in seconds
    pub fn set_alert_threshold(&mut self, seconds: f64) -> Result<(), AttentionError> {
        self.alerts.set_threshold(seconds)?;
        self.config.alert.threshold_seconds = seconds;
        info!("Alert threshold set to {:.1}s", seconds);
        Ok(())
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn stability(&self) -> &StabilityTracker {
        &self.stability
    }

    pub fn session(&self) -> &SessionStats {
        &self.session
    }

    /// Lapse episodes since the last reset
    pub fn alert_episodes(&self) -> u64 {
        self.alerts.episodes()
    }

    /// Session report as of `now`
    pub fn summary_at(&self, now: Instant) -> SessionSummary {
        self.session.summary(now, self.alerts.episodes())
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FaceBuilder;
    use std::time::Duration;

    fn monitor(start: Instant) -> AttentionMonitor {
        AttentionMonitor::new_at(AttentionConfig::default(), start).unwrap()
    }

    fn at(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_attentive_face_is_valid() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().build();

        for i in 0..30 {
            let report = monitor.process_at(Some(&face), at(start, i * 33)).unwrap();
            assert!(report.face_detected);
            assert!(report.eyes_detected);
            assert!(report.head_pose_valid);
            assert!(report.looking_at_camera);
            assert!(report.final_valid);
            assert_eq!(report.status, AttentionStatus::LookingAtCamera);
            assert_eq!(report.time_since_valid, 0.0);
        }

        assert_eq!(monitor.session().valid_frames(), 30);
        assert_eq!(monitor.session().accuracy_pct(), 100.0);
        assert_eq!(
            monitor.stability().ratios(),
            StabilityRatios { face: 1.0, eye: 1.0, pose: 1.0, gaze: 1.0 }
        );
    }

    #[test]
    fn test_no_face() {
        let start = Instant::now();
        let mut monitor = monitor(start);

        let report = monitor.process_at(None, at(start, 100)).unwrap();
        assert!(!report.face_detected);
        assert!(!report.eyes_detected);
        assert!(!report.head_pose_valid);
        assert!(!report.looking_at_camera);
        assert_eq!(report.pitch, None);
        assert!(!report.final_valid);
        // Windows still receive a sample
        assert_eq!(monitor.stability().lengths(), (1, 1, 1, 1));
        assert_eq!(monitor.session().total_frames(), 1);
    }

    #[test]
    fn test_closed_eyes_skip_gaze() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().ear(0.1).build();

        let report = monitor.process_at(Some(&face), at(start, 0)).unwrap();
        assert!(report.eyes_detected);
        assert!(!report.looking_at_camera);
        assert_eq!(report.gaze_score, None);
        assert_eq!(report.stability.gaze, 0.0);
        assert!(report.head_pose_valid);
        assert!(!report.final_valid);
    }

    #[test]
    fn test_looking_away() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().iris_offset(0.25, 0.0).build();

        let report = monitor.process_at(Some(&face), at(start, 0)).unwrap();
        assert!(!report.looking_at_camera);
        let score = report.gaze_score.unwrap();
        assert!((score - 0.75).abs() < 1e-9);
        assert_eq!(report.stability.gaze, 0.0);
        assert!(!report.final_valid);
    }

    #[test]
    fn test_turned_head_fails_pose_only() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().pose(0.0, 30.0, 0.0).build();

        let report = monitor.process_at(Some(&face), at(start, 0)).unwrap();
        assert!(report.looking_at_camera);
        assert!(!report.head_pose_valid);
        assert!(report.yaw.is_some());
        assert_eq!(report.stability.pose, 0.0);
        assert!(!report.final_valid);
    }

    #[test]
    fn test_failed_pose_solve_keeps_face_and_eyes() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().collapse_anchors().build();

        let report = monitor.process_at(Some(&face), at(start, 0)).unwrap();
        assert!(report.face_detected);
        assert!(report.eyes_detected);
        assert!(!report.head_pose_valid);
        assert_eq!(report.head_pose(), None);
        assert_eq!((report.pitch, report.yaw, report.roll), (None, None, None));
        assert_eq!(report.stability.face, 1.0);
        assert_eq!(report.stability.pose, 0.0);
        assert!(!report.final_valid);
    }

    #[test]
    fn test_face_without_iris_counts_as_centered() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().without_iris().build();

        let report = monitor.process_at(Some(&face), at(start, 0)).unwrap();
        assert!(report.looking_at_camera);
        assert_eq!(report.gaze_score, Some(1.0));
    }

    #[test]
    fn test_malformed_landmarks() {
        let mut monitor = monitor(Instant::now());
        let short = Landmarks::from_xy(vec![[0.5, 0.5]; 100]);

        assert!(matches!(
            monitor.process(Some(&short)),
            Err(AttentionError::MalformedLandmarks { required: 468, actual: 100 })
        ));
        assert_eq!(monitor.session().total_frames(), 0);
    }

    #[test]
    fn test_stability_gates_recovery() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().build();

        for i in 0..10 {
            monitor.process_at(None, at(start, i * 33)).unwrap();
        }
        // Gaze window is the slowest: 15 of 20 is the first ratio above 0.70
        let verdicts: Vec<bool> = (10..30)
            .map(|i| {
                monitor
                    .process_at(Some(&face), at(start, i * 33))
                    .unwrap()
                    .final_valid
            })
            .collect();
        assert!(!verdicts[0]);
        assert!(!verdicts[13]);
        assert!(verdicts[14]);
        assert!(verdicts[19]);
    }

    #[test]
    fn test_alert_after_threshold() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let attentive = FaceBuilder::new().build();
        let away = FaceBuilder::new().iris_offset(0.25, 0.0).build();

        let report = monitor.process_at(Some(&attentive), at(start, 1000)).unwrap();
        assert_eq!(report.status, AttentionStatus::LookingAtCamera);

        let report = monitor.process_at(Some(&away), at(start, 3500)).unwrap();
        assert!((report.time_since_valid - 2.5).abs() < 1e-9);
        assert_eq!(report.status, AttentionStatus::Adjusting);

        let report = monitor.process_at(Some(&away), at(start, 4500)).unwrap();
        assert_eq!(report.status, AttentionStatus::AttentionRequired);
        assert!(report.needs_attention());
        assert_eq!(monitor.alert_episodes(), 1);

        monitor.process_at(None, at(start, 5000)).unwrap();
        assert_eq!(monitor.alert_episodes(), 1);
    }

    #[test]
    fn test_set_alert_threshold() {
        let start = Instant::now();
        let mut monitor = monitor(start);

        monitor.set_alert_threshold(1.0).unwrap();
        assert_eq!(monitor.config().alert.threshold_seconds, 1.0);
        let report = monitor.process_at(None, at(start, 1500)).unwrap();
        assert_eq!(report.status, AttentionStatus::AttentionRequired);

        assert!(matches!(
            monitor.set_alert_threshold(-1.0),
            Err(AttentionError::Alert(_))
        ));
        assert_eq!(monitor.config().alert.threshold_seconds, 1.0);
    }

    #[test]
    fn test_reset_keeps_windows() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().build();

        for i in 0..100 {
            let landmarks = (i % 5 != 0).then_some(&face);
            monitor.process_at(landmarks, at(start, i * 33)).unwrap();
        }
        let before = monitor.stability().ratios();
        assert_eq!(monitor.session().total_frames(), 100);

        let now = at(start, 4000);
        monitor.reset_statistics_at(now);
        assert_eq!(monitor.session().total_frames(), 0);
        assert_eq!(monitor.session().valid_frames(), 0);
        assert_eq!(monitor.session().accuracy_pct(), 0.0);
        assert_eq!(monitor.session().time_since_valid(now), 0.0);
        assert_eq!(monitor.stability().ratios(), before);
        assert_eq!(monitor.stability().lengths(), (10, 15, 12, 20));
    }

    #[test]
    fn test_step_with_closure_detector() {
        let mut monitor = monitor(Instant::now());
        let face = FaceBuilder::new().build();
        let mut detector = |frame: &u32| (*frame % 2 == 0).then(|| face.clone());

        assert!(monitor.step(&mut detector, &0u32).unwrap().face_detected);
        assert!(!monitor.step(&mut detector, &1u32).unwrap().face_detected);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AttentionConfig::default();
        config.stability.gaze_window = 0;
        assert!(matches!(
            AttentionMonitor::new(config),
            Err(AttentionError::Config(_))
        ));
    }

    #[test]
    fn test_summary() {
        let start = Instant::now();
        let mut monitor = monitor(start);
        let face = FaceBuilder::new().build();
        for i in 0..20 {
            monitor.process_at(Some(&face), at(start, i * 100)).unwrap();
        }
        let summary = monitor.summary_at(at(start, 2000));
        assert_eq!(summary.total_frames, 20);
        assert_eq!(summary.rating, PerformanceRating::Excellent);
        assert_eq!(summary.average_fps, 10.0);
    }
}
