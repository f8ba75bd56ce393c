//! Terminal status line and session summary

use attention::{FrameReport, PerformanceRating, SessionSummary};
use tracing::info;

fn mark(flag: bool) -> char {
    if flag {
        '✓'
    } else {
        '✗'
    }
}

/// One-line status for the terminal
pub fn status_line(report: &FrameReport, frames: u64) -> String {
    format!(
        "[{}] Face:{} Eyes:{} Pose:{} Gaze:{} | Stability: F:{:.2} E:{:.2} G:{:.2} | Acc:{:.1}% FPS:{:.1} Frames:{} Alert:{:.1}s",
        if report.final_valid { "✓ VALID  " } else { "✗ INVALID" },
        mark(report.face_detected),
        mark(report.eyes_detected),
        mark(report.head_pose_valid),
        mark(report.looking_at_camera),
        report.stability.face,
        report.stability.eye,
        report.stability.gaze,
        report.accuracy_pct,
        report.fps,
        frames,
        report.time_since_valid,
    )
}

pub fn rating_label(rating: PerformanceRating) -> &'static str {
    match rating {
        PerformanceRating::Excellent => "EXCELLENT",
        PerformanceRating::Good => "GOOD",
        PerformanceRating::Fair => "FAIR",
        PerformanceRating::NeedsImprovement => "NEEDS IMPROVEMENT",
    }
}

/// Log the end-of-session report
pub fn log_summary(summary: &SessionSummary) {
    info!("=== Session Summary ===");
    info!("Total frames processed: {}", summary.total_frames);
    info!("Valid detections: {}", summary.valid_frames);
    info!("Overall accuracy: {:.2}%", summary.accuracy_pct);
    info!("Session duration: {:.1}s", summary.duration_secs);
    info!("Average FPS: {:.1}", summary.average_fps);
    info!("Attention alerts: {}", summary.alert_episodes);
    info!("Performance rating: {}", rating_label(summary.rating));
}
