//! Eye-state analysis: openness and iris position

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::{distance, mean, ratio_or};
use crate::landmarks::{Landmarks, LEFT_EYE, LEFT_IRIS, RIGHT_EYE, RIGHT_IRIS};

/// Points used for the eye aspect ratio
const EAR_POINTS: usize = 6;

/// Iris position when it cannot be measured
pub const CENTERED: IrisPosition = IrisPosition { x: 0.5, y: 0.5 };

/// Iris centroid normalized against the eye box; 0.5 is centered
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrisPosition {
    pub x: f64,
    pub y: f64,
}

impl IrisPosition {
    /// Both ratios strictly inside `(min, max)`
    pub fn is_within(&self, min: f64, max: f64) -> bool {
        min < self.x && self.x < max && min < self.y && self.y < max
    }
}

impl Default for IrisPosition {
    fn default() -> Self {
        CENTERED
    }
}

/// Eye aspect ratio of six ordered points
///
/// `p0`/`p3` are the horizontal corners, `p1`/`p2` the upper lid and
/// `p5`/`p4` the matching lower lid. Returns 0 with fewer than six points or
/// coincident corners.
pub fn eye_aspect_ratio(points: &[Point2<f64>]) -> f64 {
    if points.len() < EAR_POINTS {
        return 0.0;
    }

    let vertical_1 = distance(&points[1], &points[5]);
    let vertical_2 = distance(&points[2], &points[4]);
    let horizontal = distance(&points[0], &points[3]);

    if horizontal == 0.0 {
        return 0.0;
    }

    (vertical_1 + vertical_2) / (2.0 * horizontal)
}

/// Iris centroid relative to the eye box
///
/// The box spans `eye_indices[0]` to `eye_indices[8]` horizontally and
/// `eye_indices[12]` to `eye_indices[4]` vertically, falling back to the last,
/// second and third indices on shorter contours.
pub fn iris_position(
    landmarks: &Landmarks,
    iris_indices: &[usize],
    eye_indices: &[usize],
) -> IrisPosition {
    if iris_indices.is_empty() || eye_indices.len() < 3 {
        return CENTERED;
    }

    let Some(iris) = landmarks.select(iris_indices).and_then(|p| mean(&p)) else {
        return CENTERED;
    };

    let right_slot = if eye_indices.len() > 8 { 8 } else { eye_indices.len() - 1 };
    let top_slot = if eye_indices.len() > 4 { 4 } else { 1 };
    let bottom_slot = if eye_indices.len() > 12 { 12 } else { 2 };

    let corners = landmarks.select(&[
        eye_indices[0],
        eye_indices[right_slot],
        eye_indices[top_slot],
        eye_indices[bottom_slot],
    ]);
    let Some([left, right, top, bottom]) = corners.and_then(|c| <[Point2<f64>; 4]>::try_from(c).ok())
    else {
        return CENTERED;
    };

    let eye_width = (right.x - left.x).abs();
    let eye_height = (top.y - bottom.y).abs();

    IrisPosition {
        x: ratio_or(iris.x - left.x, eye_width, 0.5),
        y: ratio_or(iris.y - bottom.y, eye_height, 0.5),
    }
}

/// Per-frame eye measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeState {
    /// Left eye aspect ratio
    pub left_ear: f64,
    /// Right eye aspect ratio
    pub right_ear: f64,
    /// Left iris position
    pub left_iris: IrisPosition,
    /// Right iris position
    pub right_iris: IrisPosition,
}

impl EyeState {
    /// Mean of both aspect ratios
    pub fn average_ear(&self) -> f64 {
        (self.left_ear + self.right_ear) / 2.0
    }
}

/// Computes eye openness and iris position from a landmark set
#[derive(Debug, Clone)]
pub struct EyeAnalyzer {
    ear_threshold: f64,
}

impl EyeAnalyzer {
    pub fn new(ear_threshold: f64) -> Self {
        Self { ear_threshold }
    }

    /// Measure both eyes; `None` when either eye region is unavailable
    pub fn analyze(&self, landmarks: &Landmarks) -> Option<EyeState> {
        let left = landmarks.select(&LEFT_EYE[..EAR_POINTS])?;
        let right = landmarks.select(&RIGHT_EYE[..EAR_POINTS])?;

        // Iris ring is only present with refined landmarks
        let (left_iris, right_iris) = if landmarks.has_iris() {
            (
                iris_position(landmarks, &LEFT_IRIS, &LEFT_EYE),
                iris_position(landmarks, &RIGHT_IRIS, &RIGHT_EYE),
            )
        } else {
            (CENTERED, CENTERED)
        };

        Some(EyeState {
            left_ear: eye_aspect_ratio(&left),
            right_ear: eye_aspect_ratio(&right),
            left_iris,
            right_iris,
        })
    }

    /// Eyes count as open when the mean aspect ratio exceeds the threshold
    pub fn eyes_open(&self, state: &EyeState) -> bool {
        state.average_ear() > self.ear_threshold
    }
}
