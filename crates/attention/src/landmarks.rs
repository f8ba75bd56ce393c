//! Facial landmark sets and the detector seam
//!
//! Index tables follow the 468-point face mesh topology, extended to 478 points
//! when iris refinement is enabled.

use nalgebra::Point2;

use crate::AttentionError;

/// Points in a face mesh without iris refinement
pub const FACE_MESH_POINTS: usize = 468;

/// Points in a face mesh with iris refinement
pub const FACE_MESH_POINTS_WITH_IRIS: usize = 478;

/// Left eye contour; first 6 feed the aspect ratio
pub const LEFT_EYE: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];

/// Right eye contour; first 6 feed the aspect ratio
pub const RIGHT_EYE: [usize; 16] = [
    362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
];

/// Left iris ring
pub const LEFT_IRIS: [usize; 5] = [468, 469, 470, 471, 472];

/// Right iris ring
pub const RIGHT_IRIS: [usize; 5] = [473, 474, 475, 476, 477];

/// Landmarks anchoring the head-pose solve
pub mod pose_anchor {
    pub const NOSE_TIP: usize = 1;
    pub const CHIN: usize = 18;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_MOUTH: usize = 61;
    pub const RIGHT_MOUTH: usize = 291;

    /// Anchors in canonical model order
    pub const ALL: [usize; 6] = [
        NOSE_TIP,
        CHIN,
        LEFT_EYE_OUTER,
        RIGHT_EYE_OUTER,
        LEFT_MOUTH,
        RIGHT_MOUTH,
    ];
}

/// Ordered set of normalized 2-D facial keypoints for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    points: Vec<Point2<f64>>,
}

impl Landmarks {
    /// Wrap an ordered point sequence
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    /// Build from `[x, y]` pairs
    pub fn from_xy<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        Self {
            points: points.into_iter().map(|[x, y]| Point2::new(x, y)).collect(),
        }
    }

    /// Number of keypoints
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether iris refinement points are present
    pub fn has_iris(&self) -> bool {
        self.points.len() >= FACE_MESH_POINTS_WITH_IRIS
    }

    /// Keypoint at `index`
    pub fn get(&self, index: usize) -> Option<Point2<f64>> {
        self.points.get(index).copied()
    }

    /// Keypoints at `indices`, `None` if any index is out of range
    pub fn select(&self, indices: &[usize]) -> Option<Vec<Point2<f64>>> {
        indices.iter().map(|&i| self.get(i)).collect()
    }

    /// Keypoint at `index` scaled to pixel coordinates
    pub fn to_pixels(&self, index: usize, width: f64, height: f64) -> Option<Point2<f64>> {
        self.get(index).map(|p| Point2::new(p.x * width, p.y * height))
    }

    /// Check the set is long enough for the fixed index tables and fully finite
    pub fn validate(&self) -> Result<(), AttentionError> {
        if self.points.len() < FACE_MESH_POINTS {
            return Err(AttentionError::MalformedLandmarks {
                required: FACE_MESH_POINTS,
                actual: self.points.len(),
            });
        }
        if let Some(index) = self
            .points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(AttentionError::InvalidLandmark { index });
        }
        Ok(())
    }
}

impl From<Vec<Point2<f64>>> for Landmarks {
    fn from(points: Vec<Point2<f64>>) -> Self {
        Self::new(points)
    }
}

/// External keypoint detector: one call per frame, `None` when no face is found
pub trait LandmarkDetector<I: ?Sized> {
    fn detect(&mut self, image: &I) -> Option<Landmarks>;
}

impl<I: ?Sized, F> LandmarkDetector<I> for F
where
    F: FnMut(&I) -> Option<Landmarks>,
{
    fn detect(&mut self, image: &I) -> Option<Landmarks> {
        self(image)
    }
}
