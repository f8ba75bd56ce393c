//! Synthetic face meshes for tests
//!
//! Pose anchors are the canonical model projected through the default camera;
//! eye contours and iris rings are laid out around the projected eye corners so
//! that aspect ratio and iris position come out as requested.

use nalgebra::{Point2, Point3, Rotation3, Vector3};

use crate::landmarks::{
    pose_anchor, Landmarks, FACE_MESH_POINTS, FACE_MESH_POINTS_WITH_IRIS, LEFT_EYE, LEFT_IRIS,
    RIGHT_EYE, RIGHT_IRIS,
};
use crate::pose::{CameraIntrinsics, FACE_MODEL};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;

/// Normalized eye width
const EYE_WIDTH: f64 = 0.04;

#[derive(Debug, Clone)]
pub(crate) struct FaceBuilder {
    pitch: f64,
    yaw: f64,
    roll: f64,
    ear: f64,
    iris_offset: (f64, f64),
    with_iris: bool,
    collapsed_anchors: bool,
}

impl FaceBuilder {
    /// Frontal face, open eyes, centered irises
    pub(crate) fn new() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            ear: 0.35,
            iris_offset: (0.0, 0.0),
            with_iris: true,
            collapsed_anchors: false,
        }
    }

    /// Head rotation in degrees
    pub(crate) fn pose(mut self, pitch: f64, yaw: f64, roll: f64) -> Self {
        self.pitch = pitch;
        self.yaw = yaw;
        self.roll = roll;
        self
    }

    /// Eye aspect ratio of both eyes
    pub(crate) fn ear(mut self, ear: f64) -> Self {
        self.ear = ear;
        self
    }

    /// Iris displacement from center, as a fraction of the eye box
    pub(crate) fn iris_offset(mut self, dx: f64, dy: f64) -> Self {
        self.iris_offset = (dx, dy);
        self
    }

    pub(crate) fn without_iris(mut self) -> Self {
        self.with_iris = false;
        self
    }

    /// Every pose anchor on the frame center, as a detector glitch would report
    pub(crate) fn collapse_anchors(mut self) -> Self {
        self.collapsed_anchors = true;
        self
    }

    fn anchors(&self) -> [Point2<f64>; 6] {
        let camera = CameraIntrinsics::from_frame(WIDTH, HEIGHT);
        let rotation = Rotation3::from_euler_angles(
            self.pitch.to_radians(),
            self.yaw.to_radians(),
            self.roll.to_radians(),
        );
        let translation = Vector3::new(0.0, 0.0, 500.0);
        FACE_MODEL.map(|[x, y, z]| {
            let pixel = camera
                .project(&(rotation * Point3::new(x, y, z) + translation))
                .expect("fixture face is in front of the camera");
            Point2::new(pixel.x / WIDTH, pixel.y / HEIGHT)
        })
    }

    /// Lay out one eye with its left corner at `corner`
    fn place_eye(
        &self,
        points: &mut [Point2<f64>],
        contour: &[usize; 16],
        iris: &[usize; 5],
        corner: Point2<f64>,
    ) {
        let w = EYE_WIDTH;
        let h = self.ear * w;
        let at = |dx: f64, dy: f64| Point2::new(corner.x + dx, corner.y + dy);

        for &i in contour {
            points[i] = at(0.5 * w, 0.0);
        }
        points[contour[0]] = corner;
        points[contour[1]] = at(0.3 * w, -h / 2.0);
        points[contour[2]] = at(0.7 * w, -h / 2.0);
        points[contour[3]] = at(w, 0.0);
        points[contour[4]] = at(0.7 * w, h / 2.0);
        points[contour[5]] = at(0.3 * w, h / 2.0);
        points[contour[8]] = at(w, 0.0);
        points[contour[12]] = at(0.5 * w, -h / 2.0);

        if self.with_iris {
            let (dx, dy) = self.iris_offset;
            let center = at((0.5 + dx) * w, dy * h);
            let r = 0.1 * w;
            let ring = [(0.0, 0.0), (r, 0.0), (0.0, r), (-r, 0.0), (0.0, -r)];
            for (&i, (ox, oy)) in iris.iter().zip(ring) {
                points[i] = Point2::new(center.x + ox, center.y + oy);
            }
        }
    }

    pub(crate) fn build(&self) -> Landmarks {
        let count = if self.with_iris {
            FACE_MESH_POINTS_WITH_IRIS
        } else {
            FACE_MESH_POINTS
        };
        let mut points = vec![Point2::new(0.5, 0.5); count];
        let anchors = self.anchors();

        let left_corner = anchors[2];
        let right_corner = anchors[3];
        self.place_eye(&mut points, &LEFT_EYE, &LEFT_IRIS, left_corner);
        self.place_eye(
            &mut points,
            &RIGHT_EYE,
            &RIGHT_IRIS,
            Point2::new(right_corner.x - EYE_WIDTH, right_corner.y),
        );

        // Anchors win where they share an index with an eye contour
        for (&index, anchor) in pose_anchor::ALL.iter().zip(anchors) {
            points[index] = if self.collapsed_anchors {
                Point2::new(0.5, 0.5)
            } else {
                anchor
            };
        }

        Landmarks::new(points)
    }
}
