//! Head pose estimation from facial landmarks
//!
//! Six anchor landmarks are matched against a canonical 3-D face model and the
//! camera pose is recovered with a perspective-n-point solve: a direct linear
//! transform gives the initial estimate, which Levenberg-Marquardt then refines
//! by minimizing reprojection error in pixels.

use nalgebra::{
    DMatrix, DVector, Matrix3, Matrix3x4, Matrix4, Point2, Point3, Rotation3, SymmetricEigen,
    Vector3, Vector6,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FrameConfig, PoseConfig};
use crate::landmarks::{pose_anchor, Landmarks};

/// Canonical face model in millimetres, nose tip at the origin.
/// Order matches [`pose_anchor::ALL`].
pub const FACE_MODEL: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],         // Nose tip
    [0.0, -63.6, -12.5],     // Chin
    [-43.3, 32.7, -26.0],    // Left eye outer corner
    [43.3, 32.7, -26.0],     // Right eye outer corner
    [-28.9, -28.9, -24.1],   // Left mouth corner
    [28.9, -28.9, -24.1],    // Right mouth corner
];

/// Below this the rotation is treated as gimbal-locked
const SINGULARITY_EPS: f64 = 1e-6;

/// Minimum correspondences for the linear initialisation
const MIN_CORRESPONDENCES: usize = 6;

const MAX_ITERATIONS: usize = 50;

/// Head pose (Euler angles, degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Rotation about the lateral (x) axis
    pub pitch: f64,
    /// Rotation about the vertical (y) axis
    pub yaw: f64,
    /// Rotation about the longitudinal (z) axis
    pub roll: f64,
}

/// Pinhole camera without lens distortion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub focal_length: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Focal length equal to the frame width, principal point at the center
    pub fn from_frame(width: f64, height: f64) -> Self {
        Self {
            focal_length: width,
            cx: width / 2.0,
            cy: height / 2.0,
        }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focal_length, 0.0, self.cx,
            0.0, self.focal_length, self.cy,
            0.0, 0.0, 1.0,
        )
    }

    /// Project a camera-space point to pixels; `None` behind the camera
    pub fn project(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        if point.z <= f64::EPSILON {
            return None;
        }
        Some(Point2::new(
            self.focal_length * point.x / point.z + self.cx,
            self.focal_length * point.y / point.z + self.cy,
        ))
    }

    /// Pixel to normalized image coordinates
    fn normalize(&self, pixel: &Point2<f64>) -> (f64, f64) {
        (
            (pixel.x - self.cx) / self.focal_length,
            (pixel.y - self.cy) / self.focal_length,
        )
    }
}

/// Model-to-camera transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnpSolution {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    /// Root-mean-square reprojection error in pixels
    pub reprojection_error: f64,
}

/// Solve for the pose mapping `object` points onto `image` pixels
///
/// Returns `None` when the correspondences are too few, degenerate, or place
/// the model behind the camera.
pub fn solve_pnp(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
) -> Option<PnpSolution> {
    if object.len() != image.len() || object.len() < MIN_CORRESPONDENCES {
        return None;
    }

    let (rotation, translation) = linear_pose(object, image, camera)?;
    refine_pose(object, image, camera, rotation, translation)
}

/// Direct linear transform on conditioned object points
fn linear_pose(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
) -> Option<(Rotation3<f64>, Vector3<f64>)> {
    let n = object.len();
    let centroid = object
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n as f64;
    let mean_distance = object
        .iter()
        .map(|p| (p.coords - centroid).norm())
        .sum::<f64>()
        / n as f64;
    if mean_distance <= f64::EPSILON {
        return None;
    }
    let scale = 3f64.sqrt() / mean_distance;

    let mut a = DMatrix::<f64>::zeros(2 * n, 12);
    for (i, (point, pixel)) in object.iter().zip(image).enumerate() {
        let x = (point.coords - centroid) * scale;
        let (u, v) = camera.normalize(pixel);
        let row = 2 * i;
        for k in 0..3 {
            a[(row, k)] = x[k];
            a[(row, 8 + k)] = -u * x[k];
            a[(row + 1, 4 + k)] = x[k];
            a[(row + 1, 8 + k)] = -v * x[k];
        }
        a[(row, 3)] = 1.0;
        a[(row, 11)] = -u;
        a[(row + 1, 7)] = 1.0;
        a[(row + 1, 11)] = -v;
    }

    // Null vector of A is the eigenvector of AᵀA with the smallest eigenvalue
    let eigen = SymmetricEigen::new(a.transpose() * &a);
    let (min_index, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))?;
    let p = eigen.eigenvectors.column(min_index);
    let conditioned = Matrix3x4::from_fn(|r, c| p[r * 4 + c]);

    // Undo conditioning: P = P' · T
    let mut conditioning = Matrix4::identity() * scale;
    conditioning[(3, 3)] = 1.0;
    let shift = -centroid * scale;
    conditioning[(0, 3)] = shift.x;
    conditioning[(1, 3)] = shift.y;
    conditioning[(2, 3)] = shift.z;
    let mut projection = conditioned * conditioning;

    let mut m = projection.fixed_view::<3, 3>(0, 0).into_owned();
    let mut det = m.determinant();
    if !det.is_finite() || det.abs() <= 1e-9 * m.norm().powi(3) {
        return None;
    }
    if det < 0.0 {
        projection = -projection;
        m = -m;
        det = -det;
    }

    let lambda = det.cbrt();
    let translation = projection.column(3).into_owned() / lambda;
    if translation.z <= 0.0 {
        return None;
    }

    // Nearest proper rotation to M / λ
    let svd = (m / lambda).svd(true, true);
    let (mut u, v_t) = (svd.u?, svd.v_t?);
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        u.column_mut(2).neg_mut();
        r = u * v_t;
    }

    Some((Rotation3::from_matrix_unchecked(r), translation))
}

fn params_to_pose(params: &Vector6<f64>) -> (Rotation3<f64>, Vector3<f64>) {
    (
        Rotation3::new(Vector3::new(params[0], params[1], params[2])),
        Vector3::new(params[3], params[4], params[5]),
    )
}

fn residuals(
    params: &Vector6<f64>,
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
) -> Option<DVector<f64>> {
    let (rotation, translation) = params_to_pose(params);
    let mut r = DVector::zeros(2 * object.len());
    for (i, (point, pixel)) in object.iter().zip(image).enumerate() {
        let projected = camera.project(&(rotation * point + translation))?;
        r[2 * i] = projected.x - pixel.x;
        r[2 * i + 1] = projected.y - pixel.y;
    }
    Some(r)
}

/// Central-difference Jacobian of the residuals
fn jacobian(
    params: &Vector6<f64>,
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
) -> Option<DMatrix<f64>> {
    let mut jac = DMatrix::zeros(2 * object.len(), 6);
    for k in 0..6 {
        let h = 1e-6 * params[k].abs().max(1.0);
        let mut plus = *params;
        plus[k] += h;
        let mut minus = *params;
        minus[k] -= h;
        let diff = (residuals(&plus, object, image, camera)?
            - residuals(&minus, object, image, camera)?)
            / (2.0 * h);
        jac.set_column(k, &diff);
    }
    Some(jac)
}

/// Levenberg-Marquardt refinement of reprojection error
fn refine_pose(
    object: &[Point3<f64>],
    image: &[Point2<f64>],
    camera: &CameraIntrinsics,
    rotation: Rotation3<f64>,
    translation: Vector3<f64>,
) -> Option<PnpSolution> {
    let rvec = rotation.scaled_axis();
    let mut params = Vector6::new(
        rvec.x,
        rvec.y,
        rvec.z,
        translation.x,
        translation.y,
        translation.z,
    );
    let mut res = residuals(&params, object, image, camera)?;
    let mut cost = res.norm_squared();
    let mut damping = 1e-3;

    'outer: for _ in 0..MAX_ITERATIONS {
        if cost <= f64::EPSILON * f64::EPSILON {
            break;
        }
        let jac = jacobian(&params, object, image, camera)?;
        let jtj = jac.transpose() * &jac;
        let neg_gradient = -(jac.transpose() * &res);

        loop {
            if damping > 1e12 {
                break 'outer;
            }
            let mut lhs = jtj.clone();
            for k in 0..6 {
                lhs[(k, k)] += damping * jtj[(k, k)].max(1e-12);
            }
            let Some(step) = lhs.cholesky().map(|c| c.solve(&neg_gradient)) else {
                damping *= 10.0;
                continue;
            };
            let candidate = params + Vector6::from_iterator(step.iter().copied());
            match residuals(&candidate, object, image, camera) {
                Some(r) if r.norm_squared() < cost => {
                    params = candidate;
                    cost = r.norm_squared();
                    res = r;
                    damping = (damping * 0.1).max(1e-15);
                    if step.norm() <= 1e-12 * (1.0 + params.norm()) {
                        break 'outer;
                    }
                    break;
                }
                _ => damping *= 10.0,
            }
        }
    }

    if params.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let (rotation, translation) = params_to_pose(&params);
    Some(PnpSolution {
        rotation,
        translation,
        reprojection_error: (cost / object.len() as f64).sqrt(),
    })
}

/// XYZ Euler angles (degrees) of a rotation matrix
///
/// Returns `(x, y, z)`; in the gimbal-locked case `z` is pinned to zero.
pub fn rotation_to_euler(r: &Matrix3<f64>) -> (f64, f64, f64) {
    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();

    let (x, y, z) = if sy >= SINGULARITY_EPS {
        (
            r[(2, 1)].atan2(r[(2, 2)]),
            (-r[(2, 0)]).atan2(sy),
            r[(1, 0)].atan2(r[(0, 0)]),
        )
    } else {
        (
            (-r[(1, 2)]).atan2(r[(1, 1)]),
            (-r[(2, 0)]).atan2(sy),
            0.0,
        )
    };

    (x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Estimates head pose from the six anchor landmarks
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    camera: CameraIntrinsics,
    model: [Point3<f64>; 6],
    frame_width: f64,
    frame_height: f64,
    limits: PoseConfig,
}

impl PoseEstimator {
    pub fn new(frame: &FrameConfig, limits: PoseConfig) -> Self {
        let width = f64::from(frame.width);
        let height = f64::from(frame.height);
        Self {
            camera: CameraIntrinsics::from_frame(width, height),
            model: FACE_MODEL.map(|[x, y, z]| Point3::new(x, y, z)),
            frame_width: width,
            frame_height: height,
            limits,
        }
    }

    /// Solve the anchor correspondences; `None` when the solve fails
    pub fn solve(&self, landmarks: &Landmarks) -> Option<PnpSolution> {
        let image: Option<Vec<Point2<f64>>> = pose_anchor::ALL
            .iter()
            .map(|&i| landmarks.to_pixels(i, self.frame_width, self.frame_height))
            .collect();
        let solution = solve_pnp(&self.model, &image?, &self.camera);
        if solution.is_none() {
            debug!("Head pose solve failed");
        }
        solution
    }

    /// Euler angles of the solved pose
    pub fn estimate(&self, landmarks: &Landmarks) -> Option<HeadPose> {
        let solution = self.solve(landmarks)?;
        let (pitch, yaw, roll) = rotation_to_euler(solution.rotation.matrix());
        Some(HeadPose { pitch, yaw, roll })
    }

    /// Head is facing the camera when pitch and yaw are inside the limits
    pub fn is_facing(&self, pose: &HeadPose) -> bool {
        pose.pitch.abs() < self.limits.max_pitch_deg && pose.yaw.abs() < self.limits.max_yaw_deg
    }
}
