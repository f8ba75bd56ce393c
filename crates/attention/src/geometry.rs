//! Planar geometry helpers shared by the analyzers

use nalgebra::Point2;

/// Euclidean distance between two points
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Centroid of a point set, `None` when empty
pub fn mean(points: &[Point2<f64>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2::new(sx / n, sy / n))
}

/// `numerator / denominator`, or `fallback` when the denominator is not positive
pub fn ratio_or(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        fallback
    }
}
