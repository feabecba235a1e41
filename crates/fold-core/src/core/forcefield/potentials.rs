use nalgebra::{Point3, Vector3};

pub const COMPACTNESS_ALPHA: f64 = 0.3;
pub const COMPACTNESS_TARGET_SCALE: f64 = 2.2;

/// Wraps an angle in degrees into `[-180, 180)`.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

#[inline]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    wrap_angle(a - b).abs()
}

/// Squared steric overlap of two spheres; zero once they no longer overlap.
#[inline]
pub fn clash_overlap(dist: f64, radius_a: f64, radius_b: f64, softness: f64) -> f64 {
    let overlap = radius_a + radius_b + softness - dist;
    if overlap > 0.0 { overlap * overlap } else { 0.0 }
}

/// Root-mean-square distance of the points from their centroid.
pub fn radius_of_gyration(points: &[Point3<f64>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let centre = points
        .iter()
        .fold(Vector3::<f64>::zeros(), |acc, p| acc + p.coords)
        / n;
    let moment: f64 = points
        .iter()
        .map(|p| (p.coords - centre).norm_squared())
        .sum();
    (moment / n).sqrt()
}

#[inline]
pub fn target_radius_of_gyration(count: usize) -> f64 {
    COMPACTNESS_TARGET_SCALE * (count as f64).cbrt()
}

/// `alpha * (Rg - 2.2 N^(1/3))^2`; zero for fewer than two points.
pub fn compactness_penalty(points: &[Point3<f64>], alpha: f64) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let delta = radius_of_gyration(points) - target_radius_of_gyration(points.len());
    alpha * delta * delta
}
