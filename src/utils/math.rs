//! # Planar Math
//!
//! Helpers for movement on the x/z plane. The y axis is elevation and is
//! ignored by everything here.

use glam::Vec3;

/// Drops the elevation component of a vector.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Squared distance between two points on the x/z plane.
pub fn planar_distance_squared(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length_squared()
}

/// Distance between two points on the x/z plane.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar_distance_squared(a, b).sqrt()
}

/// Unit vector on the x/z plane pointing from `from` to `to`.
///
/// Returns zero when the two points coincide.
pub fn planar_direction(from: Vec3, to: Vec3) -> Vec3 {
    flatten(to - from).normalize_or_zero()
}

/// Rotates a direction about the y axis.
///
/// A positive angle turns the direction "right":
/// `(x cos a - z sin a, x sin a + z cos a)`.
///
/// # Examples
///
/// ```
/// use delve::rotate_about_y;
/// use glam::Vec3;
///
/// let turned = rotate_about_y(Vec3::X, std::f32::consts::FRAC_PI_2);
/// assert!((turned - Vec3::Z).length() < 1e-6);
/// ```
pub fn rotate_about_y(direction: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(
        direction.x * cos - direction.z * sin,
        0.0,
        direction.x * sin + direction.z * cos,
    )
    .normalize_or_zero()
}
