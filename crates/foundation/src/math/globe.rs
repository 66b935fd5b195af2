//! Sphere-globe projection.
//!
//! The host scene rotates the globe by -90° about the vertical axis, so after the usual
//! spherical-to-Cartesian conversion every point is remapped `(x, y, z) -> (z, y, -x)`.
//! `vec3_to_geo` undoes exactly that remap; keep the two in lockstep.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

pub fn geo_to_vec3(geo: GeoPoint, radius: f64) -> Vec3 {
    let phi = (90.0 - geo.lat).to_radians();
    let theta = (180.0 - geo.lng).to_radians();

    let x = radius * phi.sin() * theta.sin();
    let y = radius * phi.cos();
    let z = radius * phi.sin() * theta.cos();

    Vec3::new(z, y, -x)
}

/// Inverse of [`geo_to_vec3`]. Returns the coordinate and the distance from the origin.
pub fn vec3_to_geo(p: Vec3) -> (GeoPoint, f64) {
    let radius = p.length();
    if radius <= 0.0 {
        return (GeoPoint::default(), 0.0);
    }

    // Undo the scene remap before inverting the spherical conversion.
    let (x, y, z) = (-p.z, p.y, p.x);
    let phi = (y / radius).clamp(-1.0, 1.0).acos();
    let theta = x.atan2(z);

    let lat = 90.0 - phi.to_degrees();
    let lng = wrap_longitude(180.0 - theta.to_degrees());
    (GeoPoint::new(lat, lng), radius)
}

/// Wraps a longitude into `(-180, 180]`.
pub fn wrap_longitude(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

/// Angle in radians between two directions from the globe center.
pub fn great_circle_angle(a: Vec3, b: Vec3) -> f64 {
    a.cross(b).length().atan2(a.dot(b))
}

/// Rotates `v` about the unit `axis` by `angle` radians (Rodrigues).
pub fn rotate_about_axis(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos))
}

/// Direction at fraction `t` along the great circle from unit `a` to unit `b`.
///
/// Antipodal or coincident endpoints pick a rotation axis perpendicular to `a`
/// (world Y first, then world X) so the result is always defined.
pub fn great_circle_direction(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    let angle = great_circle_angle(a, b);
    let axis = a
        .cross(b)
        .try_normalize(1e-9)
        .or_else(|| a.cross(Vec3::Y).try_normalize(1e-9))
        .unwrap_or_else(|| a.cross(Vec3::X).normalize_or(Vec3::Z));
    rotate_about_axis(a, axis, angle * t).normalize_or(a)
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, geo_to_vec3, great_circle_angle, great_circle_direction, vec3_to_geo};
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn north_pole_is_up() {
        let p = geo_to_vec3(GeoPoint::new(90.0, 0.0), 10.0);
        assert_close(p.x, 0.0, 1e-9);
        assert_close(p.y, 10.0, 1e-9);
        assert_close(p.z, 0.0, 1e-9);
    }

    #[test]
    fn equator_applies_axis_remap() {
        // lng 90: theta = 90°, so pre-remap (x, y, z) = (r, 0, 0) -> (0, 0, -r).
        let p = geo_to_vec3(GeoPoint::new(0.0, 90.0), 2.0);
        assert_close(p.x, 0.0, 1e-9);
        assert_close(p.y, 0.0, 1e-9);
        assert_close(p.z, -2.0, 1e-9);

        // lng 0: theta = 180°, so pre-remap (0, 0, -r) -> (-r, 0, 0).
        let p = geo_to_vec3(GeoPoint::new(0.0, 0.0), 2.0);
        assert_close(p.x, -2.0, 1e-9);
        assert_close(p.z, 0.0, 1e-9);
    }

    #[test]
    fn geo_round_trip() {
        for &(lat, lng) in &[(37.6, -122.4), (40.6, -73.8), (-33.9, 151.2), (0.0, 179.5)] {
            let p = geo_to_vec3(GeoPoint::new(lat, lng), 3000.0);
            let (geo, r) = vec3_to_geo(p);
            assert_close(geo.lat, lat, 1e-9);
            assert_close(geo.lng, lng, 1e-9);
            assert_close(r, 3000.0, 1e-9);
        }
    }

    #[test]
    fn great_circle_midpoint_is_unit_and_equidistant() {
        let a = Vec3::X;
        let b = Vec3::Z;
        let mid = great_circle_direction(a, b, 0.5);
        assert_close(mid.length(), 1.0, 1e-12);
        assert_close(
            great_circle_angle(a, mid),
            great_circle_angle(mid, b),
            1e-12,
        );
    }

    #[test]
    fn great_circle_handles_antipodes() {
        let a = Vec3::X;
        let b = -Vec3::X;
        let mid = great_circle_direction(a, b, 0.5);
        assert_close(mid.length(), 1.0, 1e-12);
        assert_close(mid.dot(a), 0.0, 1e-9);
    }
}
