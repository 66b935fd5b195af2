use std::f64::consts::PI;

use foundation::math::{GeoPoint, Vec3, geo_to_vec3, great_circle_angle, great_circle_direction};
use serde::{Deserialize, Serialize};

use crate::normalize::enforce_altitude_floor;
use crate::route::Route;

/// Number of points emitted by [`generate_parabolic_control_points`].
pub const PARABOLIC_POINT_COUNT: usize = 9;

/// Cruise altitude grows with `(angle / π)^CRUISE_EXPONENT`.
const CRUISE_EXPONENT: f64 = 0.7;

/// Liftoff/touchdown offset along the surface tangent, as a fraction of the arc length.
const TANGENT_FRACTION: f64 = 0.06;

/// Great-circle fractions of the climb, cruise peak and descent points.
const PROFILE_FRACTIONS: [f64; 5] = [0.2, 0.35, 0.5, 0.65, 0.8];

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParabolicParams {
    pub radius: f64,
    pub takeoff_offset: f64,
    pub min_curve_altitude: f64,
    pub min_cruise_altitude: f64,
    pub max_cruise_altitude: f64,
}

impl Default for ParabolicParams {
    fn default() -> Self {
        Self {
            radius: 3000.0,
            takeoff_offset: 18.0,
            min_curve_altitude: 20.0,
            min_cruise_altitude: 30.0,
            max_cruise_altitude: 220.0,
        }
    }
}

impl ParabolicParams {
    /// Altitude shared by the departure and arrival surface points.
    pub fn surface_altitude(&self) -> f64 {
        self.takeoff_offset.max(self.min_curve_altitude)
    }

    /// Cruise altitude for a great-circle `angle` in radians.
    pub fn cruise_altitude(&self, angle: f64) -> f64 {
        let lo = self.min_cruise_altitude.min(self.max_cruise_altitude);
        let hi = self.min_cruise_altitude.max(self.max_cruise_altitude);
        let ratio = (angle / PI).clamp(0.0, 1.0);
        (hi * ratio.powf(CRUISE_EXPONENT))
            .clamp(lo, hi)
            .max(self.surface_altitude())
    }
}

/// Nine-point flight profile between two geographic coordinates.
///
/// Order: departure surface, tangential liftoff, two climb points, cruise peak, two descent
/// points, tangential touchdown, arrival surface. Every point is at least
/// `radius + min_curve_altitude` from the origin.
pub fn generate_parabolic_control_points(
    departure: GeoPoint,
    arrival: GeoPoint,
    params: &ParabolicParams,
) -> Vec<Vec3> {
    let a = geo_to_vec3(departure, 1.0).normalize_or(Vec3::Y);
    let b = geo_to_vec3(arrival, 1.0).normalize_or(Vec3::Y);

    let surface_alt = params.surface_altitude();
    let surface_r = params.radius + surface_alt;
    let angle = great_circle_angle(a, b);
    let cruise_alt = params.cruise_altitude(angle);

    let start = a * surface_r;
    let end = b * surface_r;
    let tangent_len = angle * surface_r * TANGENT_FRACTION;

    let liftoff = start + surface_tangent(a, end - start) * tangent_len;
    let touchdown = end + surface_tangent(b, start - end) * tangent_len;

    let mut points = Vec::with_capacity(PARABOLIC_POINT_COUNT);
    points.push(start);
    points.push(liftoff);
    for f in PROFILE_FRACTIONS {
        let lift = 4.0 * f * (1.0 - f);
        let alt = surface_alt + (cruise_alt - surface_alt) * lift;
        points.push(great_circle_direction(a, b, f) * (params.radius + alt));
    }
    points.push(touchdown);
    points.push(end);

    enforce_altitude_floor(&mut points, params.radius, params.min_curve_altitude);
    points
}

pub fn generate_route_control_points(route: &Route, params: &ParabolicParams) -> Vec<Vec3> {
    generate_parabolic_control_points(route.departure, route.arrival, params)
}

/// `direction` projected onto the plane perpendicular to the unit `normal`.
///
/// Falls back to `normal × Y`, then `normal × X`, when the projection vanishes
/// (coincident or antipodal endpoints).
pub fn surface_tangent(normal: Vec3, direction: Vec3) -> Vec3 {
    let projected = direction - normal * direction.dot(normal);
    projected
        .try_normalize(1e-9)
        .or_else(|| normal.cross(Vec3::Y).try_normalize(1e-9))
        .unwrap_or_else(|| normal.cross(Vec3::X).normalize_or(Vec3::Z))
}

#[cfg(test)]
mod tests {
    use super::{ParabolicParams, generate_parabolic_control_points, surface_tangent};
    use foundation::math::{GeoPoint, Vec3};

    fn sfo_jfk() -> (GeoPoint, GeoPoint) {
        (GeoPoint::new(37.6, -122.4), GeoPoint::new(40.6, -73.8))
    }

    #[test]
    fn sfo_to_jfk_respects_altitude_floor() {
        let (dep, arr) = sfo_jfk();
        let pts = generate_parabolic_control_points(dep, arr, &ParabolicParams::default());
        assert_eq!(pts.len(), 9);
        for p in &pts {
            assert!(p.length() >= 3020.0 - 1e-9, "point below floor: {}", p.length());
        }
    }

    #[test]
    fn peak_is_highest_and_within_cruise_band() {
        let (dep, arr) = sfo_jfk();
        let params = ParabolicParams::default();
        let pts = generate_parabolic_control_points(dep, arr, &params);
        let peak = pts[4].length() - params.radius;
        assert!((30.0..=220.0).contains(&peak));
        for p in &pts {
            assert!(p.length() - params.radius <= peak + 1e-9);
        }
    }

    #[test]
    fn cruise_scales_with_distance() {
        let params = ParabolicParams::default();
        let short = params.cruise_altitude(0.05);
        let long = params.cruise_altitude(2.5);
        assert!(short < long);
        assert_eq!(params.cruise_altitude(0.0), 30.0);
        assert_eq!(params.cruise_altitude(std::f64::consts::PI), 220.0);
    }

    #[test]
    fn liftoff_leaves_along_the_surface_tangent() {
        let (dep, arr) = sfo_jfk();
        let pts = generate_parabolic_control_points(dep, arr, &ParabolicParams::default());
        let normal = pts[0].normalize_or(Vec3::Y);
        let leg = (pts[1] - pts[0]).normalize_or(Vec3::X);
        assert!(leg.dot(normal).abs() < 1e-9);
        // And it heads toward the destination.
        assert!((pts[1] - pts[0]).dot(pts[8] - pts[0]) > 0.0);
    }

    #[test]
    fn same_airport_is_degenerate_but_finite() {
        let p = GeoPoint::new(10.0, 20.0);
        let pts = generate_parabolic_control_points(p, p, &ParabolicParams::default());
        assert_eq!(pts.len(), 9);
        for q in pts {
            assert!(q.x.is_finite() && q.y.is_finite() && q.z.is_finite());
            assert!(q.length() >= 3020.0 - 1e-9);
        }
    }

    #[test]
    fn antipodal_route_stays_finite() {
        let pts = generate_parabolic_control_points(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 180.0),
            &ParabolicParams::default(),
        );
        for q in pts {
            assert!(q.length().is_finite());
            assert!(q.length() >= 3020.0 - 1e-9);
        }
    }

    #[test]
    fn tangent_falls_back_for_parallel_direction() {
        let t = surface_tangent(Vec3::X, Vec3::X * 5.0);
        assert!((t.length() - 1.0).abs() < 1e-12);
        assert!(t.dot(Vec3::X).abs() < 1e-12);

        let t = surface_tangent(Vec3::Y, Vec3::ZERO);
        assert!((t.length() - 1.0).abs() < 1e-12);
        assert!(t.dot(Vec3::Y).abs() < 1e-12);
    }
}
