use foundation::curve::{CONTROL_POINT_COUNT, CatmullRom, ControlPointSet};
use foundation::math::Vec3;
use tracing::warn;

/// Parameters at which non-four-point input is resampled.
///
/// Uniform parameter spacing is an approximation for unevenly spaced input; it matches
/// how the renderers have always sampled paths, so keep it.
pub const RESAMPLE_PARAMETERS: [f64; CONTROL_POINT_COUNT] = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];

/// Reduces `points` to exactly four control points above the altitude floor.
///
/// Four-point input is only lifted; anything else is fitted with the shared Catmull-Rom
/// curve and sampled at [`RESAMPLE_PARAMETERS`]. Fewer than two points cannot define a
/// curve and yield `None`.
pub fn normalize_control_points(
    points: &[Vec3],
    radius: f64,
    min_altitude: f64,
) -> Option<ControlPointSet> {
    if points.len() < 2 {
        warn!(
            count = points.len(),
            "normalize_control_points needs at least 2 points"
        );
        return None;
    }

    let mut out: [Vec3; CONTROL_POINT_COUNT] = if points.len() == CONTROL_POINT_COUNT {
        [points[0], points[1], points[2], points[3]]
    } else {
        let curve = CatmullRom::new(points);
        RESAMPLE_PARAMETERS.map(|t| curve.point(t))
    };

    enforce_altitude_floor(&mut out, radius, min_altitude);
    Some(ControlPointSet::new(out))
}

/// Pushes every point closer than `radius + min_altitude` radially out to that distance.
///
/// A point at the origin has no radial direction and is placed straight up (+Y).
pub fn enforce_altitude_floor(points: &mut [Vec3], radius: f64, min_altitude: f64) {
    let floor = radius + min_altitude;
    for p in points.iter_mut() {
        if p.length() < floor {
            *p = p.normalize_or(Vec3::Y) * floor;
        }
    }
}
