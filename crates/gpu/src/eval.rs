//! Host-side pane evaluation.
//!
//! This is the same computation `PANE_SHADER` runs per vertex, in `f64`. Rendering never
//! needs it; it exists for picking, overlays and tests. Any change here must be made in the
//! shader too.

use foundation::curve::ControlPointSet;
use foundation::math::Vec3;

const DEGENERATE: f64 = 1e-8;

/// Orientation strategy, stored as the tilt flag of the animation group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TiltMode {
    /// Pane faces along the direction of travel.
    #[default]
    TravelDirection,
    /// Pane lies on the sphere surface with the travel direction as its up axis.
    SurfaceNormal,
}

impl TiltMode {
    pub fn as_flag(self) -> f32 {
        match self {
            TiltMode::TravelDirection => 0.0,
            TiltMode::SurfaceNormal => 1.0,
        }
    }

    pub fn from_flag(v: f32) -> Self {
        if v > 0.5 {
            TiltMode::SurfaceNormal
        } else {
            TiltMode::TravelDirection
        }
    }
}

/// Curve parameter for a cycle value, and whether the pane is on its return leg.
pub fn path_parameter(cycle: f64, return_enabled: bool) -> (f64, bool) {
    if return_enabled && cycle > 1.0 {
        ((2.0 - cycle).clamp(0.0, 1.0), true)
    } else {
        (cycle.clamp(0.0, 1.0), false)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaneSample {
    pub position: Vec3,
    /// Facing direction of the pane.
    pub normal: Vec3,
    /// In-plane "up" axis of the quad.
    pub tangent: Vec3,
    /// In-plane "right" axis of the quad.
    pub bitangent: Vec3,
    pub t: f64,
    pub returning: bool,
}

impl PaneSample {
    /// World position of a quad corner given in `[-0.5, 0.5]²`.
    pub fn corner(&self, quad: [f32; 2], scale: f64) -> Vec3 {
        self.position
            + (self.bitangent * quad[0] as f64 + self.tangent * quad[1] as f64) * scale
    }
}

fn any_perpendicular(v: Vec3) -> Vec3 {
    v.cross(Vec3::Y)
        .try_normalize(DEGENERATE)
        .or_else(|| v.cross(Vec3::X).try_normalize(DEGENERATE))
        .unwrap_or(Vec3::Z)
}

/// Removes the `axis` component of `v`, falling back to any perpendicular of `axis`.
fn orthogonal_to(v: Vec3, axis: Vec3) -> Vec3 {
    (v - axis * v.dot(axis))
        .try_normalize(DEGENERATE)
        .unwrap_or_else(|| any_perpendicular(axis))
}

pub fn evaluate_pane(
    control: &ControlPointSet,
    cycle: f64,
    return_enabled: bool,
    tilt: TiltMode,
    elevation: f64,
) -> PaneSample {
    let (t, returning) = path_parameter(cycle, return_enabled);
    let curve = control.curve();
    let on_curve = curve.point(t);
    let radial = on_curve.normalize_or(Vec3::Y);
    let position = on_curve + radial * elevation;

    let mut forward = curve
        .tangent(t)
        .try_normalize(DEGENERATE)
        .unwrap_or_else(|| any_perpendicular(radial));
    if returning {
        forward = -forward;
    }

    let (normal, tangent) = match tilt {
        TiltMode::TravelDirection => (forward, orthogonal_to(radial, forward)),
        TiltMode::SurfaceNormal => (radial, orthogonal_to(forward, radial)),
    };

    PaneSample {
        position,
        normal,
        tangent,
        bitangent: normal.cross(tangent),
        t,
        returning,
    }
}

#[cfg(test)]
mod tests {
    use super::{TiltMode, evaluate_pane, path_parameter};
    use foundation::curve::ControlPointSet;
    use foundation::math::Vec3;

    fn arc() -> ControlPointSet {
        ControlPointSet::new([
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(3.0, 11.0, 0.0),
            Vec3::new(6.0, 11.0, 0.0),
            Vec3::new(9.0, 10.0, 0.0),
        ])
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn return_leg_runs_backwards() {
        assert_eq!(path_parameter(0.25, true), (0.25, false));
        assert_eq!(path_parameter(1.25, true), (0.75, true));
        assert_eq!(path_parameter(1.25, false), (1.0, false));
    }

    #[test]
    fn endpoints_and_elevation() {
        let s = evaluate_pane(&arc(), 0.0, false, TiltMode::TravelDirection, 2.0);
        assert!(close(s.position, Vec3::new(0.0, 12.0, 0.0)), "{:?}", s.position);
        let e = evaluate_pane(&arc(), 1.0, false, TiltMode::TravelDirection, 0.0);
        assert!(e.position.distance(Vec3::new(9.0, 10.0, 0.0)) < 1e-9);
    }

    #[test]
    fn basis_is_orthonormal_in_both_modes() {
        for tilt in [TiltMode::TravelDirection, TiltMode::SurfaceNormal] {
            for cycle in [0.0, 0.3, 0.5, 0.9, 1.4] {
                let s = evaluate_pane(&arc(), cycle, true, tilt, 0.5);
                for v in [s.normal, s.tangent, s.bitangent] {
                    assert!((v.length() - 1.0).abs() < 1e-9);
                }
                assert!(s.normal.dot(s.tangent).abs() < 1e-9);
                assert!(s.normal.dot(s.bitangent).abs() < 1e-9);
                assert!(s.tangent.dot(s.bitangent).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn travel_mode_faces_forward_and_flips_on_return() {
        let out = evaluate_pane(&arc(), 0.5, true, TiltMode::TravelDirection, 0.0);
        assert!(out.normal.x > 0.99);
        let back = evaluate_pane(&arc(), 1.5, true, TiltMode::TravelDirection, 0.0);
        assert!(back.returning);
        assert!(back.normal.x < -0.99);
        assert!(close(out.position, back.position));
    }

    #[test]
    fn surface_mode_faces_outward() {
        let s = evaluate_pane(&arc(), 0.5, false, TiltMode::SurfaceNormal, 0.0);
        assert!(close(s.normal, s.position.normalize_or(Vec3::Y)));
        assert!(s.tangent.x > 0.8);
    }

    #[test]
    fn degenerate_control_points_still_yield_a_basis() {
        let flat = ControlPointSet::new([Vec3::ZERO; 4]);
        let s = evaluate_pane(&flat, 0.5, false, TiltMode::TravelDirection, 1.0);
        assert!(close(s.position, Vec3::Y));
        assert!((s.normal.length() - 1.0).abs() < 1e-9);
        assert!(s.normal.dot(s.tangent).abs() < 1e-9);
    }

    #[test]
    fn tilt_flag_round_trips() {
        assert_eq!(TiltMode::from_flag(TiltMode::SurfaceNormal.as_flag()), TiltMode::SurfaceNormal);
        assert_eq!(TiltMode::from_flag(0.0), TiltMode::TravelDirection);
    }
}
