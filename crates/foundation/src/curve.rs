//! Centripetal Catmull-Rom interpolation.
//!
//! This is the one spline used everywhere: the path renderer samples it, the resampler
//! in `paths` fits it, and the pane vertex shader evaluates it on four control points.
//! The WGSL copy in `gpu::shaders` must stay numerically identical to [`CatmullRom`].

use crate::math::Vec3;

/// Number of points every animated path carries.
pub const CONTROL_POINT_COUNT: usize = 4;

/// Exactly four ordered control points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlPointSet(pub [Vec3; CONTROL_POINT_COUNT]);

impl ControlPointSet {
    pub fn new(points: [Vec3; CONTROL_POINT_COUNT]) -> Self {
        Self(points)
    }

    /// Takes the first four points of `points`; `None` if there are fewer.
    pub fn from_slice(points: &[Vec3]) -> Option<Self> {
        match points {
            [a, b, c, d, ..] => Some(Self([*a, *b, *c, *d])),
            _ => None,
        }
    }

    pub fn points(&self) -> &[Vec3; CONTROL_POINT_COUNT] {
        &self.0
    }

    /// Packs the points into three vec4 groups (12 scalars, point-major order).
    pub fn pack(&self) -> [[f32; 4]; 3] {
        let mut flat = [0.0f32; 12];
        for (i, p) in self.0.iter().enumerate() {
            flat[i * 3] = p.x as f32;
            flat[i * 3 + 1] = p.y as f32;
            flat[i * 3 + 2] = p.z as f32;
        }
        [
            [flat[0], flat[1], flat[2], flat[3]],
            [flat[4], flat[5], flat[6], flat[7]],
            [flat[8], flat[9], flat[10], flat[11]],
        ]
    }

    pub fn unpack(packed: &[[f32; 4]; 3]) -> Self {
        let flat: Vec<f64> = packed.iter().flatten().map(|v| *v as f64).collect();
        let p = |i: usize| Vec3::new(flat[i * 3], flat[i * 3 + 1], flat[i * 3 + 2]);
        Self([p(0), p(1), p(2), p(3)])
    }

    pub fn curve(&self) -> CatmullRom<'_> {
        CatmullRom::new(&self.0)
    }
}

// Knot intervals shorter than this are treated as degenerate.
const MIN_KNOT_INTERVAL: f64 = 1e-4;

/// Open centripetal Catmull-Rom curve through borrowed points.
///
/// The parameter `t ∈ [0, 1]` is spread uniformly over the segments, so with four points
/// `t = 1/3` and `t = 2/3` land exactly on the interior points.
#[derive(Debug, Copy, Clone)]
pub struct CatmullRom<'a> {
    points: &'a [Vec3],
}

struct Segment {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl Segment {
    fn value(&self, w: f64) -> Vec3 {
        self.c0 + self.c1 * w + self.c2 * (w * w) + self.c3 * (w * w * w)
    }

    fn derivative(&self, w: f64) -> Vec3 {
        self.c1 + self.c2 * (2.0 * w) + self.c3 * (3.0 * w * w)
    }
}

impl<'a> CatmullRom<'a> {
    pub fn new(points: &'a [Vec3]) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `t ∈ [0, 1]` (clamped). Zero points yields the origin, one point yields itself.
    pub fn point(&self, t: f64) -> Vec3 {
        match self.points {
            [] => Vec3::ZERO,
            [only] => *only,
            _ => {
                let (seg, w) = self.segment(t);
                seg.value(w)
            }
        }
    }

    /// Derivative with respect to `t` (not normalized).
    pub fn tangent(&self, t: f64) -> Vec3 {
        if self.points.len() < 2 {
            return Vec3::ZERO;
        }
        let (seg, w) = self.segment(t);
        seg.derivative(w) * (self.points.len() - 1) as f64
    }

    /// `count` points at evenly spaced parameters from 0 to 1 inclusive.
    pub fn sample(&self, count: usize) -> Vec<Vec3> {
        match count {
            0 => Vec::new(),
            1 => vec![self.point(0.0)],
            _ => (0..count)
                .map(|i| self.point(i as f64 / (count - 1) as f64))
                .collect(),
        }
    }

    fn segment(&self, t: f64) -> (Segment, f64) {
        let pts = self.points;
        let l = pts.len();
        let p = (l - 1) as f64 * t.clamp(0.0, 1.0);
        let mut i = p.floor() as usize;
        let mut w = p - i as f64;
        if i >= l - 1 {
            i = l - 2;
            w = 1.0;
        }

        let p1 = pts[i];
        let p2 = pts[i + 1];
        let p0 = if i > 0 { pts[i - 1] } else { p1 * 2.0 - p2 };
        let p3 = if i + 2 < l { pts[i + 2] } else { p2 * 2.0 - p1 };

        (centripetal_segment(p0, p1, p2, p3), w)
    }
}

fn centripetal_segment(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Segment {
    // Fourth root of the squared distance; written as two square roots to match WGSL.
    let mut dt0 = p0.distance_squared(p1).sqrt().sqrt();
    let mut dt1 = p1.distance_squared(p2).sqrt().sqrt();
    let mut dt2 = p2.distance_squared(p3).sqrt().sqrt();

    if dt1 < MIN_KNOT_INTERVAL {
        dt1 = 1.0;
    }
    if dt0 < MIN_KNOT_INTERVAL {
        dt0 = dt1;
    }
    if dt2 < MIN_KNOT_INTERVAL {
        dt2 = dt1;
    }

    let m1 = ((p1 - p0) * (1.0 / dt0) - (p2 - p0) * (1.0 / (dt0 + dt1)) + (p2 - p1) * (1.0 / dt1))
        * dt1;
    let m2 = ((p2 - p1) * (1.0 / dt1) - (p3 - p1) * (1.0 / (dt1 + dt2)) + (p3 - p2) * (1.0 / dt2))
        * dt1;

    Segment {
        c0: p1,
        c1: m1,
        c2: p1 * -3.0 + p2 * 3.0 - m1 * 2.0 - m2,
        c3: p1 * 2.0 - p2 * 2.0 + m1 + m2,
    }
}

#[cfg(test)]
mod tests {
    use super::{CatmullRom, ControlPointSet};
    use crate::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let d = a.distance(b);
        assert!(d <= eps, "expected {a:?} ~= {b:?} (dist {d})");
    }

    fn sample_points() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(3.0, 2.5, 1.0),
            Vec3::new(4.0, 0.0, 2.0),
            Vec3::new(6.0, -1.0, 2.0),
        ]
    }

    #[test]
    fn interpolates_every_knot() {
        let pts = sample_points();
        let curve = CatmullRom::new(&pts);
        for (i, p) in pts.iter().enumerate() {
            let t = i as f64 / (pts.len() - 1) as f64;
            assert_vec_close(curve.point(t), *p, 1e-9);
        }
    }

    #[test]
    fn two_points_is_a_straight_line() {
        let pts = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)];
        let curve = CatmullRom::new(&pts);
        assert_vec_close(curve.point(0.5), Vec3::new(1.0, 0.0, 0.0), 1e-9);
        let tangent = curve.tangent(0.25);
        assert!(tangent.x > 0.0);
        assert!(tangent.y.abs() < 1e-9);
    }

    #[test]
    fn clamps_parameter() {
        let pts = sample_points();
        let curve = CatmullRom::new(&pts);
        assert_vec_close(curve.point(-1.0), pts[0], 1e-12);
        assert_vec_close(curve.point(2.0), pts[4], 1e-9);
    }

    #[test]
    fn tangent_matches_finite_difference() {
        let pts = sample_points();
        let curve = CatmullRom::new(&pts);
        let t = 0.37;
        let h = 1e-6;
        let fd = (curve.point(t + h) - curve.point(t - h)) * (1.0 / (2.0 * h));
        assert_vec_close(curve.tangent(t), fd, 1e-4);
    }

    #[test]
    fn duplicate_points_stay_finite() {
        let pts = [Vec3::X, Vec3::X, Vec3::X, Vec3::Y];
        let curve = CatmullRom::new(&pts);
        for i in 0..=10 {
            let p = curve.point(i as f64 / 10.0);
            assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        }
    }

    #[test]
    fn pack_is_point_major() {
        let set = ControlPointSet::new([
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
            Vec3::new(10.0, 11.0, 12.0),
        ]);
        let packed = set.pack();
        assert_eq!(packed[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(packed[1], [5.0, 6.0, 7.0, 8.0]);
        assert_eq!(packed[2], [9.0, 10.0, 11.0, 12.0]);
        assert_eq!(ControlPointSet::unpack(&packed), set);
    }

    #[test]
    fn from_slice_requires_four() {
        assert!(ControlPointSet::from_slice(&[Vec3::X; 3]).is_none());
        assert!(ControlPointSet::from_slice(&[Vec3::X; 5]).is_some());
    }
}
