use crate::math::Vec3;

/// Bounding sphere used to confine randomly generated geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        BoundingSphere {
            center,
            radius: radius.abs(),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Pulls `p` back onto the surface if it lies outside.
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        let d = p - self.center;
        let len = d.length();
        if len <= self.radius {
            return p;
        }
        self.center + d * (self.radius / len)
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingSphere;
    use crate::math::Vec3;

    #[test]
    fn clamp_keeps_inside_points() {
        let s = BoundingSphere::new(Vec3::new(1.0, 1.0, 1.0), 2.0);
        let p = Vec3::new(1.5, 1.0, 1.0);
        assert_eq!(s.clamp(p), p);
        assert!(s.contains(p));
    }

    #[test]
    fn clamp_projects_outside_points() {
        let s = BoundingSphere::new(Vec3::ZERO, 2.0);
        let p = s.clamp(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(2.0, 0.0, 0.0));
        assert!(s.contains(p));
    }
}
