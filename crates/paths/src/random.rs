use foundation::BoundingSphere;
use foundation::math::Vec3;
use rand::Rng;

/// Random wandering curve inside a sphere.
///
/// Picks a start and an end inside the sphere, then places `num_points` interior points on
/// the straight line between them, each pushed by an independent offset in
/// `[-spread, spread]` per axis and pulled back into the sphere. The result has
/// `num_points + 2` points.
pub fn generate_random_curve<R: Rng + ?Sized>(
    rng: &mut R,
    center: Vec3,
    radius: f64,
    spread: f64,
    num_points: usize,
) -> Vec<Vec3> {
    let radius = finite_or_zero(radius).abs();
    let spread = finite_or_zero(spread).abs();
    let sphere = BoundingSphere::new(center, radius);

    let start = random_point_in_sphere(rng, &sphere);
    let end = random_point_in_sphere(rng, &sphere);

    let mut points = Vec::with_capacity(num_points + 2);
    points.push(start);
    for i in 1..=num_points {
        let t = i as f64 / (num_points + 1) as f64;
        let offset = Vec3::new(
            rng.gen_range(-spread..=spread),
            rng.gen_range(-spread..=spread),
            rng.gen_range(-spread..=spread),
        );
        points.push(sphere.clamp(start.lerp(end, t) + offset));
    }
    points.push(end);
    points
}

/// Uniformly distributed point inside the sphere.
pub fn random_point_in_sphere<R: Rng + ?Sized>(rng: &mut R, sphere: &BoundingSphere) -> Vec3 {
    let z: f64 = rng.gen_range(-1.0..=1.0);
    let azimuth: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let ring = (1.0 - z * z).max(0.0).sqrt();
    let dir = Vec3::new(ring * azimuth.cos(), z, ring * azimuth.sin());
    let r = sphere.radius * rng.gen_range(0.0f64..=1.0).cbrt();
    sphere.clamp(sphere.center + dir * r)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::{generate_random_curve, random_point_in_sphere};
    use foundation::BoundingSphere;
    use foundation::math::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn produces_interior_plus_endpoints() {
        let mut rng = StdRng::seed_from_u64(7);
        let pts = generate_random_curve(&mut rng, Vec3::ZERO, 100.0, 20.0, 3);
        assert_eq!(pts.len(), 5);
    }

    #[test]
    fn every_point_stays_in_sphere() {
        let mut rng = StdRng::seed_from_u64(42);
        let center = Vec3::new(10.0, -5.0, 3.0);
        for _ in 0..50 {
            let pts = generate_random_curve(&mut rng, center, 50.0, 500.0, 6);
            for p in pts {
                assert!(p.distance(center) <= 50.0 + 1e-9, "{p:?} escaped the sphere");
            }
        }
    }

    #[test]
    fn zero_spread_stays_on_chord() {
        let mut rng = StdRng::seed_from_u64(3);
        let pts = generate_random_curve(&mut rng, Vec3::ZERO, 10.0, 0.0, 2);
        let (start, end) = (pts[0], pts[3]);
        let chord = end - start;
        for p in &pts[1..3] {
            let cross = (*p - start).cross(chord).length();
            assert!(cross < 1e-9);
        }
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(1);
        let pts = generate_random_curve(&mut rng, Vec3::ZERO, f64::NAN, -3.0, 0);
        assert_eq!(pts, vec![Vec3::ZERO, Vec3::ZERO]);

        let sphere = BoundingSphere::new(Vec3::X, 0.0);
        assert_eq!(random_point_in_sphere(&mut rng, &sphere), Vec3::X);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate_random_curve(&mut StdRng::seed_from_u64(9), Vec3::ZERO, 5.0, 1.0, 4);
        let b = generate_random_curve(&mut StdRng::seed_from_u64(9), Vec3::ZERO, 5.0, 1.0, 4);
        assert_eq!(a, b);
    }
}
