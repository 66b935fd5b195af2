/// Seconds on the shared animation clock.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Advances by `dt` seconds. Non-finite or negative deltas are ignored.
    pub fn advanced(self, dt: f64) -> Self {
        if dt.is_finite() && dt > 0.0 {
            Time(self.0 + dt)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn advance_ignores_bad_deltas() {
        let t = Time(1.0);
        assert_eq!(t.advanced(0.5), Time(1.5));
        assert_eq!(t.advanced(-0.5), t);
        assert_eq!(t.advanced(f64::NAN), t);
        assert_eq!(t.advanced(f64::INFINITY), t);
    }
}
