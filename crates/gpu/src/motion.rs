/// Cycle length while panes fly one way only.
pub const ONE_WAY_PERIOD: f64 = 1.0;
/// Cycle length while round trips are enabled: `[0, 1)` outbound, `[1, 2)` return.
pub const ROUND_TRIP_PERIOD: f64 = 2.0;

pub fn period(return_enabled: bool) -> f64 {
    if return_enabled {
        ROUND_TRIP_PERIOD
    } else {
        ONE_WAY_PERIOD
    }
}

/// Position in the animation cycle as a linear function of shared time.
///
/// The host keeps these in `f64`; the packed attribute gets the `f32` rounding.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Motion {
    pub phase: f64,
    pub speed: f64,
}

impl Motion {
    pub fn new(phase: f64, speed: f64) -> Self {
        Self {
            phase: if phase.is_finite() { phase } else { 0.0 },
            speed: if speed.is_finite() { speed } else { 0.0 },
        }
    }

    /// `(time * speed + phase) mod period`, always in `[0, period)`.
    pub fn cycle(&self, time: f64, period: f64) -> f64 {
        (time * self.speed + self.phase).rem_euclid(period)
    }

    /// Same position at `time`, moving at `speed` from now on.
    pub fn retimed(&self, time: f64, speed: f64, period: f64) -> Motion {
        let speed = if speed.is_finite() { speed } else { self.speed };
        let progress = self.cycle(time, period);
        Motion {
            phase: (progress - time * speed).rem_euclid(period),
            speed,
        }
    }

    /// Phase shifted back by one cycle unit, wrapped into `[0, period)`.
    pub fn rewound(&self, period: f64) -> Motion {
        Motion {
            phase: (self.phase - 1.0).rem_euclid(period),
            speed: self.speed,
        }
    }

    /// Starts a fresh outbound leg at `time`.
    pub fn restarted(&self, time: f64, period: f64) -> Motion {
        Motion {
            phase: (-time * self.speed).rem_euclid(period),
            speed: self.speed,
        }
    }
}
