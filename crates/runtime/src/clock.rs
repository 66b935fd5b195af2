use foundation::time::Time;

/// One tick of the frame loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTick {
    /// 0-based frame index.
    pub index: u64,
    /// Delta actually applied this frame (seconds), after clamping.
    pub dt_s: f64,
    /// Shared time at the end of the frame.
    pub time: Time,
}

/// Frame timebase for the animation loop.
///
/// Host deltas are clamped to `max_dt_s` so a stalled tab or debugger pause does not skip a
/// whole animation cycle in one step. Non-finite or negative deltas count as zero.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameClock {
    max_dt_s: f64,
    next_index: u64,
    time: Time,
}

impl FrameClock {
    pub const DEFAULT_MAX_DT_S: f64 = 0.25;

    pub fn new(max_dt_s: f64) -> Self {
        let max_dt_s = if max_dt_s.is_finite() && max_dt_s > 0.0 {
            max_dt_s
        } else {
            Self::DEFAULT_MAX_DT_S
        };
        Self {
            max_dt_s,
            next_index: 0,
            time: Time::ZERO,
        }
    }

    pub fn max_dt_s(&self) -> f64 {
        self.max_dt_s
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn frames(&self) -> u64 {
        self.next_index
    }

    pub fn tick(&mut self, dt_s: f64) -> FrameTick {
        let dt_s = if dt_s.is_finite() && dt_s > 0.0 {
            dt_s.min(self.max_dt_s)
        } else {
            0.0
        };
        self.time = self.time.advanced(dt_s);
        let tick = FrameTick {
            index: self.next_index,
            dt_s,
            time: self.time,
        };
        self.next_index += 1;
        tick
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DT_S)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameClock;
    use foundation::time::Time;

    #[test]
    fn ticks_accumulate_time() {
        let mut clock = FrameClock::default();
        let a = clock.tick(0.125);
        let b = clock.tick(0.125);
        assert_eq!((a.index, b.index), (0, 1));
        assert_eq!(b.time, Time(0.25));
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn spikes_are_clamped() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.tick(3.0).dt_s, 0.1);
        assert_eq!(clock.time(), Time(0.1));
    }

    #[test]
    fn bad_deltas_do_not_move_time() {
        let mut clock = FrameClock::new(f64::NAN);
        assert_eq!(clock.max_dt_s(), FrameClock::DEFAULT_MAX_DT_S);
        for dt in [f64::NAN, -1.0, f64::INFINITY] {
            assert_eq!(clock.tick(dt).dt_s, 0.0);
        }
        assert_eq!(clock.time(), Time::ZERO);
        assert_eq!(clock.frames(), 3);
    }
}
