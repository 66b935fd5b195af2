//! One animated flight: a path slot and a pane slot sharing an index.

use foundation::color::Rgb;
use foundation::curve::ControlPointSet;
use foundation::handles::Handle;
use gpu::eval::{TiltMode, path_parameter};
use gpu::motion::Motion;
use gpu::panes::PaneAnimator;
use gpu::path_batch::{BatchedPathRenderer, PathColor};

/// Fraction of the remaining speed difference closed per second-scaled frame.
pub const SPEED_SMOOTHING_RATE: f64 = 6.0;
/// Smoothed speed snaps to the target once this close.
pub const SPEED_SNAP_EPSILON: f64 = 1e-4;

/// The two renderers a flight writes into.
pub struct FlightBuffers<'a> {
    pub paths: &'a mut BatchedPathRenderer,
    pub panes: &'a mut PaneAnimator,
}

/// Appearance and motion of a flight at spawn time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlightStyle {
    pub path_color: PathColor,
    pub pane_color: Rgb,
    pub pane_size: f32,
    pub pane_elevation: f32,
    pub speed: f64,
    /// Starting cycle position.
    pub phase: f64,
    pub texture: i64,
    pub tilt: TiltMode,
}

#[derive(Debug, Clone)]
pub struct Flight {
    handle: Handle,
    control: ControlPointSet,
    path_color: PathColor,
    speed: f64,
    target_speed: f64,
    /// Round trips requested for this flight. Where the pane is drawn is decided by the
    /// pane animator's return mode, which may still be draining.
    return_flight: bool,
}

impl Flight {
    /// Writes both slots and places the pane at cycle position `style.phase` right now.
    pub fn spawn(
        handle: Handle,
        control: ControlPointSet,
        style: &FlightStyle,
        return_flight: bool,
        buffers: &mut FlightBuffers<'_>,
    ) -> Self {
        let index = handle.slot();
        buffers
            .paths
            .set_curve(index, control.points(), style.path_color);

        let panes = &mut *buffers.panes;
        panes.set_curve_control_points(index, control.points());
        panes.set_color(index, style.pane_color);
        panes.set_scale(index, style.pane_size);
        panes.set_elevation(index, style.pane_elevation);
        panes.set_texture_index(index, style.texture);
        panes.set_tilt_mode(index, style.tilt);
        let speed = Motion::new(0.0, style.speed).speed;
        let start = style.phase - panes.global_time() * speed;
        panes.set_animation_params(index, start, speed);

        Self {
            handle,
            control,
            path_color: style.path_color,
            speed,
            target_speed: speed,
            return_flight,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn index(&self) -> usize {
        self.handle.slot()
    }

    pub fn control_points(&self) -> &ControlPointSet {
        &self.control
    }

    pub fn path_color(&self) -> PathColor {
        self.path_color
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    pub fn return_flight(&self) -> bool {
        self.return_flight
    }

    pub fn is_smoothing(&self) -> bool {
        self.speed != self.target_speed
    }

    pub fn set_control_points(&mut self, control: ControlPointSet, buffers: &mut FlightBuffers<'_>) {
        let index = self.index();
        buffers
            .paths
            .set_curve(index, control.points(), self.path_color);
        buffers
            .panes
            .set_curve_control_points(index, control.points());
        self.control = control;
    }

    pub fn set_curve_color(&mut self, color: PathColor, buffers: &mut FlightBuffers<'_>) {
        self.path_color = color;
        buffers.paths.set_curve_color(self.index(), color);
    }

    pub fn set_pane_color(&self, color: Rgb, buffers: &mut FlightBuffers<'_>) {
        buffers.panes.set_color(self.index(), color);
    }

    pub fn set_pane_size(&self, size: f32, buffers: &mut FlightBuffers<'_>) {
        buffers.panes.set_scale(self.index(), size);
    }

    pub fn set_pane_elevation(&self, elevation: f32, buffers: &mut FlightBuffers<'_>) {
        buffers.panes.set_elevation(self.index(), elevation);
    }

    pub fn set_texture(&self, texture: i64, buffers: &mut FlightBuffers<'_>) {
        buffers.panes.set_texture_index(self.index(), texture);
    }

    pub fn set_tilt_mode(&self, tilt: TiltMode, buffers: &mut FlightBuffers<'_>) {
        buffers.panes.set_tilt_mode(self.index(), tilt);
    }

    /// Sets the target speed. With `immediate` the pane jumps to it; otherwise
    /// [`Flight::update`] eases toward it.
    pub fn set_animation_speed(
        &mut self,
        speed: f64,
        immediate: bool,
        buffers: &mut FlightBuffers<'_>,
    ) {
        if !speed.is_finite() {
            return;
        }
        self.target_speed = speed;
        if immediate {
            self.apply_speed(speed, buffers);
        }
    }

    /// Eases the active speed toward the target. Returns `true` while still easing.
    pub fn update(&mut self, dt: f64, buffers: &mut FlightBuffers<'_>) -> bool {
        if !self.is_smoothing() {
            return false;
        }
        let rate = if dt.is_finite() && dt > 0.0 {
            (dt * SPEED_SMOOTHING_RATE).min(1.0)
        } else {
            0.0
        };
        let mut next = self.speed + (self.target_speed - self.speed) * rate;
        if (self.target_speed - next).abs() < SPEED_SNAP_EPSILON {
            next = self.target_speed;
        }
        self.apply_speed(next, buffers);
        self.is_smoothing()
    }

    fn apply_speed(&mut self, speed: f64, buffers: &mut FlightBuffers<'_>) {
        self.speed = speed;
        buffers.panes.set_animation_speed(self.index(), speed);
    }

    /// Cycle position of the pane: `[0, 1)` outbound, `[1, 2)` on the way back.
    pub fn elapsed(&self, panes: &PaneAnimator) -> f64 {
        panes.progress(self.index()).unwrap_or(0.0)
    }

    /// Curve parameter and direction, exactly as the pane is drawn.
    pub fn progress(&self, panes: &PaneAnimator) -> (f64, bool) {
        path_parameter(self.elapsed(panes), panes.return_mode_enabled())
    }

    /// Records whether this flight should make round trips. The pane animator keeps the
    /// pane's path position across the switch: it rewinds panes on enable and lets
    /// returning panes land before turning round trips off.
    pub fn set_return_flight(&mut self, enabled: bool) {
        self.return_flight = enabled;
    }

    /// Collapses the path and hides the pane. Both are idempotent.
    pub fn hide(&self, buffers: &mut FlightBuffers<'_>) {
        buffers.paths.hide_curve(self.index());
        buffers.panes.hide_pane(self.index());
    }
}

#[cfg(test)]
mod tests {
    use super::{Flight, FlightBuffers, FlightStyle};
    use foundation::color::Rgb;
    use foundation::curve::ControlPointSet;
    use foundation::handles::Handle;
    use foundation::math::Vec3;
    use gpu::eval::TiltMode;
    use gpu::panes::{PaneAnimator, PaneAnimatorConfig};
    use gpu::path_batch::{BatchedPathRenderer, PathBatchConfig, PathColor};

    fn renderers() -> (BatchedPathRenderer, PaneAnimator) {
        (
            BatchedPathRenderer::new(PathBatchConfig {
                max_curves: 4,
                segments_per_curve: 8,
                ..PathBatchConfig::default()
            }),
            PaneAnimator::new(PaneAnimatorConfig {
                max_panes: 4,
                ..PaneAnimatorConfig::default()
            }),
        )
    }

    fn control() -> ControlPointSet {
        ControlPointSet::new([
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(3.0, 11.0, 0.0),
            Vec3::new(6.0, 11.0, 0.0),
            Vec3::new(9.0, 10.0, 0.0),
        ])
    }

    fn style(speed: f64, phase: f64) -> FlightStyle {
        FlightStyle {
            path_color: PathColor::Solid(Rgb::WHITE),
            pane_color: Rgb::new(1.0, 0.0, 0.0),
            pane_size: 2.0,
            pane_elevation: 0.5,
            speed,
            phase,
            texture: 0,
            tilt: TiltMode::TravelDirection,
        }
    }

    #[test]
    fn spawn_fills_both_slots() {
        let (mut paths, mut panes) = renderers();
        let mut buffers = FlightBuffers {
            paths: &mut paths,
            panes: &mut panes,
        };
        let flight = Flight::spawn(Handle::new(2, 0), control(), &style(0.1, 0.25), false, &mut buffers);

        assert!(paths.is_curve_visible(2));
        assert_eq!(paths.visible_curve_count(), 3);
        assert!(panes.is_visible(2));
        assert_eq!(panes.color(2), Some([1.0, 0.0, 0.0]));
        assert_eq!(panes.scale(2), Some(2.0));
        assert!((panes.progress(2).unwrap() - 0.25).abs() < 1e-9);
        assert!((flight.elapsed(&panes) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn speed_eases_toward_target() {
        let (mut paths, mut panes) = renderers();
        let mut buffers = FlightBuffers {
            paths: &mut paths,
            panes: &mut panes,
        };
        let mut flight = Flight::spawn(Handle::new(0, 0), control(), &style(0.1, 0.0), false, &mut buffers);

        flight.set_animation_speed(0.2, false, &mut buffers);
        assert_eq!(flight.speed(), 0.1);
        assert!(flight.update(0.1, &mut buffers));
        // rate = min(1, 0.1 * 6) = 0.6
        assert!((flight.speed() - 0.16).abs() < 1e-12);

        let mut frames = 0;
        while flight.update(0.1, &mut buffers) {
            frames += 1;
            assert!(frames < 100, "never converged");
        }
        assert_eq!(flight.speed(), 0.2);
        assert_eq!(buffers.panes.motion(0).unwrap().speed, 0.2);
    }

    #[test]
    fn big_frames_jump_straight_to_target() {
        let (mut paths, mut panes) = renderers();
        let mut buffers = FlightBuffers {
            paths: &mut paths,
            panes: &mut panes,
        };
        let mut flight = Flight::spawn(Handle::new(0, 0), control(), &style(0.1, 0.0), false, &mut buffers);
        flight.set_animation_speed(0.3, false, &mut buffers);
        assert!(!flight.update(0.5, &mut buffers));
        assert_eq!(flight.speed(), 0.3);
    }

    #[test]
    fn immediate_speed_skips_smoothing_without_a_jump() {
        let (mut paths, mut panes) = renderers();
        panes.update(3.0);
        let mut buffers = FlightBuffers {
            paths: &mut paths,
            panes: &mut panes,
        };
        let mut flight = Flight::spawn(Handle::new(1, 0), control(), &style(0.1, 0.0), false, &mut buffers);
        let before = buffers.panes.progress(1).unwrap();
        flight.set_animation_speed(0.5, true, &mut buffers);
        assert!(!flight.is_smoothing());
        assert!((buffers.panes.progress(1).unwrap() - before).abs() < 1e-9);
        assert!((flight.elapsed(buffers.panes) - before).abs() < 1e-9);
    }

    #[test]
    fn progress_tracks_the_drawn_pane_through_a_drain() {
        let (mut paths, mut panes) = renderers();
        panes.set_return_mode(true);
        let mut buffers = FlightBuffers {
            paths: &mut paths,
            panes: &mut panes,
        };
        let mut flight =
            Flight::spawn(Handle::new(0, 0), control(), &style(0.1, 0.0), true, &mut buffers);
        buffers.panes.set_active_pane_count(1);

        buffers.panes.update(15.0);
        let (t, returning) = flight.progress(buffers.panes);
        assert!(returning && (t - 0.5).abs() < 1e-9);

        flight.set_return_flight(false);
        buffers.panes.set_return_mode(false);
        let (t, returning) = flight.progress(buffers.panes);
        assert!(returning && (t - 0.5).abs() < 1e-9, "still flying home");

        for _ in 0..7 {
            buffers.panes.update(1.0);
        }
        assert!(!buffers.panes.return_mode_enabled());
        let drawn = buffers.panes.sample(0).unwrap();
        let (t, returning) = flight.progress(buffers.panes);
        assert_eq!(returning, drawn.returning);
        assert!((t - drawn.t).abs() < 1e-9);
        assert!(!flight.return_flight());
    }

    #[test]
    fn hide_is_idempotent() {
        let (mut paths, mut panes) = renderers();
        let mut buffers = FlightBuffers {
            paths: &mut paths,
            panes: &mut panes,
        };
        let flight = Flight::spawn(Handle::new(0, 0), control(), &style(0.1, 0.0), false, &mut buffers);
        flight.hide(&mut buffers);
        flight.hide(&mut buffers);
        assert!(!paths.is_curve_visible(0));
        assert!(!panes.is_visible(0));
    }
}
