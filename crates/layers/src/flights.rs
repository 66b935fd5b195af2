//! The flights layer: every animated flight on the globe, driven once per frame.

use foundation::SlotPool;
use foundation::color::Rgb;
use foundation::handles::Handle;
use foundation::math::{GeoPoint, Vec3, vec3_to_geo};
use gpu::eval::TiltMode;
use gpu::panes::PaneAnimator;
use gpu::path_batch::{BatchedPathRenderer, DEFAULT_PATH_COLOR, PathColor};
use gpu::upload::BufferSink;
use paths::{
    Route, generate_random_curve, generate_route_control_points, normalize_control_points,
};
use rand::Rng;
use runtime::{FrameClock, Metrics};
use tracing::{debug, warn};

use crate::config::{ConfigError, FlightsConfig};
use crate::flight::{Flight, FlightBuffers, FlightStyle};
use crate::layer::{FrameReport, Layer, LayerId};

/// Latitude band random routes are drawn from, in degrees.
const RANDOM_LATITUDE: (f64, f64) = (-70.0, 70.0);

pub struct FlightsLayer {
    id: LayerId,
    config: FlightsConfig,
    paths: BatchedPathRenderer,
    panes: PaneAnimator,
    pool: SlotPool,
    flights: Vec<Option<Flight>>,
    /// Slots whose speed is still easing toward a target.
    smoothing: Vec<usize>,
    return_mode: bool,
    clock: FrameClock,
    metrics: Metrics,
}

impl FlightsLayer {
    pub fn new(id: LayerId, config: FlightsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.max_flights;
        Ok(Self {
            id,
            paths: BatchedPathRenderer::new(config.path_batch()),
            panes: PaneAnimator::new(config.pane_animator()),
            pool: SlotPool::with_capacity(capacity),
            flights: vec![None; capacity],
            smoothing: Vec::new(),
            return_mode: config.return_mode,
            clock: FrameClock::new(config.max_frame_dt),
            metrics: Metrics::new(),
            config,
        })
    }

    pub fn config(&self) -> &FlightsConfig {
        &self.config
    }

    pub fn paths(&self) -> &BatchedPathRenderer {
        &self.paths
    }

    pub fn panes(&self) -> &PaneAnimator {
        &self.panes
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn flight(&self, handle: Handle) -> Option<&Flight> {
        if !self.pool.contains(handle) {
            return None;
        }
        self.flights.get(handle.slot())?.as_ref()
    }

    /// Curve parameter and direction of the flight's pane as currently drawn.
    pub fn progress(&self, handle: Handle) -> Option<(f64, bool)> {
        Some(self.flight(handle)?.progress(&self.panes))
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.pool.iter_live()
    }

    /// Style built from the configured defaults.
    pub fn default_style(&self, path_color: PathColor, speed: f64, phase: f64) -> FlightStyle {
        FlightStyle {
            path_color,
            pane_color: self.config.default_pane_color(),
            pane_size: self.config.pane_size,
            pane_elevation: self.config.pane_elevation,
            speed,
            phase,
            texture: 0,
            tilt: TiltMode::from(self.config.tilt),
        }
    }

    /// Parabolic flight between the route's endpoints, colored by the configured path color.
    pub fn spawn_route(&mut self, route: &Route, speed: f64, phase: f64) -> Option<Handle> {
        let color = PathColor::from_spec(
            &self.config.path_color,
            Some(route.departure),
            DEFAULT_PATH_COLOR,
        );
        let style = self.default_style(color, speed, phase);
        self.spawn_route_styled(route, &style)
    }

    pub fn spawn_route_styled(&mut self, route: &Route, style: &FlightStyle) -> Option<Handle> {
        let points = generate_route_control_points(route, &self.config.profile);
        self.spawn_points(&points, style)
    }

    /// Random route with random speed, phase and atlas slot.
    pub fn spawn_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Handle> {
        let route = Route::new(random_geo(rng), random_geo(rng));
        let (speed, phase, texture) = self.random_motion(rng);
        let color = PathColor::from_spec(
            &self.config.path_color,
            Some(route.departure),
            DEFAULT_PATH_COLOR,
        );
        let style = FlightStyle {
            texture,
            ..self.default_style(color, speed, phase)
        };
        self.spawn_route_styled(&route, &style)
    }

    /// Wandering curve through the configured sphere, lifted above the altitude floor.
    pub fn spawn_random_curve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Handle> {
        let rc = self.config.random_curve;
        let points = generate_random_curve(
            rng,
            Vec3::ZERO,
            rc.radius,
            rc.spread,
            rc.interior_points,
        );
        let departure = points.first().map(|p| vec3_to_geo(*p).0);
        let (speed, phase, texture) = self.random_motion(rng);
        let color = PathColor::from_spec(&self.config.path_color, departure, DEFAULT_PATH_COLOR);
        let style = FlightStyle {
            texture,
            ..self.default_style(color, speed, phase)
        };
        self.spawn_points(&points, &style)
    }

    fn random_motion<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64, i64) {
        let speed = rng.gen_range(self.config.min_speed..=self.config.max_speed);
        let phase = rng.gen_range(0.0..1.0);
        let slots = self.panes.atlas().slot_count.max(1);
        let texture = rng.gen_range(0..slots as i64);
        (speed, phase, texture)
    }

    /// Spawns a flight along arbitrary control points. Returns `None` when the points cannot
    /// form a curve or every slot is taken.
    pub fn spawn_points(&mut self, points: &[Vec3], style: &FlightStyle) -> Option<Handle> {
        let control = normalize_control_points(
            points,
            self.config.profile.radius,
            self.config.min_altitude(),
        )?;
        let Some(handle) = self.pool.alloc() else {
            warn!(capacity = self.pool.capacity(), "flight capacity reached");
            return None;
        };
        let mut buffers = FlightBuffers {
            paths: &mut self.paths,
            panes: &mut self.panes,
        };
        let flight = Flight::spawn(handle, control, style, self.return_mode, &mut buffers);
        self.flights[handle.slot()] = Some(flight);
        self.sync_counts();
        Some(handle)
    }

    /// Hides the flight's path and pane and frees its slot. Stale handles return `false`.
    pub fn remove(&mut self, handle: Handle) -> bool {
        if !self.pool.release(handle) {
            return false;
        }
        if let Some(flight) = self.flights[handle.slot()].take() {
            let mut buffers = FlightBuffers {
                paths: &mut self.paths,
                panes: &mut self.panes,
            };
            flight.hide(&mut buffers);
        }
        self.smoothing.retain(|&slot| slot != handle.slot());
        self.sync_counts();
        true
    }

    fn sync_counts(&mut self) {
        let hwm = self.pool.high_water_mark();
        self.paths.set_visible_curve_count(hwm);
        self.panes.set_active_pane_count(hwm);
    }

    fn with_flight<T>(
        &mut self,
        handle: Handle,
        f: impl FnOnce(&mut Flight, &mut FlightBuffers<'_>) -> T,
    ) -> Option<T> {
        if !self.pool.contains(handle) {
            return None;
        }
        let flight = self.flights.get_mut(handle.slot())?.as_mut()?;
        let mut buffers = FlightBuffers {
            paths: &mut self.paths,
            panes: &mut self.panes,
        };
        Some(f(flight, &mut buffers))
    }

    /// Changes a flight's speed, eased over the next frames unless `immediate`.
    pub fn set_speed(&mut self, handle: Handle, speed: f64, immediate: bool) -> bool {
        let smoothing = self.with_flight(handle, |flight, buffers| {
            flight.set_animation_speed(speed, immediate, buffers);
            flight.is_smoothing()
        });
        match smoothing {
            Some(true) => {
                if !self.smoothing.contains(&handle.slot()) {
                    self.smoothing.push(handle.slot());
                }
                true
            }
            Some(false) => true,
            None => false,
        }
    }

    pub fn set_pane_color(&mut self, handle: Handle, color: Rgb) -> bool {
        self.with_flight(handle, |flight, buffers| flight.set_pane_color(color, buffers))
            .is_some()
    }

    pub fn set_pane_size(&mut self, handle: Handle, size: f32) -> bool {
        self.with_flight(handle, |flight, buffers| flight.set_pane_size(size, buffers))
            .is_some()
    }

    pub fn set_pane_elevation(&mut self, handle: Handle, elevation: f32) -> bool {
        self.with_flight(handle, |flight, buffers| {
            flight.set_pane_elevation(elevation, buffers)
        })
        .is_some()
    }

    pub fn set_curve_color(&mut self, handle: Handle, color: PathColor) -> bool {
        self.with_flight(handle, |flight, buffers| flight.set_curve_color(color, buffers))
            .is_some()
    }

    /// Reroutes a flight. Points that cannot form a curve leave it untouched.
    pub fn set_control_points(&mut self, handle: Handle, points: &[Vec3]) -> bool {
        let Some(control) = normalize_control_points(
            points,
            self.config.profile.radius,
            self.config.min_altitude(),
        ) else {
            return false;
        };
        self.with_flight(handle, |flight, buffers| {
            flight.set_control_points(control, buffers)
        })
        .is_some()
    }

    pub fn return_mode(&self) -> bool {
        self.return_mode
    }

    /// Turns round trips on or off for every flight. Turning off lets returning panes land
    /// first; see [`PaneAnimator::set_return_mode`].
    pub fn set_return_mode(&mut self, enabled: bool) {
        if enabled == self.return_mode {
            return;
        }
        self.return_mode = enabled;
        self.panes.set_return_mode(enabled);
        for flight in self.flights.iter_mut().flatten() {
            flight.set_return_flight(enabled);
        }
        debug!(
            enabled,
            draining = self.panes.is_draining(),
            "return mode requested"
        );
    }

    pub fn set_dash_pattern(&mut self, dash: f32, gap: f32) -> bool {
        self.paths.set_dash_pattern(dash, gap)
    }

    /// Runs one frame: advance time and reconcile, ease speeds, flush dirty ranges.
    pub fn frame(&mut self, dt_s: f64, sink: &mut dyn BufferSink) -> FrameReport {
        let tick = self.clock.tick(dt_s);
        let was_enabled = self.panes.return_mode_enabled();
        self.panes.update(tick.dt_s);
        if was_enabled && !self.panes.return_mode_enabled() {
            debug!(frame = tick.index, "return mode drained");
        }

        let mut buffers = FlightBuffers {
            paths: &mut self.paths,
            panes: &mut self.panes,
        };
        let flights = &mut self.flights;
        self.smoothing.retain(|&slot| match flights[slot].as_mut() {
            Some(flight) => flight.update(tick.dt_s, &mut buffers),
            None => false,
        });

        let uploads = self
            .paths
            .apply_updates(sink)
            .merge(self.panes.apply_updates(sink));

        let m = &mut self.metrics;
        m.inc_counter("frames", 1);
        m.inc_counter("uploads.writes", u64::from(uploads.writes));
        m.inc_counter("uploads.bytes", uploads.bytes);
        m.record("frame.upload_writes", u64::from(uploads.writes));
        m.record("frame.upload_bytes", uploads.bytes);
        m.set_gauge("flights.live", self.pool.len() as i64);
        m.set_gauge(
            "return_mode.enabled",
            i64::from(self.panes.return_mode_enabled()),
        );
        m.set_gauge("return_mode.draining", self.panes.draining_count() as i64);

        FrameReport {
            tick,
            uploads,
            path_vertices: self.paths.draw_range(),
            pane_instances: self.panes.instance_range().end,
        }
    }
}

impl Layer for FlightsLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn frame(&mut self, dt_s: f64, sink: &mut dyn BufferSink) -> FrameReport {
        FlightsLayer::frame(self, dt_s, sink)
    }
}

fn random_geo<R: Rng + ?Sized>(rng: &mut R) -> GeoPoint {
    let (lo, hi) = RANDOM_LATITUDE;
    GeoPoint::new(rng.gen_range(lo..=hi), rng.gen_range(-180.0..180.0))
}
