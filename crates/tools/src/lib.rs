//! Headless flight runs: spawn a seeded set of flights, step frames, count uploads.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gpu::upload::{BufferSink, BufferTarget};
use layers::{ConfigError, FlightsConfig, FlightsLayer, LayerId};
use paths::Route;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runtime::MetricsSnapshot;
use serde::Serialize;
use tracing::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("read routes {}: {source}", path.display())]
    Routes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum SpawnMode {
    /// Parabolic flights between airports (random, or from a routes file).
    Routes,
    /// Wandering random curves.
    Curves,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimOptions {
    pub flights: usize,
    pub frames: u64,
    pub dt: f64,
    pub seed: u64,
    pub mode: SpawnMode,
    /// Overrides the configured return mode.
    pub return_mode: Option<bool>,
    /// Frame index at which return mode is flipped.
    pub toggle_return_at: Option<u64>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            flights: 100,
            frames: 600,
            dt: 1.0 / 60.0,
            seed: 1,
            mode: SpawnMode::Routes,
            return_mode: None,
            toggle_return_at: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetCount {
    pub writes: u64,
    pub bytes: u64,
}

/// Sink that only tallies writes per buffer.
#[derive(Debug, Default, Clone)]
pub struct CountingSink {
    targets: BTreeMap<BufferTarget, TargetCount>,
}

impl CountingSink {
    pub fn get(&self, target: BufferTarget) -> TargetCount {
        self.targets.get(&target).copied().unwrap_or_default()
    }

    pub fn total(&self) -> TargetCount {
        self.targets
            .values()
            .fold(TargetCount::default(), |acc, c| TargetCount {
                writes: acc.writes + c.writes,
                bytes: acc.bytes + c.bytes,
            })
    }

    pub fn by_name(&self) -> BTreeMap<String, TargetCount> {
        self.targets
            .iter()
            .map(|(t, c)| (format!("{t:?}"), *c))
            .collect()
    }
}

impl BufferSink for CountingSink {
    fn write(&mut self, target: BufferTarget, _byte_offset: u64, bytes: &[u8]) {
        let c = self.targets.entry(target).or_default();
        c.writes += 1;
        c.bytes += bytes.len() as u64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSummary {
    pub preferred: bool,
    pub enabled: bool,
    pub draining: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub seed: u64,
    pub frames: u64,
    pub time_s: f64,
    pub flights: usize,
    pub return_mode: ReturnSummary,
    pub path_vertices: [u32; 2],
    pub pane_instances: u32,
    pub uploads: BTreeMap<String, TargetCount>,
    pub metrics: MetricsSnapshot,
}

/// Reads a JSON array of `{ "departure": {lat, lng}, "arrival": {lat, lng} }`.
pub fn load_routes(path: &Path) -> Result<Vec<Route>, SimError> {
    let text = fs::read_to_string(path).map_err(|source| SimError::Routes {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

pub fn run(
    mut config: FlightsConfig,
    routes: Option<&[Route]>,
    opts: &SimOptions,
) -> Result<Summary, SimError> {
    if let Some(enabled) = opts.return_mode {
        config.return_mode = enabled;
    }
    let mut layer = FlightsLayer::new(LayerId(1), config)?;
    let mut rng = StdRng::seed_from_u64(opts.seed);

    let spawned = spawn(&mut layer, &mut rng, routes, opts);
    if spawned < opts.flights {
        warn!(
            spawned,
            requested = opts.flights,
            capacity = layer.capacity(),
            "not every flight could be spawned"
        );
    }
    info!(spawned, mode = ?opts.mode, seed = opts.seed, "flights spawned");

    let mut sink = CountingSink::default();
    for frame in 0..opts.frames {
        if opts.toggle_return_at == Some(frame) {
            let next = !layer.return_mode();
            info!(frame, enabled = next, "toggling return mode");
            layer.set_return_mode(next);
        }
        layer.frame(opts.dt, &mut sink);
    }

    let range = layer.paths().draw_range();
    let panes = layer.panes();
    let total = sink.total();
    info!(
        frames = opts.frames,
        writes = total.writes,
        bytes = total.bytes,
        "run finished"
    );

    Ok(Summary {
        seed: opts.seed,
        frames: layer.clock().frames(),
        time_s: layer.clock().time().0,
        flights: layer.len(),
        return_mode: ReturnSummary {
            preferred: panes.return_mode_preferred(),
            enabled: panes.return_mode_enabled(),
            draining: panes.is_draining(),
        },
        path_vertices: [range.start, range.end],
        pane_instances: panes.active_pane_count() as u32,
        uploads: sink.by_name(),
        metrics: layer.metrics().snapshot(),
    })
}

fn spawn(
    layer: &mut FlightsLayer,
    rng: &mut StdRng,
    routes: Option<&[Route]>,
    opts: &SimOptions,
) -> usize {
    let (lo, hi) = (layer.config().min_speed, layer.config().max_speed);
    let mut spawned = 0;
    for i in 0..opts.flights {
        let handle = match (opts.mode, routes) {
            (SpawnMode::Routes, Some(routes)) if !routes.is_empty() => {
                let speed = rng.gen_range(lo..=hi);
                let phase = rng.gen_range(0.0..1.0);
                layer.spawn_route(&routes[i % routes.len()], speed, phase)
            }
            (SpawnMode::Routes, _) => layer.spawn_random(rng),
            (SpawnMode::Curves, _) => layer.spawn_random_curve(rng),
        };
        if handle.is_none() {
            break;
        }
        spawned += 1;
    }
    spawned
}
