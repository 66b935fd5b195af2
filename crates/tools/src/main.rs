use std::path::PathBuf;

use clap::Parser;
use layers::FlightsConfig;
use tools::{SimError, SimOptions, SpawnMode, load_routes, run};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless flight animation run with upload accounting")]
struct Args {
    /// JSON config file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of flights to spawn
    #[arg(long, default_value_t = 100)]
    flights: usize,

    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Fixed frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// RNG seed for routes, speeds and phases
    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = SpawnMode::Routes)]
    mode: SpawnMode,

    /// JSON array of routes to cycle through instead of random airports
    #[arg(long)]
    routes: Option<PathBuf>,

    /// Start with round trips on
    #[arg(long)]
    return_mode: bool,

    /// Flip return mode before this frame
    #[arg(long)]
    toggle_return_at: Option<u64>,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), SimError> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FlightsConfig::from_path(path)?,
        None => FlightsConfig::default(),
    };
    let routes = args.routes.as_deref().map(load_routes).transpose()?;

    let opts = SimOptions {
        flights: args.flights,
        frames: args.frames,
        dt: args.dt,
        seed: args.seed,
        mode: args.mode,
        return_mode: args.return_mode.then_some(true),
        toggle_return_at: args.toggle_return_at,
    };
    let summary = run(config, routes.as_deref(), &opts)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{json}");
    Ok(())
}
