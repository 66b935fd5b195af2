//! Flights on the globe: configuration, per-flight units and the layer that drives them.

pub mod config;
pub mod flight;
pub mod flights;
pub mod layer;

pub use config::{ConfigError, FlightsConfig};
pub use flight::{Flight, FlightBuffers, FlightStyle};
pub use flights::FlightsLayer;
pub use layer::*;
