//! Frame timebase and metrics for the animation loop.

pub mod clock;
pub mod metrics;

pub use clock::{FrameClock, FrameTick};
pub use metrics::{Histogram, Metrics, MetricsSnapshot};
