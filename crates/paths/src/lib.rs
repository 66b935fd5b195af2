//! Control-point generation for animated paths.
//!
//! Everything here produces plain `Vec3` sequences; [`normalize_control_points`] turns any of
//! them into the fixed four-point form both renderers consume.

pub mod normalize;
pub mod parabolic;
pub mod random;
pub mod route;

pub use normalize::*;
pub use parabolic::*;
pub use random::*;
pub use route::*;
