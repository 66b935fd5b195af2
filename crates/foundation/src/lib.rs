pub mod arena;
pub mod bounds;
pub mod color;
pub mod curve;
pub mod handles;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use arena::*;
pub use bounds::*;
pub use color::*;
pub use curve::*;
pub use handles::*;
pub use time::*;
