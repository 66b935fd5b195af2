//! Packed GPU-side state for flight paths and animated panes.
//!
//! Everything above the `wgpu` feature is plain CPU code: fixed-capacity attribute mirrors
//! with dirty ranges, flushed through a [`BufferSink`] once per frame.

pub mod atlas;
pub mod buffers;
pub mod eval;
pub mod motion;
pub mod packing;
pub mod panes;
pub mod path_batch;
pub mod return_mode;
pub mod shaders;
pub mod upload;

#[cfg(feature = "wgpu")]
pub mod renderer;

pub use atlas::{AtlasLayout, AtlasProvider};
pub use buffers::AttributeBuffer;
pub use eval::{PaneSample, TiltMode};
pub use motion::Motion;
pub use panes::{PaneAnimator, PaneAnimatorConfig};
pub use path_batch::{BatchedPathRenderer, DashPattern, PathBatchConfig, PathColor};
pub use return_mode::{PaneReturnState, ReturnMode};
pub use upload::{BufferSink, BufferTarget, RecordingSink, UploadStats};
