use std::ops::Range;

use gpu::upload::{BufferSink, UploadStats};
use runtime::FrameTick;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// What a layer did in one frame, and what the renderer should draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub tick: FrameTick,
    pub uploads: UploadStats,
    pub path_vertices: Range<u32>,
    pub pane_instances: u32,
}

pub trait Layer {
    fn id(&self) -> LayerId;

    /// Advances the layer by `dt_s` and flushes its dirty buffer ranges into `sink`.
    fn frame(&mut self, dt_s: f64, sink: &mut dyn BufferSink) -> FrameReport;
}
