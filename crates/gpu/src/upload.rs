use bytemuck::Pod;

use crate::buffers::AttributeBuffer;

/// Every GPU buffer the two renderers write into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferTarget {
    PathPositions,
    PathColors,
    PathArcLengths,
    PathUniforms,
    PaneControlPoints,
    PaneColors,
    PaneScales,
    PaneElevations,
    PaneUvRects,
    PaneAnimation,
    PaneUniforms,
}

/// Receives byte-range writes during a flush.
///
/// Implemented by the wgpu backend on top of `Queue::write_buffer`; tests and the headless
/// tools use [`RecordingSink`].
pub trait BufferSink {
    fn write(&mut self, target: BufferTarget, byte_offset: u64, bytes: &[u8]);
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub writes: u32,
    pub bytes: u64,
}

impl UploadStats {
    pub fn merge(self, other: UploadStats) -> UploadStats {
        UploadStats {
            writes: self.writes + other.writes,
            bytes: self.bytes + other.bytes,
        }
    }
}

pub(crate) fn flush_buffer<T: Pod>(
    buffer: &mut AttributeBuffer<T>,
    target: BufferTarget,
    sink: &mut dyn BufferSink,
    stats: &mut UploadStats,
) {
    if let Some((offset, bytes)) = buffer.take_dirty() {
        stats.writes += 1;
        stats.bytes += bytes.len() as u64;
        sink.write(target, offset, bytes);
    }
}

pub(crate) fn flush_uniform<T: Pod>(
    value: &T,
    target: BufferTarget,
    sink: &mut dyn BufferSink,
    stats: &mut UploadStats,
) {
    let bytes = bytemuck::bytes_of(value);
    stats.writes += 1;
    stats.bytes += bytes.len() as u64;
    sink.write(target, 0, bytes);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub target: BufferTarget,
    pub byte_offset: u64,
    pub len: usize,
}

/// Sink that only records what would have been uploaded.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    writes: Vec<RecordedWrite>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    pub fn writes_to(&self, target: BufferTarget) -> impl Iterator<Item = &RecordedWrite> {
        self.writes.iter().filter(move |w| w.target == target)
    }

    pub fn total_bytes(&self) -> u64 {
        self.writes.iter().map(|w| w.len as u64).sum()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl BufferSink for RecordingSink {
    fn write(&mut self, target: BufferTarget, byte_offset: u64, bytes: &[u8]) {
        self.writes.push(RecordedWrite {
            target,
            byte_offset,
            len: bytes.len(),
        });
    }
}
