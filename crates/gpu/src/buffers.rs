use std::ops::Range;

use bytemuck::Pod;

/// Fixed-length CPU mirror of one GPU attribute buffer.
///
/// Writes accumulate into a single dirty element range (the union of everything touched
/// since the last flush), so a frame with many small edits still uploads once.
#[derive(Debug, Clone)]
pub struct AttributeBuffer<T: Pod> {
    data: Vec<T>,
    dirty: Option<Range<usize>>,
}

impl<T: Pod> AttributeBuffer<T> {
    pub const STRIDE: usize = std::mem::size_of::<T>();

    pub fn zeroed(len: usize) -> Self {
        Self::filled(len, T::zeroed())
    }

    pub fn filled(len: usize, value: T) -> Self {
        Self {
            data: vec![value; len],
            dirty: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn byte_len(&self) -> u64 {
        (self.data.len() * Self::STRIDE) as u64
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Sets one element. Returns `false` (and changes nothing) when out of range.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        let Some(slot) = self.data.get_mut(index) else {
            return false;
        };
        *slot = value;
        self.mark_dirty(index..index + 1);
        true
    }

    /// Updates one element in place.
    pub fn update(&mut self, index: usize, f: impl FnOnce(&mut T)) -> bool {
        let Some(slot) = self.data.get_mut(index) else {
            return false;
        };
        f(slot);
        self.mark_dirty(index..index + 1);
        true
    }

    /// Copies `values` starting at `start`. Out-of-range writes are rejected whole.
    pub fn write(&mut self, start: usize, values: &[T]) -> bool {
        let end = start + values.len();
        if end > self.data.len() {
            return false;
        }
        self.data[start..end].copy_from_slice(values);
        self.mark_dirty(start..end);
        true
    }

    pub fn fill(&mut self, range: Range<usize>, value: T) -> bool {
        if range.end > self.data.len() || range.start > range.end {
            return false;
        }
        self.data[range.clone()].fill(value);
        self.mark_dirty(range);
        true
    }

    pub fn mark_dirty(&mut self, range: Range<usize>) {
        let range = range.start.min(self.data.len())..range.end.min(self.data.len());
        if range.is_empty() {
            return;
        }
        self.dirty = Some(match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        });
    }

    pub fn dirty_range(&self) -> Option<Range<usize>> {
        self.dirty.clone()
    }

    /// Clears the dirty range without uploading.
    pub fn discard_dirty(&mut self) {
        self.dirty = None;
    }

    /// Takes the dirty range, returning its byte offset and bytes.
    pub fn take_dirty(&mut self) -> Option<(u64, &[u8])> {
        let range = self.dirty.take()?;
        let offset = (range.start * Self::STRIDE) as u64;
        Some((offset, bytemuck::cast_slice(&self.data[range])))
    }
}

#[cfg(test)]
mod tests {
    use super::AttributeBuffer;

    #[test]
    fn dirty_ranges_merge() {
        let mut buf = AttributeBuffer::<f32>::zeroed(10);
        assert!(buf.set(2, 1.0));
        assert!(buf.write(6, &[3.0, 4.0]));
        assert_eq!(buf.dirty_range(), Some(2..8));

        let (offset, bytes) = buf.take_dirty().unwrap();
        assert_eq!(offset, 8);
        assert_eq!(bytes.len(), 6 * 4);
        assert_eq!(buf.dirty_range(), None);
    }

    #[test]
    fn out_of_range_writes_are_rejected() {
        let mut buf = AttributeBuffer::<[f32; 3]>::zeroed(2);
        assert!(!buf.set(2, [1.0; 3]));
        assert!(!buf.write(1, &[[1.0; 3], [2.0; 3]]));
        assert!(!buf.fill(1..3, [1.0; 3]));
        assert_eq!(buf.dirty_range(), None);
        assert_eq!(buf.as_slice(), &[[0.0; 3]; 2]);
    }

    #[test]
    fn mark_dirty_clamps_to_len() {
        let mut buf = AttributeBuffer::<f32>::zeroed(4);
        buf.mark_dirty(2..100);
        assert_eq!(buf.dirty_range(), Some(2..4));
        buf.discard_dirty();
        buf.mark_dirty(7..9);
        assert_eq!(buf.dirty_range(), None);
    }
}
