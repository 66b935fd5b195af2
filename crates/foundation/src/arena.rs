use crate::handles::Handle;

/// Fixed-capacity slot allocator.
///
/// Slots are never grown or shrunk after construction; releasing a slot bumps its
/// generation so stale handles are rejected. Freed slots are reused lowest-index first,
/// which keeps live slots packed toward the front of the GPU buffers.
#[derive(Debug, Clone)]
pub struct SlotPool {
    generations: Vec<u32>,
    live: Vec<bool>,
    free: Vec<u32>,
}

impl SlotPool {
    pub fn with_capacity(capacity: usize) -> Self {
        SlotPool {
            generations: vec![0; capacity],
            live: vec![false; capacity],
            // Popped from the back, so store in descending order.
            free: (0..capacity as u32).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.live.len()
    }

    pub fn len(&self) -> usize {
        self.capacity() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    pub fn alloc(&mut self) -> Option<Handle> {
        let index = self.free.pop()?;
        self.live[index as usize] = true;
        Some(Handle::new(index, self.generations[index as usize]))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        let i = handle.slot();
        i < self.live.len() && self.live[i] && self.generations[i] == handle.generation()
    }

    /// Releases `handle`; returns `false` for stale or unknown handles.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        let i = handle.slot();
        self.live[i] = false;
        self.generations[i] = self.generations[i].wrapping_add(1);
        // Keep the free list sorted descending so the lowest index pops first.
        let pos = self
            .free
            .iter()
            .position(|&f| f < handle.index())
            .unwrap_or(self.free.len());
        self.free.insert(pos, handle.index());
        true
    }

    /// One past the highest live index (0 when empty).
    pub fn high_water_mark(&self) -> usize {
        self.live.iter().rposition(|l| *l).map(|i| i + 1).unwrap_or(0)
    }

    pub fn iter_live(&self) -> impl Iterator<Item = Handle> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter(|(_, l)| **l)
            .map(|(i, _)| Handle::new(i as u32, self.generations[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::SlotPool;

    #[test]
    fn allocates_lowest_index_first() {
        let mut pool = SlotPool::with_capacity(3);
        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.high_water_mark(), 2);
    }

    #[test]
    fn release_bumps_generation_and_reuses_slot() {
        let mut pool = SlotPool::with_capacity(3);
        let a = pool.alloc().unwrap();
        let _b = pool.alloc().unwrap();
        assert!(pool.release(a));
        assert!(!pool.release(a), "double release must be rejected");
        assert!(!pool.contains(a));

        let c = pool.alloc().unwrap();
        assert_eq!(c.index(), 0);
        assert_eq!(c.generation(), a.generation() + 1);
    }

    #[test]
    fn exhausts_at_capacity() {
        let mut pool = SlotPool::with_capacity(1);
        assert!(pool.alloc().is_some());
        assert!(pool.is_full());
        assert!(pool.alloc().is_none());
    }

    #[test]
    fn high_water_mark_tracks_highest_live() {
        let mut pool = SlotPool::with_capacity(4);
        let handles: Vec<_> = (0..3).map(|_| pool.alloc().unwrap()).collect();
        pool.release(handles[2]);
        assert_eq!(pool.high_water_mark(), 2);
        pool.release(handles[0]);
        assert_eq!(pool.high_water_mark(), 2);
        assert_eq!(pool.iter_live().count(), 1);
    }
}
