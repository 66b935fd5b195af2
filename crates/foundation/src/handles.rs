/// Generational handle: a slot index plus the generation it was issued in.
///
/// A handle goes stale once its slot is released; comparing generations catches
/// callers that hold on to a handle after removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn slot(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}
