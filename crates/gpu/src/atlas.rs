use crate::packing::{FULL_UV_RECT, PackedUvRect};

/// Grid layout of a pane texture atlas.
///
/// Slots are numbered row-major from the top-left. Rects use a bottom-left UV origin, so
/// row 0 sits at the top of the `[0, 1]` range; the pane shader flips into texture space.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AtlasLayout {
    pub columns: u32,
    pub rows: u32,
    pub slot_count: u32,
}

impl AtlasLayout {
    pub fn new(columns: u32, rows: u32, slot_count: u32) -> Self {
        Self {
            columns,
            rows,
            slot_count,
        }
    }

    /// A single image covering the whole texture.
    pub fn single() -> Self {
        Self::new(1, 1, 1)
    }

    pub fn is_valid(&self) -> bool {
        self.columns > 0 && self.rows > 0 && self.slot_count > 0
    }

    /// UV rectangle of slot `index`, wrapping modulo the slot count.
    ///
    /// An invalid layout maps everything to the full texture.
    pub fn uv_rect(&self, index: i64) -> PackedUvRect {
        if !self.is_valid() {
            return FULL_UV_RECT;
        }
        let slot = index.rem_euclid(self.slot_count as i64) as u32;
        let column = slot % self.columns;
        // Slot counts beyond columns × rows wrap back to row 0.
        let row = (slot / self.columns) % self.rows;

        let scale_x = 1.0 / self.columns as f32;
        let scale_y = 1.0 / self.rows as f32;
        let offset_x = column as f32 * scale_x;
        let offset_y = 1.0 - (row + 1) as f32 * scale_y;
        [offset_x, offset_y, scale_x, scale_y]
    }
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self::single()
    }
}

/// Supplies the atlas layout; the atlas itself is rasterized elsewhere.
pub trait AtlasProvider {
    fn layout(&self) -> AtlasLayout;
}

impl AtlasProvider for AtlasLayout {
    fn layout(&self) -> AtlasLayout {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::AtlasLayout;
    use crate::packing::FULL_UV_RECT;

    #[test]
    fn first_slot_is_top_left() {
        let atlas = AtlasLayout::new(4, 2, 8);
        assert_eq!(atlas.uv_rect(0), [0.0, 0.5, 0.25, 0.5]);
    }

    #[test]
    fn slots_advance_row_major() {
        let atlas = AtlasLayout::new(4, 2, 8);
        assert_eq!(atlas.uv_rect(3), [0.75, 0.5, 0.25, 0.5]);
        assert_eq!(atlas.uv_rect(5), [0.25, 0.0, 0.25, 0.5]);
    }

    #[test]
    fn index_wraps_modulo_slot_count() {
        let atlas = AtlasLayout::new(4, 2, 6);
        assert_eq!(atlas.uv_rect(6), atlas.uv_rect(0));
        assert_eq!(atlas.uv_rect(-1), atlas.uv_rect(5));
    }

    #[test]
    fn invalid_layout_uses_full_rect() {
        assert_eq!(AtlasLayout::new(0, 2, 4).uv_rect(1), FULL_UV_RECT);
        assert_eq!(AtlasLayout::new(2, 2, 0).uv_rect(1), FULL_UV_RECT);
    }
}
