//! All flight paths in one line-list buffer, drawn with one call.
//!
//! Each curve owns a fixed vertex range `[index * vpc, (index + 1) * vpc)` where
//! `vpc = segments_per_curve * 2`. Only a contiguous prefix of curves is ever drawn.

use std::ops::Range;

use foundation::color::Rgb;
use foundation::curve::CatmullRom;
use foundation::math::{GeoPoint, Vec3};
use tracing::warn;

use crate::buffers::AttributeBuffer;
use crate::packing::{PathUniforms, flag};
use crate::upload::{BufferSink, BufferTarget, UploadStats, flush_buffer, flush_uniform};

/// Lightness at the departure and arrival ends of a gradient path.
pub const GRADIENT_LIGHTNESS: (f32, f32) = (0.7, 0.35);
/// Saturation at the equator and at the poles for gradient paths.
pub const GRADIENT_SATURATION: (f32, f32) = (0.45, 0.95);

pub const DEFAULT_PATH_COLOR: Rgb = Rgb::new(0.4, 0.75, 1.0);

/// How a path is colored.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathColor {
    Solid(Rgb),
    /// Hue/saturation keyed by the departure coordinate, lightness fading along the path.
    Gradient { departure: GeoPoint },
}

impl PathColor {
    /// Marker string that selects a gradient in [`PathColor::from_spec`].
    pub const GRADIENT_MARKER: &'static str = "gradient";

    /// Parses a color spec: a hex color, or the gradient marker plus a departure point.
    ///
    /// A gradient marker without a departure, or an unparseable color, yields `fallback`.
    pub fn from_spec(spec: &str, departure: Option<GeoPoint>, fallback: Rgb) -> Self {
        if spec.trim().eq_ignore_ascii_case(Self::GRADIENT_MARKER) {
            return match departure {
                Some(departure) => PathColor::Gradient { departure },
                None => PathColor::Solid(fallback),
            };
        }
        PathColor::Solid(Rgb::from_hex_or(spec, fallback))
    }

    /// Color at normalized arc position `u ∈ [0, 1]`.
    pub fn color_at(&self, u: f32) -> Rgb {
        match *self {
            PathColor::Solid(rgb) => rgb.sanitized(DEFAULT_PATH_COLOR),
            PathColor::Gradient { departure } => {
                if !departure.lat.is_finite() || !departure.lng.is_finite() {
                    return DEFAULT_PATH_COLOR;
                }
                let hue = ((departure.lng + 180.0).rem_euclid(360.0) / 360.0) as f32;
                let lat_ratio = (departure.lat.abs() / 90.0).clamp(0.0, 1.0) as f32;
                let (s0, s1) = GRADIENT_SATURATION;
                let (l0, l1) = GRADIENT_LIGHTNESS;
                let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
                Rgb::from_hsl(hue, s0 + (s1 - s0) * lat_ratio, l0 + (l1 - l0) * u)
            }
        }
    }
}

/// Dash/gap lengths in world units along the path. Either being zero means solid.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct DashPattern {
    pub dash: f32,
    pub gap: f32,
}

impl DashPattern {
    pub fn new(dash: f32, gap: f32) -> Self {
        let clean = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self {
            dash: clean(dash),
            gap: clean(gap),
        }
    }

    pub fn solid() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.dash > 0.0 && self.gap > 0.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathBatchConfig {
    pub max_curves: usize,
    pub segments_per_curve: usize,
    pub dash: DashPattern,
    pub opacity: f32,
}

impl Default for PathBatchConfig {
    fn default() -> Self {
        Self {
            max_curves: 1024,
            segments_per_curve: 64,
            dash: DashPattern::solid(),
            opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
struct PathSlot {
    points: Vec<Vec3>,
    color: PathColor,
    visible: bool,
}

impl Default for PathSlot {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            color: PathColor::Solid(DEFAULT_PATH_COLOR),
            visible: false,
        }
    }
}

pub struct BatchedPathRenderer {
    max_curves: usize,
    segments_per_curve: usize,
    slots: Vec<PathSlot>,
    positions: AttributeBuffer<[f32; 3]>,
    colors: AttributeBuffer<[f32; 3]>,
    arc_lengths: AttributeBuffer<f32>,
    dash: DashPattern,
    opacity: f32,
    material_dirty: bool,
    material_version: u64,
    highest_curve: usize,
    visible_curve_count: usize,
}

impl BatchedPathRenderer {
    pub fn new(config: PathBatchConfig) -> Self {
        let segments_per_curve = config.segments_per_curve.max(1);
        let vertex_capacity = config.max_curves * segments_per_curve * 2;
        Self {
            max_curves: config.max_curves,
            segments_per_curve,
            slots: vec![PathSlot::default(); config.max_curves],
            positions: AttributeBuffer::zeroed(vertex_capacity),
            colors: AttributeBuffer::zeroed(vertex_capacity),
            arc_lengths: AttributeBuffer::zeroed(vertex_capacity),
            dash: config.dash,
            opacity: config.opacity,
            material_dirty: true,
            material_version: 0,
            highest_curve: 0,
            visible_curve_count: 0,
        }
    }

    pub fn max_curves(&self) -> usize {
        self.max_curves
    }

    pub fn segments_per_curve(&self) -> usize {
        self.segments_per_curve
    }

    pub fn vertices_per_curve(&self) -> usize {
        self.segments_per_curve * 2
    }

    pub fn vertex_capacity(&self) -> usize {
        self.positions.len()
    }

    fn vertex_range(&self, index: usize) -> Range<usize> {
        let vpc = self.vertices_per_curve();
        index * vpc..(index + 1) * vpc
    }

    fn check_index(&self, op: &str, index: usize) -> bool {
        if index >= self.max_curves {
            warn!(op, index, max_curves = self.max_curves, "path index out of range");
            return false;
        }
        true
    }

    /// Samples `points` into slot `index` and makes it visible.
    pub fn set_curve(&mut self, index: usize, points: &[Vec3], color: PathColor) {
        if !self.check_index("set_curve", index) {
            return;
        }
        if points.len() < 2 {
            warn!(index, count = points.len(), "set_curve needs at least 2 points");
            return;
        }

        let samples = CatmullRom::new(points).sample(self.segments_per_curve + 1);
        let vpc = self.vertices_per_curve();
        let mut positions = Vec::with_capacity(vpc);
        let mut arcs = Vec::with_capacity(vpc);
        let mut travelled = 0.0f64;
        for pair in samples.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            positions.push(a.to_f32());
            arcs.push(travelled as f32);
            travelled += a.distance(b);
            positions.push(b.to_f32());
            arcs.push(travelled as f32);
        }

        let start = self.vertex_range(index).start;
        self.positions.write(start, &positions);
        self.arc_lengths.write(start, &arcs);

        let slot = &mut self.slots[index];
        slot.points = points.to_vec();
        slot.color = color;
        slot.visible = true;
        self.write_colors(index);

        if index + 1 > self.highest_curve {
            self.highest_curve = index + 1;
            self.set_visible_curve_count(self.highest_curve);
        }
    }

    /// Recolors a visible slot in place; hidden slots are left alone.
    pub fn set_curve_color(&mut self, index: usize, color: PathColor) {
        if !self.check_index("set_curve_color", index) {
            return;
        }
        if !self.slots[index].visible {
            return;
        }
        self.slots[index].color = color;
        self.write_colors(index);
    }

    fn write_colors(&mut self, index: usize) {
        let range = self.vertex_range(index);
        let color = self.slots[index].color;
        let arcs = &self.arc_lengths.as_slice()[range.clone()];
        let total = arcs.last().copied().unwrap_or(0.0);
        let colors: Vec<[f32; 3]> = arcs
            .iter()
            .map(|&arc| {
                let u = if total > 0.0 { arc / total } else { 0.0 };
                color.color_at(u).to_array()
            })
            .collect();
        self.colors.write(range.start, &colors);
    }

    /// Collapses the slot's geometry. The draw range is not touched.
    pub fn hide_curve(&mut self, index: usize) {
        if !self.check_index("hide_curve", index) {
            return;
        }
        if !self.slots[index].visible {
            return;
        }
        let range = self.vertex_range(index);
        self.positions.fill(range.clone(), [0.0; 3]);
        self.arc_lengths.fill(range, 0.0);
        let slot = &mut self.slots[index];
        slot.visible = false;
        slot.points.clear();
    }

    /// Draws the first `count` curve slots (clamped to capacity).
    pub fn set_visible_curve_count(&mut self, count: usize) {
        self.visible_curve_count = count.min(self.max_curves);
    }

    pub fn visible_curve_count(&self) -> usize {
        self.visible_curve_count
    }

    pub fn visible_vertex_count(&self) -> usize {
        self.visible_curve_count * self.vertices_per_curve()
    }

    /// Vertex range for the single line-list draw call.
    pub fn draw_range(&self) -> Range<u32> {
        0..self.visible_vertex_count() as u32
    }

    /// Returns `true` when the material changed and has to be rebuilt.
    pub fn set_dash_pattern(&mut self, dash: f32, gap: f32) -> bool {
        let next = DashPattern::new(dash, gap);
        if next == self.dash {
            return false;
        }
        let was_active = self.dash.is_active();
        self.dash = next;
        self.material_dirty = true;
        self.material_version += 1;
        if next.is_active() && !was_active {
            // Arc lengths were not uploaded while solid.
            let end = self.highest_curve * self.vertices_per_curve();
            self.arc_lengths.mark_dirty(0..end);
        }
        true
    }

    pub fn dash_pattern(&self) -> DashPattern {
        self.dash
    }

    /// Bumped every time the dash pattern changes. Each bump is followed by one
    /// path uniform upload on the next flush.
    pub fn material_version(&self) -> u64 {
        self.material_version
    }

    pub fn uniforms(&self) -> PathUniforms {
        PathUniforms {
            dash_size: self.dash.dash,
            gap_size: self.dash.gap,
            dashed: flag(self.dash.is_active()),
            opacity: self.opacity,
        }
    }

    /// Uploads everything touched since the last call. Call once per frame.
    pub fn apply_updates(&mut self, sink: &mut dyn BufferSink) -> UploadStats {
        let mut stats = UploadStats::default();
        flush_buffer(&mut self.positions, BufferTarget::PathPositions, sink, &mut stats);
        flush_buffer(&mut self.colors, BufferTarget::PathColors, sink, &mut stats);
        if self.dash.is_active() {
            flush_buffer(&mut self.arc_lengths, BufferTarget::PathArcLengths, sink, &mut stats);
        } else {
            self.arc_lengths.discard_dirty();
        }
        if self.material_dirty {
            let uniforms = self.uniforms();
            flush_uniform(&uniforms, BufferTarget::PathUniforms, sink, &mut stats);
            self.material_dirty = false;
        }
        stats
    }

    pub fn is_curve_visible(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.visible)
    }

    pub fn curve_color(&self, index: usize) -> Option<PathColor> {
        self.slots.get(index).filter(|s| s.visible).map(|s| s.color)
    }

    pub fn curve_points(&self, index: usize) -> Option<&[Vec3]> {
        self.slots
            .get(index)
            .filter(|s| s.visible)
            .map(|s| s.points.as_slice())
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        self.positions.as_slice()
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        self.colors.as_slice()
    }

    pub fn arc_lengths(&self) -> &[f32] {
        self.arc_lengths.as_slice()
    }

    pub fn curve_positions(&self, index: usize) -> Option<&[[f32; 3]]> {
        (index < self.max_curves).then(|| &self.positions.as_slice()[self.vertex_range(index)])
    }

    pub fn curve_arc_lengths(&self, index: usize) -> Option<&[f32]> {
        (index < self.max_curves).then(|| &self.arc_lengths.as_slice()[self.vertex_range(index)])
    }

    pub fn curve_colors(&self, index: usize) -> Option<&[[f32; 3]]> {
        (index < self.max_curves).then(|| &self.colors.as_slice()[self.vertex_range(index)])
    }
}
