//! Instanced panes animated along their curves entirely from packed attributes.
//!
//! The host only writes attributes when something changes. Per frame it advances one shared
//! clock and, while a return-mode disable is draining, walks the active instances.

use std::ops::Range;

use foundation::color::Rgb;
use foundation::curve::{CONTROL_POINT_COUNT, ControlPointSet};
use foundation::math::Vec3;
use tracing::warn;

use crate::atlas::{AtlasLayout, AtlasProvider};
use crate::buffers::AttributeBuffer;
use crate::eval::{PaneSample, TiltMode, evaluate_pane};
use crate::motion::{Motion, period};
use crate::packing::{
    ANIM_PHASE, ANIM_SPEED, ANIM_TILT, ANIM_VISIBLE, FULL_UV_RECT, PackedAnimation,
    PackedControlPoints, PackedUvRect, PaneUniforms, flag, is_flag_set,
};
use crate::return_mode::{MotionTable, PaneReturnState, ReturnMode};
use crate::upload::{BufferSink, BufferTarget, UploadStats, flush_buffer, flush_uniform};

pub const DEFAULT_PANE_COLOR: Rgb = Rgb::WHITE;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaneAnimatorConfig {
    pub max_panes: usize,
    pub atlas: AtlasLayout,
    pub default_color: Rgb,
    pub default_scale: f32,
    pub default_elevation: f32,
    pub return_mode: bool,
}

impl Default for PaneAnimatorConfig {
    fn default() -> Self {
        Self {
            max_panes: 1024,
            atlas: AtlasLayout::single(),
            default_color: DEFAULT_PANE_COLOR,
            default_scale: 1.0,
            default_elevation: 0.0,
            return_mode: false,
        }
    }
}

pub struct PaneAnimator {
    max_panes: usize,
    atlas: AtlasLayout,
    default_color: Rgb,
    default_scale: f32,
    default_elevation: f32,

    control_points: AttributeBuffer<PackedControlPoints>,
    colors: AttributeBuffer<[f32; 3]>,
    scales: AttributeBuffer<f32>,
    elevations: AttributeBuffer<f32>,
    uv_rects: AttributeBuffer<PackedUvRect>,
    animation: AttributeBuffer<PackedAnimation>,
    motion: Vec<Motion>,

    global_time: f64,
    active_count: usize,
    return_mode: ReturnMode,
    uniforms_dirty: bool,
}

/// Mutable view handed to the return-mode state machine; phase writes land in both the host
/// motion and the packed animation group.
struct PaneMotion<'a> {
    motion: &'a mut [Motion],
    animation: &'a mut AttributeBuffer<PackedAnimation>,
}

impl MotionTable for PaneMotion<'_> {
    fn motion(&self, index: usize) -> Motion {
        self.motion.get(index).copied().unwrap_or_default()
    }

    fn set_phase(&mut self, index: usize, phase: f64) {
        if let Some(m) = self.motion.get_mut(index) {
            m.phase = phase;
            self.animation.update(index, |a| a[ANIM_PHASE] = phase as f32);
        }
    }

    fn is_visible(&self, index: usize) -> bool {
        self.animation
            .get(index)
            .is_some_and(|a| is_flag_set(a[ANIM_VISIBLE]))
    }
}

impl PaneAnimator {
    pub fn new(config: PaneAnimatorConfig) -> Self {
        let n = config.max_panes;
        let default_color = config.default_color.sanitized(DEFAULT_PANE_COLOR);
        let default_scale = finite_or(config.default_scale, 1.0);
        let default_elevation = finite_or(config.default_elevation, 0.0);
        let mut animator = Self {
            max_panes: n,
            atlas: config.atlas,
            default_color,
            default_scale,
            default_elevation,
            control_points: AttributeBuffer::zeroed(n),
            colors: AttributeBuffer::filled(n, default_color.to_array()),
            scales: AttributeBuffer::filled(n, default_scale),
            elevations: AttributeBuffer::filled(n, default_elevation),
            uv_rects: AttributeBuffer::filled(n, config.atlas.uv_rect(0)),
            animation: AttributeBuffer::zeroed(n),
            motion: vec![Motion::default(); n],
            global_time: 0.0,
            active_count: 0,
            return_mode: ReturnMode::new(config.return_mode),
            uniforms_dirty: true,
        };
        // Non-zero defaults have to reach the GPU on the first flush.
        animator.colors.mark_dirty(0..n);
        animator.scales.mark_dirty(0..n);
        animator.elevations.mark_dirty(0..n);
        animator.uv_rects.mark_dirty(0..n);
        animator
    }

    pub fn max_panes(&self) -> usize {
        self.max_panes
    }

    pub fn global_time(&self) -> f64 {
        self.global_time
    }

    pub fn active_pane_count(&self) -> usize {
        self.active_count
    }

    /// Instances the pane draw covers: every slot up to the active count.
    pub fn instance_range(&self) -> Range<u32> {
        0..self.active_count as u32
    }

    pub fn atlas(&self) -> AtlasLayout {
        self.atlas
    }

    pub fn set_atlas(&mut self, provider: &dyn AtlasProvider) {
        self.atlas = provider.layout();
    }

    fn check_index(&self, op: &str, index: usize) -> bool {
        if index >= self.max_panes {
            warn!(op, index, max_panes = self.max_panes, "pane index out of range");
            return false;
        }
        true
    }

    fn period(&self) -> f64 {
        period(self.return_mode.enabled())
    }

    /// Writes the 12 control-point scalars and marks the pane visible.
    pub fn set_curve_control_points(&mut self, index: usize, points: &[Vec3]) {
        if !self.check_index("set_curve_control_points", index) {
            return;
        }
        let Some(set) = ControlPointSet::from_slice(points) else {
            warn!(
                index,
                count = points.len(),
                needed = CONTROL_POINT_COUNT,
                "not enough control points"
            );
            return;
        };
        self.control_points.set(index, set.pack());
        self.animation.update(index, |a| a[ANIM_VISIBLE] = 1.0);
    }

    /// Sets phase and speed outright. Use [`PaneAnimator::set_animation_speed`] to change
    /// speed without a jump.
    pub fn set_animation_params(&mut self, index: usize, phase: f64, speed: f64) {
        if !self.check_index("set_animation_params", index) {
            return;
        }
        let motion = Motion::new(phase.rem_euclid(self.period()), speed);
        self.write_motion(index, motion);
    }

    /// Changes speed while keeping the pane where it currently is.
    pub fn set_animation_speed(&mut self, index: usize, speed: f64) {
        if !self.check_index("set_animation_speed", index) {
            return;
        }
        let motion = self.motion[index].retimed(self.global_time, speed, self.period());
        self.write_motion(index, motion);
    }

    fn write_motion(&mut self, index: usize, motion: Motion) {
        self.motion[index] = motion;
        self.animation.update(index, |a| {
            a[ANIM_PHASE] = motion.phase as f32;
            a[ANIM_SPEED] = motion.speed as f32;
        });
    }

    /// Cycle position in `[0, period)`: outbound below 1, returning above.
    pub fn progress(&self, index: usize) -> Option<f64> {
        self.motion
            .get(index)
            .map(|m| m.cycle(self.global_time, self.period()))
    }

    pub fn motion(&self, index: usize) -> Option<Motion> {
        self.motion.get(index).copied()
    }

    pub fn set_texture_index(&mut self, index: usize, texture: i64) {
        if !self.check_index("set_texture_index", index) {
            return;
        }
        let rect = if self.atlas.is_valid() {
            self.atlas.uv_rect(texture)
        } else {
            warn!(index, atlas = ?self.atlas, "invalid atlas layout, using full texture");
            FULL_UV_RECT
        };
        self.uv_rects.set(index, rect);
    }

    pub fn set_tilt_mode(&mut self, index: usize, mode: TiltMode) {
        if !self.check_index("set_tilt_mode", index) {
            return;
        }
        self.animation.update(index, |a| a[ANIM_TILT] = mode.as_flag());
    }

    pub fn set_color(&mut self, index: usize, color: Rgb) {
        if !self.check_index("set_color", index) {
            return;
        }
        self.colors
            .set(index, color.sanitized(self.default_color).to_array());
    }

    pub fn set_scale(&mut self, index: usize, scale: f32) {
        if !self.check_index("set_scale", index) {
            return;
        }
        self.scales.set(index, finite_or(scale, self.default_scale));
    }

    pub fn set_elevation(&mut self, index: usize, elevation: f32) {
        if !self.check_index("set_elevation", index) {
            return;
        }
        self.elevations
            .set(index, finite_or(elevation, self.default_elevation));
    }

    /// Clears the visible flag only; every other attribute stays for reuse.
    pub fn hide_pane(&mut self, index: usize) {
        if !self.check_index("hide_pane", index) {
            return;
        }
        if self.is_visible(index) {
            self.animation.update(index, |a| a[ANIM_VISIBLE] = 0.0);
        }
    }

    /// Re-shows a hidden pane with whatever attributes it still holds.
    pub fn show_pane(&mut self, index: usize) {
        if !self.check_index("show_pane", index) {
            return;
        }
        if !self.is_visible(index) {
            self.animation.update(index, |a| a[ANIM_VISIBLE] = 1.0);
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.animation
            .get(index)
            .is_some_and(|a| is_flag_set(a[ANIM_VISIBLE]))
    }

    /// Bounds the instances the return-mode reconciliation looks at.
    pub fn set_active_pane_count(&mut self, count: usize) {
        self.active_count = count.min(self.max_panes);
    }

    /// Advances the shared clock and reconciles return mode. Call once per frame.
    pub fn update(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.global_time += dt;
            self.uniforms_dirty = true;
        }
        let mut table = PaneMotion {
            motion: &mut self.motion,
            animation: &mut self.animation,
        };
        if self
            .return_mode
            .reconcile(self.global_time, self.active_count, &mut table)
        {
            self.uniforms_dirty = true;
        }
    }

    /// Requests round trips on or off. Turning off waits for returning panes to land.
    pub fn set_return_mode(&mut self, enabled: bool) {
        let mut table = PaneMotion {
            motion: &mut self.motion,
            animation: &mut self.animation,
        };
        if self
            .return_mode
            .request(enabled, self.global_time, self.active_count, &mut table)
        {
            self.uniforms_dirty = true;
        }
    }

    pub fn return_mode_enabled(&self) -> bool {
        self.return_mode.enabled()
    }

    pub fn return_mode_preferred(&self) -> bool {
        self.return_mode.preferred()
    }

    pub fn is_draining(&self) -> bool {
        self.return_mode.is_draining()
    }

    /// Panes still finishing a return leg before round trips switch off.
    pub fn draining_count(&self) -> usize {
        self.return_mode.draining_count()
    }

    pub fn return_state(&self, index: usize) -> PaneReturnState {
        self.return_mode.state(index)
    }

    pub fn uniforms(&self) -> PaneUniforms {
        PaneUniforms {
            global_time: self.global_time as f32,
            return_enabled: flag(self.return_mode.enabled()),
            _pad: [0.0; 2],
        }
    }

    /// Uploads every dirty attribute range plus the per-frame uniforms.
    pub fn apply_updates(&mut self, sink: &mut dyn BufferSink) -> UploadStats {
        let mut stats = UploadStats::default();
        flush_buffer(
            &mut self.control_points,
            BufferTarget::PaneControlPoints,
            sink,
            &mut stats,
        );
        flush_buffer(&mut self.colors, BufferTarget::PaneColors, sink, &mut stats);
        flush_buffer(&mut self.scales, BufferTarget::PaneScales, sink, &mut stats);
        flush_buffer(
            &mut self.elevations,
            BufferTarget::PaneElevations,
            sink,
            &mut stats,
        );
        flush_buffer(&mut self.uv_rects, BufferTarget::PaneUvRects, sink, &mut stats);
        flush_buffer(
            &mut self.animation,
            BufferTarget::PaneAnimation,
            sink,
            &mut stats,
        );
        if self.uniforms_dirty {
            let uniforms = self.uniforms();
            flush_uniform(&uniforms, BufferTarget::PaneUniforms, sink, &mut stats);
            self.uniforms_dirty = false;
        }
        stats
    }

    /// Where the shader currently draws pane `index`; `None` when hidden.
    pub fn sample(&self, index: usize) -> Option<PaneSample> {
        if !self.is_visible(index) {
            return None;
        }
        let control = ControlPointSet::unpack(self.control_points.get(index)?);
        let animation = self.animation.get(index)?;
        let elevation = *self.elevations.get(index)?;
        let cycle = self.motion[index].cycle(self.global_time, self.period());
        Some(evaluate_pane(
            &control,
            cycle,
            self.return_mode.enabled(),
            TiltMode::from_flag(animation[ANIM_TILT]),
            elevation as f64,
        ))
    }

    /// Packed control points as 12 scalars, point-major.
    pub fn control_points(&self, index: usize) -> Option<[f32; 12]> {
        self.control_points
            .get(index)
            .map(|packed| bytemuck::cast(*packed))
    }

    pub fn animation(&self, index: usize) -> Option<PackedAnimation> {
        self.animation.get(index).copied()
    }

    pub fn uv_rect(&self, index: usize) -> Option<PackedUvRect> {
        self.uv_rects.get(index).copied()
    }

    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        self.colors.get(index).copied()
    }

    pub fn scale(&self, index: usize) -> Option<f32> {
        self.scales.get(index).copied()
    }

    pub fn elevation(&self, index: usize) -> Option<f32> {
        self.elevations.get(index).copied()
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::{PaneAnimator, PaneAnimatorConfig};
    use crate::atlas::AtlasLayout;
    use crate::eval::TiltMode;
    use crate::packing::{ANIM_PHASE, ANIM_SPEED, ANIM_TILT, ANIM_VISIBLE};
    use crate::return_mode::PaneReturnState;
    use crate::upload::{BufferTarget, RecordingSink};
    use foundation::color::Rgb;
    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn animator(max_panes: usize) -> PaneAnimator {
        PaneAnimator::new(PaneAnimatorConfig {
            max_panes,
            atlas: AtlasLayout::new(4, 2, 8),
            return_mode: true,
            ..PaneAnimatorConfig::default()
        })
    }

    fn control() -> [Vec3; 4] {
        [
            Vec3::new(1.5, -2.0, 3.25),
            Vec3::new(4.0, 5.5, -6.0),
            Vec3::new(7.0, 8.0, 9.5),
            Vec3::new(-10.0, 11.0, 12.0),
        ]
    }

    #[test]
    fn control_points_read_back_exactly() {
        let mut a = animator(4);
        a.set_curve_control_points(3, &control());
        let expected = [
            1.5, -2.0, 3.25, 4.0, 5.5, -6.0, 7.0, 8.0, 9.5, -10.0, 11.0, 12.0,
        ];
        assert_eq!(a.control_points(3), Some(expected));
        assert!(a.is_visible(3));
    }

    #[test]
    fn too_few_control_points_is_a_no_op() {
        let mut a = animator(2);
        a.set_curve_control_points(0, &control()[..3]);
        a.set_curve_control_points(9, &control());
        assert_eq!(a.control_points(0), Some([0.0; 12]));
        assert!(!a.is_visible(0));
    }

    #[test]
    fn speed_change_is_continuous() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut a = animator(1);
        a.set_curve_control_points(0, &control());
        for _ in 0..200 {
            a.update(rng.gen_range(0.0..50.0));
            a.set_animation_params(0, rng.gen_range(0.0..2.0), rng.gen_range(-1.0..1.0));
            let before = a.progress(0).unwrap();
            a.set_animation_speed(0, rng.gen_range(-1.0..1.0));
            let after = a.progress(0).unwrap();
            let diff = (before - after).abs();
            assert!(diff.min(2.0 - diff) < 1e-4, "{before} vs {after}");
        }
    }

    #[test]
    fn speed_change_writes_packed_group() {
        let mut a = animator(1);
        a.set_animation_params(0, 0.25, 0.5);
        a.update(1.0);
        a.set_animation_speed(0, 0.25);
        let anim = a.animation(0).unwrap();
        assert_eq!(anim[ANIM_SPEED], 0.25);
        // progress 0.75 at t = 1 => phase 0.5
        assert!((anim[ANIM_PHASE] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn texture_index_maps_through_atlas() {
        let mut a = animator(1);
        a.set_texture_index(0, 13);
        assert_eq!(a.uv_rect(0), Some([0.25, 0.0, 0.25, 0.5]));
    }

    #[test]
    fn hide_keeps_attributes() {
        let mut a = animator(1);
        a.set_curve_control_points(0, &control());
        a.set_color(0, Rgb::new(0.2, 0.4, 0.6));
        a.set_tilt_mode(0, TiltMode::SurfaceNormal);
        a.hide_pane(0);
        assert!(!a.is_visible(0));
        assert!(a.sample(0).is_none());
        assert_eq!(a.color(0), Some([0.2, 0.4, 0.6]));
        assert_eq!(a.animation(0).unwrap()[ANIM_TILT], 1.0);
        assert_ne!(a.control_points(0), Some([0.0; 12]));

        a.show_pane(0);
        assert_eq!(a.animation(0).unwrap()[ANIM_VISIBLE], 1.0);
    }

    #[test]
    fn malformed_appearance_falls_back() {
        let mut a = animator(1);
        a.set_scale(0, f32::NAN);
        a.set_elevation(0, f32::INFINITY);
        a.set_color(0, Rgb::new(f32::NAN, 0.5, 2.0));
        assert_eq!(a.scale(0), Some(1.0));
        assert_eq!(a.elevation(0), Some(0.0));
        assert_eq!(a.color(0), Some([1.0, 0.5, 1.0]));
    }

    #[test]
    fn drain_scenario() {
        let mut a = animator(1);
        a.set_curve_control_points(0, &control());
        a.set_animation_params(0, 0.0, 0.1);
        a.set_active_pane_count(1);

        a.update(15.0);
        a.set_return_mode(false);
        assert_eq!(a.return_state(0), PaneReturnState::Draining);
        assert!(a.return_mode_enabled());
        assert!(!a.return_mode_preferred());

        a.update(4.0);
        assert!(a.return_mode_enabled(), "still landing at t = 19");
        assert!(a.sample(0).unwrap().returning);

        a.update(1.0);
        assert!(!a.return_mode_enabled());
        assert_eq!(a.return_state(0), PaneReturnState::Idle);
        assert!(!a.sample(0).unwrap().returning);
    }

    #[test]
    fn instance_range_follows_the_active_count() {
        let mut a = animator(4);
        assert_eq!(a.instance_range(), 0..0);
        a.set_active_pane_count(3);
        assert_eq!(a.instance_range(), 0..3);
        a.set_active_pane_count(9);
        assert_eq!(a.instance_range(), 0..4);
    }

    #[test]
    fn inactive_panes_do_not_hold_up_the_switch() {
        let mut a = animator(2);
        for i in 0..2 {
            a.set_curve_control_points(i, &control());
            a.set_animation_params(i, 0.0, 0.1);
        }
        a.set_active_pane_count(0);
        a.update(15.0);
        a.set_return_mode(false);
        assert!(!a.is_draining());
        a.update(0.016);
        assert!(!a.return_mode_enabled());
    }

    #[test]
    fn steady_state_frames_only_upload_uniforms() {
        let mut a = animator(8);
        let mut sink = RecordingSink::new();
        for i in 0..8 {
            a.set_curve_control_points(i, &control());
            a.set_animation_params(i, i as f64 * 0.1, 0.2);
        }
        a.apply_updates(&mut sink);
        assert_eq!(sink.writes_to(BufferTarget::PaneControlPoints).count(), 1);
        assert_eq!(sink.writes_to(BufferTarget::PaneAnimation).count(), 1);

        sink.clear();
        a.update(0.016);
        let stats = a.apply_updates(&mut sink);
        assert_eq!(stats.writes, 1);
        assert_eq!(sink.writes()[0].target, BufferTarget::PaneUniforms);
        assert_eq!(a.uniforms().return_enabled, 1.0);
    }

    #[test]
    fn sample_follows_the_clock() {
        let mut a = animator(1);
        a.set_curve_control_points(0, &control());
        a.set_animation_params(0, 0.0, 0.5);
        let start = a.sample(0).unwrap();
        assert!(start.position.distance(control()[0]) < 1e-5);
        a.update(1.0);
        let mid = a.sample(0).unwrap();
        assert!((mid.t - 0.5).abs() < 1e-9);
        a.update(1.0);
        let back = a.sample(0).unwrap();
        assert!(back.t.abs() < 1e-9 || (back.t - 1.0).abs() < 1e-9);
    }
}
