//! Packed layouts shared with the WGSL shaders.
//!
//! Offsets and component orders here are decoded at fixed positions by
//! `shaders::PANE_SHADER` / `shaders::PATH_SHADER`; change both sides together.

use bytemuck::{Pod, Zeroable};

/// Control points: 4 × vec3 flattened into 3 × vec4 (12 scalars, point-major).
pub type PackedControlPoints = [[f32; 4]; 3];

/// Texture region: `[offset_x, offset_y, scale_x, scale_y]` in UV space.
pub type PackedUvRect = [f32; 4];

/// Animation group: `[phase, speed, tilt_mode, visible]`.
pub type PackedAnimation = [f32; 4];

pub const ANIM_PHASE: usize = 0;
pub const ANIM_SPEED: usize = 1;
pub const ANIM_TILT: usize = 2;
pub const ANIM_VISIBLE: usize = 3;

pub const FULL_UV_RECT: PackedUvRect = [0.0, 0.0, 1.0, 1.0];

#[inline]
pub fn flag(on: bool) -> f32 {
    if on { 1.0 } else { 0.0 }
}

#[inline]
pub fn is_flag_set(v: f32) -> bool {
    v > 0.5
}

/// Material block of the path pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PathUniforms {
    pub dash_size: f32,
    pub gap_size: f32,
    pub dashed: f32,
    pub opacity: f32,
}

/// Per-frame block of the pane pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PaneUniforms {
    pub global_time: f32,
    pub return_enabled: f32,
    pub _pad: [f32; 2],
}

/// Camera block supplied by the host scene (group 0 of both pipelines).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
}

/// Unit quad corners for the pane mesh, two triangles.
pub const PANE_QUAD: [[f32; 2]; 6] = [
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];
