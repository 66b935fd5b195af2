//! wgpu backend: GPU buffers mirroring every [`BufferTarget`], both pipelines, and the two
//! draw calls per frame.

use std::borrow::Cow;
use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::packing::{
    CameraUniforms, PANE_QUAD, PackedAnimation, PackedControlPoints, PackedUvRect,
    PaneUniforms, PathUniforms,
};
use crate::panes::PaneAnimator;
use crate::path_batch::BatchedPathRenderer;
use crate::shaders::{PANE_SHADER, PATH_SHADER};
use crate::upload::{BufferSink, BufferTarget};

const PATH_POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];
const PATH_COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![1 => Float32x3];
const PATH_ARC_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const CONTROL_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![1 => Float32x4, 2 => Float32x4, 3 => Float32x4];
const PANE_COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![4 => Float32x3];
const SCALE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![5 => Float32];
const ELEVATION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![6 => Float32];
const UV_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![7 => Float32x4];
const ANIMATION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![8 => Float32x4];

fn layout<'a>(
    stride: usize,
    step_mode: wgpu::VertexStepMode,
    attributes: &'a [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'a> {
    wgpu::VertexBufferLayout {
        array_stride: stride as wgpu::BufferAddress,
        step_mode,
        attributes,
    }
}

fn attribute_buffer(device: &wgpu::Device, label: &str, stride: usize, count: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        // Zero-sized vertex buffers cannot be bound.
        size: (stride * count).max(16) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// One GPU buffer per [`BufferTarget`].
pub struct GpuBuffers {
    path_positions: wgpu::Buffer,
    path_colors: wgpu::Buffer,
    path_arc_lengths: wgpu::Buffer,
    path_uniforms: wgpu::Buffer,
    pane_control_points: wgpu::Buffer,
    pane_colors: wgpu::Buffer,
    pane_scales: wgpu::Buffer,
    pane_elevations: wgpu::Buffer,
    pane_uv_rects: wgpu::Buffer,
    pane_animation: wgpu::Buffer,
    pane_uniforms: wgpu::Buffer,
}

impl GpuBuffers {
    fn new(device: &wgpu::Device, vertices: usize, panes: usize) -> Self {
        Self {
            path_positions: attribute_buffer(device, "flights-path-positions", 12, vertices),
            path_colors: attribute_buffer(device, "flights-path-colors", 12, vertices),
            path_arc_lengths: attribute_buffer(device, "flights-path-arcs", 4, vertices),
            path_uniforms: uniform_buffer(
                device,
                "flights-path-material",
                size_of::<PathUniforms>(),
            ),
            pane_control_points: attribute_buffer(
                device,
                "flights-pane-control",
                size_of::<PackedControlPoints>(),
                panes,
            ),
            pane_colors: attribute_buffer(device, "flights-pane-colors", 12, panes),
            pane_scales: attribute_buffer(device, "flights-pane-scales", 4, panes),
            pane_elevations: attribute_buffer(device, "flights-pane-elevations", 4, panes),
            pane_uv_rects: attribute_buffer(
                device,
                "flights-pane-uv",
                size_of::<PackedUvRect>(),
                panes,
            ),
            pane_animation: attribute_buffer(
                device,
                "flights-pane-animation",
                size_of::<PackedAnimation>(),
                panes,
            ),
            pane_uniforms: uniform_buffer(device, "flights-pane-frame", size_of::<PaneUniforms>()),
        }
    }

    pub fn get(&self, target: BufferTarget) -> &wgpu::Buffer {
        match target {
            BufferTarget::PathPositions => &self.path_positions,
            BufferTarget::PathColors => &self.path_colors,
            BufferTarget::PathArcLengths => &self.path_arc_lengths,
            BufferTarget::PathUniforms => &self.path_uniforms,
            BufferTarget::PaneControlPoints => &self.pane_control_points,
            BufferTarget::PaneColors => &self.pane_colors,
            BufferTarget::PaneScales => &self.pane_scales,
            BufferTarget::PaneElevations => &self.pane_elevations,
            BufferTarget::PaneUvRects => &self.pane_uv_rects,
            BufferTarget::PaneAnimation => &self.pane_animation,
            BufferTarget::PaneUniforms => &self.pane_uniforms,
        }
    }
}

/// Routes flushes into `Queue::write_buffer`.
pub struct WgpuSink<'a> {
    queue: &'a wgpu::Queue,
    buffers: &'a GpuBuffers,
}

impl BufferSink for WgpuSink<'_> {
    fn write(&mut self, target: BufferTarget, byte_offset: u64, bytes: &[u8]) {
        self.queue
            .write_buffer(self.buffers.get(target), byte_offset, bytes);
    }
}

pub struct FlightRendererDescriptor<'a> {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub atlas_view: &'a wgpu::TextureView,
}

pub struct FlightRenderer {
    buffers: GpuBuffers,
    quad: wgpu::Buffer,
    camera: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    path_bind_group: wgpu::BindGroup,
    pane_bind_group: wgpu::BindGroup,
    path_pipeline: wgpu::RenderPipeline,
    pane_pipeline: wgpu::RenderPipeline,
    max_panes: u32,
}

impl FlightRenderer {
    pub fn new(
        device: &wgpu::Device,
        desc: &FlightRendererDescriptor<'_>,
        paths: &BatchedPathRenderer,
        panes: &PaneAnimator,
    ) -> Self {
        let buffers = GpuBuffers::new(device, paths.vertex_capacity(), panes.max_panes());

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("flights-pane-quad"),
            contents: bytemuck::cast_slice(&PANE_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let camera = uniform_buffer(device, "flights-camera", size_of::<CameraUniforms>());

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flights-camera-bgl"),
            entries: &[uniform_entry(0)],
        });
        let path_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flights-path-bgl"),
            entries: &[uniform_entry(0)],
        });
        let pane_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flights-pane-bgl"),
            entries: &[
                uniform_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("flights-atlas-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flights-camera-bg"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera.as_entire_binding(),
            }],
        });
        let path_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flights-path-bg"),
            layout: &path_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffers.get(BufferTarget::PathUniforms).as_entire_binding(),
            }],
        });
        let pane_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flights-pane-bg"),
            layout: &pane_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.get(BufferTarget::PaneUniforms).as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(desc.atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let path_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flights-path-shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(PATH_SHADER)),
        });
        let pane_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flights-pane-shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(PANE_SHADER)),
        });

        let path_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flights-path-pipeline-layout"),
            bind_group_layouts: &[&camera_layout, &path_layout],
            immediate_size: 0,
        });
        let pane_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flights-pane-pipeline-layout"),
            bind_group_layouts: &[&camera_layout, &pane_layout],
            immediate_size: 0,
        });

        let vertex = wgpu::VertexStepMode::Vertex;
        let instance = wgpu::VertexStepMode::Instance;

        let path_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("flights-path-pipeline"),
            layout: Some(&path_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &path_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    layout(12, vertex, &PATH_POSITION_ATTRIBUTES),
                    layout(12, vertex, &PATH_COLOR_ATTRIBUTES),
                    layout(4, vertex, &PATH_ARC_ATTRIBUTES),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &path_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let pane_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("flights-pane-pipeline"),
            layout: Some(&pane_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &pane_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    layout(8, vertex, &QUAD_ATTRIBUTES),
                    layout(size_of::<PackedControlPoints>(), instance, &CONTROL_ATTRIBUTES),
                    layout(12, instance, &PANE_COLOR_ATTRIBUTES),
                    layout(4, instance, &SCALE_ATTRIBUTES),
                    layout(4, instance, &ELEVATION_ATTRIBUTES),
                    layout(size_of::<PackedUvRect>(), instance, &UV_ATTRIBUTES),
                    layout(size_of::<PackedAnimation>(), instance, &ANIMATION_ATTRIBUTES),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &pane_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Panes are seen from both sides.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        tracing::debug!(
            vertices = paths.vertex_capacity(),
            panes = panes.max_panes(),
            "flight renderer created"
        );

        Self {
            buffers,
            quad,
            camera,
            camera_bind_group,
            path_bind_group,
            pane_bind_group,
            path_pipeline,
            pane_pipeline,
            max_panes: panes.max_panes() as u32,
        }
    }

    /// Sink for `apply_updates` this frame.
    pub fn sink<'a>(&'a self, queue: &'a wgpu::Queue) -> WgpuSink<'a> {
        WgpuSink {
            queue,
            buffers: &self.buffers,
        }
    }

    pub fn buffers(&self) -> &GpuBuffers {
        &self.buffers
    }

    pub fn write_camera(&self, queue: &wgpu::Queue, view_proj: [[f32; 4]; 4]) {
        queue.write_buffer(
            &self.camera,
            0,
            bytemuck::bytes_of(&CameraUniforms { view_proj }),
        );
    }

    /// One line-list draw for the path prefix, one instanced draw for the active pane
    /// slots (`PaneAnimator::instance_range`). Hidden panes are culled in the vertex stage.
    pub fn draw(
        &self,
        rpass: &mut wgpu::RenderPass<'_>,
        path_vertices: Range<u32>,
        pane_instances: Range<u32>,
    ) {
        let b = &self.buffers;
        if !path_vertices.is_empty() {
            rpass.set_pipeline(&self.path_pipeline);
            rpass.set_bind_group(0, &self.camera_bind_group, &[]);
            rpass.set_bind_group(1, &self.path_bind_group, &[]);
            rpass.set_vertex_buffer(0, b.path_positions.slice(..));
            rpass.set_vertex_buffer(1, b.path_colors.slice(..));
            rpass.set_vertex_buffer(2, b.path_arc_lengths.slice(..));
            rpass.draw(path_vertices, 0..1);
        }

        let pane_instances = pane_instances.start..pane_instances.end.min(self.max_panes);
        if !pane_instances.is_empty() {
            rpass.set_pipeline(&self.pane_pipeline);
            rpass.set_bind_group(0, &self.camera_bind_group, &[]);
            rpass.set_bind_group(1, &self.pane_bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad.slice(..));
            rpass.set_vertex_buffer(1, b.pane_control_points.slice(..));
            rpass.set_vertex_buffer(2, b.pane_colors.slice(..));
            rpass.set_vertex_buffer(3, b.pane_scales.slice(..));
            rpass.set_vertex_buffer(4, b.pane_elevations.slice(..));
            rpass.set_vertex_buffer(5, b.pane_uv_rects.slice(..));
            rpass.set_vertex_buffer(6, b.pane_animation.slice(..));
            rpass.draw(0..PANE_QUAD.len() as u32, pane_instances);
        }
    }
}
