//! Chunk render pipeline and camera state.
//!
//! Everything in this module touches a real `wgpu::Device`; the registry
//! keeps it optional so batch routing stays testable without a GPU.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use voxen_test_utils::{GpuBuffer, RenderContext};

use crate::vertex::{BatchVertex, ChunkVertex};

/// Combined view-projection matrix, as the shader consumes it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

// SAFETY: CameraUniform is repr(C) with only f32 fields, no padding holes
unsafe impl Pod for CameraUniform {}
unsafe impl Zeroable for CameraUniform {}

impl CameraUniform {
    /// Build the uniform from the projection and view transforms supplied
    /// by the camera collaborator at flush time.
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self {
            view_proj: (projection * view).to_cols_array_2d(),
        }
    }

    pub fn identity() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

/// Create the camera uniform buffer through the context abstraction so the
/// registry can write it against both real and mock backends.
pub fn create_camera_buffer(ctx: &dyn RenderContext) -> GpuBuffer {
    ctx.create_buffer(&wgpu::BufferDescriptor {
        label: Some("chunk_camera"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// The render pipeline drawing chunk batches, plus its camera bind group.
pub struct ChunkPipeline {
    pipeline: wgpu::RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
}

impl ChunkPipeline {
    /// Build the pipeline against the render target format. The vertex
    /// state comes from [`ChunkVertex::layout`], bound at buffer slot 0.
    pub fn new(
        device: &wgpu::Device,
        camera_buffer: &wgpu::Buffer,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("chunk_camera_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("chunk_camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("chunk_shader"),
            source: wgpu::ShaderSource::Wgsl(CHUNK_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("chunk_pipeline_layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("chunk_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[ChunkVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            camera_bind_group,
        }
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn camera_bind_group(&self) -> &wgpu::BindGroup {
        &self.camera_bind_group
    }
}

/// WGSL for chunk geometry: integer block-space positions, a face-normal
/// lookup, and a fixed sun direction for flat shading.
const CHUNK_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<i32>,
    @location(1) uv: vec3<f32>,
    @location(2) normal: f32,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec3<f32>,
    @location(1) shade: f32,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var face_normals = array<vec3<f32>, 6>(
        vec3<f32>(0.0, 1.0, 0.0),
        vec3<f32>(0.0, -1.0, 0.0),
        vec3<f32>(0.0, 0.0, -1.0),
        vec3<f32>(0.0, 0.0, 1.0),
        vec3<f32>(1.0, 0.0, 0.0),
        vec3<f32>(-1.0, 0.0, 0.0),
    );
    let sun_dir = vec3<f32>(0.4851, 0.7276, 0.4851);

    var output: VertexOutput;
    output.position = camera.view_proj * vec4<f32>(vec3<f32>(input.position), 1.0);
    let normal = face_normals[u32(input.normal)];
    output.shade = 0.6 + 0.4 * max(dot(normal, sun_dir), 0.0);
    output.uv = input.uv;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(input.uv * input.shade, 1.0);
}
"#;
