//! Voxen rendering: the vertex-batching layer of the voxel renderer.
//!
//! World logic emits chunk vertices each frame; [`ChunkRenderer`] routes
//! them into typed [`Batch`]es, uploads the staged data, and issues one
//! draw call per non-empty batch in z-index order. Chunk generation, camera
//! math, and the render loop itself are collaborators, not residents.
//!
//! GPU access goes through the `voxen-test-utils` traits
//! ([`RenderContext`](voxen_test_utils::RenderContext) /
//! [`RenderEncoder`](voxen_test_utils::RenderEncoder)), so the whole
//! accumulate → upload → draw path is exercised in tests without a device.

use std::sync::Arc;

use voxen_test_utils::{GpuBuffer, RenderContext};

pub mod batch;
pub mod error;
pub mod indirect;
pub mod pipeline;
pub mod renderer;
pub mod vertex;

pub use batch::{Batch, BatchDescriptor, BatchStatus};
pub use error::{BatchError, GraphicsError};
pub use indirect::{DrawIndirect, IndirectBuffer, IndirectCommand};
pub use pipeline::{CameraUniform, ChunkPipeline};
pub use renderer::{BatchId, ChunkRenderer, FrameStats};
pub use vertex::{BatchVertex, ChunkVertex, CubeFace, LayoutError, VERTS_PER_FACE};

/// A shared graphics context: one instance/adapter/device/queue for the
/// process. The underlying context is not reentrant from multiple threads;
/// all GPU-facing calls stay on the thread (or queue) that owns it.
pub struct GraphicsContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GraphicsContext {
    /// Create a context synchronously.
    ///
    /// See [`GraphicsContext::new_owned`] for the asynchronous version.
    pub fn new_owned_sync() -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::new_owned())
    }

    /// Create a context asynchronously.
    pub async fn new_owned() -> Result<Arc<Self>, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GraphicsError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| GraphicsError::RequestDevice(e.to_string()))?;

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl RenderContext for GraphicsContext {
    fn create_buffer(&self, desc: &wgpu::BufferDescriptor) -> GpuBuffer {
        GpuBuffer::from_wgpu(self.device.create_buffer(desc))
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer.as_wgpu(), offset, data);
    }
}
