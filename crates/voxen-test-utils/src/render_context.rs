//! Traits abstracting GPU operations for testing.
//!
//! [`RenderContext`] covers resource creation and uploads; [`RenderEncoder`]
//! covers render-pass recording. Both are object-safe: methods take `&self`
//! or `&mut self` and exchange owned wrapper types, so no lifetime
//! parameters propagate into the batching code and mock implementations can
//! use interior mutability.

use std::ops::Range;

use wgpu::BufferDescriptor;

use crate::gpu_types::GpuBuffer;

/// Trait abstracting GPU buffer creation and uploads.
///
/// Only the operations the batching layer needs are present; texture,
/// sampler, and compute resources live outside this layer.
pub trait RenderContext: Send + Sync {
    /// Create a GPU buffer.
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer;

    /// Write data to a buffer at a byte offset.
    ///
    /// For real buffers this maps to `queue.write_buffer()`; mocks record
    /// the operation (and the bytes) for test verification.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);
}

/// Trait abstracting render-pass recording.
///
/// Implemented for `wgpu::RenderPass` so production code records into a
/// real pass, and by `MockRenderEncoder` so tests can assert on binding
/// and draw order.
pub trait RenderEncoder {
    /// Bind a render pipeline.
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline);

    /// Bind a bind group at the given index.
    fn set_bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup);

    /// Bind a vertex buffer at the given slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer);

    /// Issue a non-indexed draw over the given vertex and instance ranges.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
}

impl RenderEncoder for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        wgpu::RenderPass::set_pipeline(self, pipeline);
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, bind_group, &[]);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.as_wgpu().slice(..));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        wgpu::RenderPass::draw(self, vertices, instances);
    }
}
