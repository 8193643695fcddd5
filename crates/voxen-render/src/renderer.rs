//! The batch registry: routes chunk geometry into batches and flushes them
//! in sort-key order.
//!
//! The renderer owns no geometry state of its own — it holds the registered
//! batches, the camera uniform, and per-frame statistics, and invokes the
//! batches' public operations. World logic submits vertices each frame; the
//! render loop calls [`ChunkRenderer::flush`] with the projection and view
//! transforms supplied by its camera.

use std::sync::Arc;

use glam::Mat4;
use voxen_core::profiling::profile_function;
use voxen_test_utils::{GpuBuffer, RenderContext, RenderEncoder};

use crate::batch::{Batch, BatchDescriptor};
use crate::error::BatchError;
use crate::pipeline::{CameraUniform, ChunkPipeline, create_camera_buffer};
use crate::vertex::{ChunkVertex, VERTS_PER_FACE};

/// Handle to a batch registered with a [`ChunkRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(usize);

/// Statistics from the last flush, owned by the registry (no process-wide
/// counters). Read through [`ChunkRenderer::stats`]; reset on every flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub vertex_count: u32,
    pub face_count: u32,
    pub draw_calls: u32,
    pub batch_count: u32,
}

/// Router and transform-state holder over a set of typed chunk batches.
pub struct ChunkRenderer {
    ctx: Arc<dyn RenderContext>,
    batches: Vec<Batch<ChunkVertex>>,
    camera_buffer: GpuBuffer,
    pipeline: Option<ChunkPipeline>,
    stats: FrameStats,
}

impl ChunkRenderer {
    /// Create the registry and its camera uniform buffer.
    pub fn new(ctx: Arc<dyn RenderContext>) -> Self {
        let camera_buffer = create_camera_buffer(&*ctx);
        Self {
            ctx,
            batches: Vec::new(),
            camera_buffer,
            pipeline: None,
            stats: FrameStats::default(),
        }
    }

    /// Build the chunk pipeline against a real device and render target
    /// format. Without it, [`ChunkRenderer::flush`] still uploads and draws
    /// batches but leaves pipeline state to the caller.
    pub fn attach_pipeline(&mut self, device: &wgpu::Device, target_format: wgpu::TextureFormat) {
        self.pipeline = Some(ChunkPipeline::new(
            device,
            self.camera_buffer.as_wgpu(),
            target_format,
        ));
    }

    /// Register and initialize a new batch.
    pub fn create_batch(&mut self, desc: &BatchDescriptor<'_>) -> Result<BatchId, BatchError> {
        let mut batch = Batch::new(desc);
        batch.init(&*self.ctx)?;
        self.batches.push(batch);
        Ok(BatchId(self.batches.len() - 1))
    }

    pub fn batch(&self, id: BatchId) -> Option<&Batch<ChunkVertex>> {
        self.batches.get(id.0)
    }

    pub fn batch_mut(&mut self, id: BatchId) -> Option<&mut Batch<ChunkVertex>> {
        self.batches.get_mut(id.0)
    }

    /// Submit a run of vertices to a batch, fallibly.
    pub fn try_submit(&mut self, id: BatchId, vertices: &[ChunkVertex]) -> Result<(), BatchError> {
        let batch = self
            .batches
            .get_mut(id.0)
            .ok_or(BatchError::UnknownBatch(id.0))?;
        batch.try_extend(vertices)
    }

    /// Submit a run of vertices to a batch; failures are logged and the run
    /// is dropped, keeping the frame alive.
    pub fn submit(&mut self, id: BatchId, vertices: &[ChunkVertex]) {
        if let Err(e) = self.try_submit(id, vertices) {
            tracing::error!("dropping submission of {} vertices: {}", vertices.len(), e);
        }
    }

    /// Upload and draw every non-empty batch, in ascending z-index order
    /// (ties keep registration order), under the given projection and view
    /// transforms. Each drawn batch resets its count for the next frame.
    pub fn flush(&mut self, encoder: &mut dyn RenderEncoder, projection: Mat4, view: Mat4) {
        profile_function!();

        let uniform = CameraUniform::new(projection, view);
        self.ctx
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        if let Some(pipeline) = &self.pipeline {
            encoder.set_pipeline(pipeline.pipeline());
            encoder.set_bind_group(0, pipeline.camera_bind_group());
        }

        // sort_by_key is stable, so equal keys keep registration order
        let mut order: Vec<usize> = (0..self.batches.len()).collect();
        order.sort_by_key(|&i| self.batches[i].z_index());

        let mut stats = FrameStats {
            batch_count: self.batches.len() as u32,
            ..FrameStats::default()
        };

        for i in order {
            let batch = &mut self.batches[i];
            if batch.is_empty() {
                continue;
            }
            let vertex_count = batch.len() as u32;
            if let Err(e) = batch.upload(&*self.ctx) {
                tracing::error!("skipping batch: {}", e);
                continue;
            }
            batch.draw(encoder);
            stats.vertex_count += vertex_count;
            stats.draw_calls += 1;
        }

        stats.face_count = stats.vertex_count / VERTS_PER_FACE as u32;
        self.stats = stats;
    }

    /// Discard all pending geometry without drawing, e.g. on a context
    /// reset.
    pub fn clear(&mut self) {
        for batch in &mut self.batches {
            batch.clear();
        }
    }

    /// Release every batch's staging memory and GPU buffers. Idempotent;
    /// the registry itself stays usable for re-initialization.
    pub fn free(&mut self) {
        for batch in &mut self.batches {
            batch.free();
        }
    }

    /// Statistics from the last flush.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Log the registry and per-batch status.
    pub fn report_status(&self) {
        tracing::info!(
            batches = self.batches.len(),
            vertices = self.stats.vertex_count,
            faces = self.stats.face_count,
            draw_calls = self.stats.draw_calls,
            "chunk renderer status"
        );
        for (i, batch) in self.batches.iter().enumerate() {
            let status = batch.status();
            tracing::info!(
                batch = i,
                z_index = batch.z_index(),
                vertices = status.vertex_count,
                faces = status.face_count,
                capacity = status.capacity,
                ready = status.ready,
                "batch status"
            );
        }
    }
}
