//! Typed geometry batches.
//!
//! A [`Batch`] accumulates same-shaped vertex records destined for one draw
//! call. The lifecycle is: construct (empty, no resources) → [`Batch::init`]
//! (staging memory + GPU buffers, layout fixed) → accumulate →
//! [`Batch::upload`] → [`Batch::draw`] (which resets the count) → reuse, and
//! eventually [`Batch::free`].
//!
//! Both accumulate paths write CPU staging memory only; `upload` is the
//! single CPU→GPU synchronization point. Overflowing the capacity drops the
//! offending vertices and leaves the count unchanged, so
//! `0 <= len <= capacity` holds at all times.

use voxen_core::profiling::profile_function;
use voxen_test_utils::{GpuBuffer, RenderContext, RenderEncoder};

use crate::error::BatchError;
use crate::indirect::{DrawIndirect, IndirectBuffer};
use crate::vertex::{BatchVertex, VERTS_PER_FACE, validate_layout};

/// Construction parameters for a [`Batch`].
#[derive(Debug, Clone, Copy)]
pub struct BatchDescriptor<'a> {
    /// Debug label applied to the GPU buffers.
    pub label: Option<&'a str>,
    /// Maximum number of vertices the batch can hold.
    pub capacity: usize,
    /// Sort key ordering this batch against its siblings at draw time.
    pub z_index: i32,
}

/// Non-mutating status snapshot for observability tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStatus {
    pub vertex_count: usize,
    pub face_count: usize,
    pub capacity: usize,
    pub ready: bool,
}

/// GPU-side resources, present exactly while the batch is ready.
struct BatchBuffers {
    vertices: GpuBuffer,
    commands: IndirectBuffer<DrawIndirect>,
}

/// An accumulator of vertex records destined for one draw call.
///
/// The batch exclusively owns its staging memory and GPU buffers; no two
/// batches alias a buffer. All operations run to completion on the calling
/// thread.
pub struct Batch<T: BatchVertex> {
    label: Option<String>,
    capacity: usize,
    z_index: i32,
    staging: Vec<T>,
    gpu: Option<BatchBuffers>,
    /// Staged vertices not yet uploaded.
    dirty: bool,
}

impl<T: BatchVertex> Batch<T> {
    /// Construct a logically empty batch. No memory or GPU resources are
    /// allocated until [`Batch::init`].
    pub fn new(desc: &BatchDescriptor<'_>) -> Self {
        Self {
            label: desc.label.map(str::to_owned),
            capacity: desc.capacity,
            z_index: desc.z_index,
            staging: Vec::new(),
            gpu: None,
            dirty: false,
        }
    }

    /// Allocate the staging region and create the GPU vertex and command
    /// buffers, sized for the batch capacity. The vertex layout is validated
    /// and fixed here; it never changes for the batch's lifetime.
    ///
    /// Calling `init` on a ready batch is a logged no-op: the existing
    /// resources are kept.
    pub fn init(&mut self, ctx: &dyn RenderContext) -> Result<(), BatchError> {
        if self.gpu.is_some() {
            tracing::warn!(label = self.label.as_deref(), "batch already initialized");
            return Err(BatchError::AlreadyInitialized);
        }
        validate_layout(&T::layout())?;

        self.staging = Vec::with_capacity(self.capacity);
        let vertices = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: self.label.as_deref(),
            size: std::mem::size_of::<T>() as u64 * self.capacity as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let commands = IndirectBuffer::new(ctx, self.label.as_deref(), 1);

        self.gpu = Some(BatchBuffers { vertices, commands });
        self.dirty = false;
        Ok(())
    }

    /// Whether the batch holds staging memory and GPU buffers.
    pub fn is_ready(&self) -> bool {
        self.gpu.is_some()
    }

    /// Current vertex count.
    pub fn len(&self) -> usize {
        self.staging.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// Maximum vertex count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The sort key ordering this batch against its siblings. The batch
    /// itself owns no policy for assigning it.
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    /// The batch's staged vertices, in accumulation order.
    pub fn vertices(&self) -> &[T] {
        &self.staging
    }

    /// The batch's one-slot indirect command buffer, rewritten on every
    /// upload. Present while the batch is ready.
    pub fn command_buffer(&self) -> Option<&IndirectBuffer<DrawIndirect>> {
        self.gpu.as_ref().map(|gpu| &gpu.commands)
    }

    /// Append one vertex to the staging buffer.
    ///
    /// Fails without state change if the batch is uninitialized or full.
    pub fn try_push(&mut self, vertex: T) -> Result<(), BatchError> {
        if self.gpu.is_none() {
            return Err(BatchError::Uninitialized);
        }
        if self.staging.len() == self.capacity {
            return Err(BatchError::CapacityExceeded {
                len: self.staging.len(),
                capacity: self.capacity,
                requested: 1,
            });
        }
        self.staging.push(vertex);
        self.dirty = true;
        Ok(())
    }

    /// Append one vertex; on failure, log the error and drop the vertex.
    pub fn push(&mut self, vertex: T) {
        if let Err(e) = self.try_push(vertex) {
            tracing::error!(label = self.label.as_deref(), "dropping vertex: {}", e);
        }
    }

    /// Append a run of vertices to the staging buffer, all or nothing.
    ///
    /// The capacity check covers the whole run: if `len + vertices.len()`
    /// would exceed the capacity, nothing is written.
    pub fn try_extend(&mut self, vertices: &[T]) -> Result<(), BatchError> {
        if self.gpu.is_none() {
            return Err(BatchError::Uninitialized);
        }
        if self.staging.len() + vertices.len() > self.capacity {
            return Err(BatchError::CapacityExceeded {
                len: self.staging.len(),
                capacity: self.capacity,
                requested: vertices.len(),
            });
        }
        self.staging.extend_from_slice(vertices);
        self.dirty = true;
        Ok(())
    }

    /// Append a run of vertices; on failure, log the error and drop the run.
    pub fn extend(&mut self, vertices: &[T]) {
        if let Err(e) = self.try_extend(vertices) {
            tracing::error!(
                label = self.label.as_deref(),
                "dropping {} vertices: {}",
                vertices.len(),
                e
            );
        }
    }

    /// Synchronize staged vertices into the GPU vertex buffer and rewrite
    /// the batch's draw command.
    ///
    /// Writes the used prefix `[0, len)` byte-for-byte at offset 0. Not an
    /// incremental diff: accumulate many, then upload once per frame.
    pub fn upload(&mut self, ctx: &dyn RenderContext) -> Result<(), BatchError> {
        profile_function!();
        let Some(gpu) = &self.gpu else {
            return Err(BatchError::Uninitialized);
        };

        if !self.staging.is_empty() {
            ctx.write_buffer(&gpu.vertices, 0, bytemuck::cast_slice(&self.staging));
        }
        gpu.commands
            .write(ctx, &[DrawIndirect::single(self.staging.len() as u32)]);

        self.dirty = false;
        Ok(())
    }

    /// Issue one triangle-list draw over the current vertex range, then
    /// reset the count for reuse.
    ///
    /// An empty batch is a warning-level no-op. Drawing does not upload:
    /// staged vertices that were never [`Batch::upload`]ed are reported,
    /// because the GPU buffer would render stale data.
    pub fn draw(&mut self, encoder: &mut dyn RenderEncoder) {
        profile_function!();
        if self.staging.is_empty() {
            tracing::warn!(label = self.label.as_deref(), "nothing to draw");
            return;
        }
        let Some(gpu) = &self.gpu else {
            tracing::error!(
                label = self.label.as_deref(),
                "cannot draw: {}",
                BatchError::Uninitialized
            );
            return;
        };
        if self.dirty {
            tracing::warn!(
                label = self.label.as_deref(),
                "drawing a batch with staged vertices that were never uploaded"
            );
        }

        encoder.set_vertex_buffer(0, &gpu.vertices);
        encoder.draw(0..self.staging.len() as u32, 0..1);

        self.clear();
    }

    /// Reset the vertex count to zero. Bytes beyond the new count remain in
    /// both buffers but are logically inert. Idempotent.
    pub fn clear(&mut self) {
        self.staging.clear();
        self.dirty = false;
    }

    /// Release the staging memory and the GPU buffers together, returning
    /// the batch to the uninitialized state. Idempotent.
    pub fn free(&mut self) {
        self.staging = Vec::new();
        self.gpu = None;
        self.dirty = false;
    }

    /// Status snapshot; never mutates the batch.
    pub fn status(&self) -> BatchStatus {
        BatchStatus {
            vertex_count: self.staging.len(),
            face_count: self.staging.len() / VERTS_PER_FACE,
            capacity: self.capacity,
            ready: self.gpu.is_some(),
        }
    }
}

// Batches are ordered purely by z-index so a registry can sort its draw
// sequence without seeing buffer state.
impl<T: BatchVertex> PartialEq for Batch<T> {
    fn eq(&self, other: &Self) -> bool {
        self.z_index == other.z_index
    }
}

impl<T: BatchVertex> Eq for Batch<T> {}

impl<T: BatchVertex> PartialOrd for Batch<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: BatchVertex> Ord for Batch<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.z_index.cmp(&other.z_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::{ChunkVertex, CubeFace};
    use glam::{IVec3, Vec3};
    use voxen_test_utils::{EncoderCall, MockRenderContext, MockRenderEncoder};

    fn vertex(n: i32) -> ChunkVertex {
        ChunkVertex::new(IVec3::new(n, 0, 0), Vec3::new(n as f32, 0.0, 0.0), CubeFace::Top)
    }

    fn ready_batch(ctx: &MockRenderContext, capacity: usize) -> Batch<ChunkVertex> {
        let mut batch = Batch::new(&BatchDescriptor {
            label: Some("test"),
            capacity,
            z_index: 0,
        });
        batch.init(ctx).unwrap();
        batch
    }

    #[test]
    fn test_uninitialized_operations_fail() {
        let mut batch: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
            label: None,
            capacity: 4,
            z_index: 0,
        });
        assert!(!batch.is_ready());
        assert_eq!(batch.try_push(vertex(0)), Err(BatchError::Uninitialized));
        assert_eq!(
            batch.try_extend(&[vertex(0)]),
            Err(BatchError::Uninitialized)
        );
        let ctx = MockRenderContext::new();
        assert_eq!(batch.upload(&ctx), Err(BatchError::Uninitialized));
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_double_init_rejected() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);
        let creates = ctx.count_buffer_creates();
        assert_eq!(batch.init(&ctx), Err(BatchError::AlreadyInitialized));
        // No new resources were allocated
        assert_eq!(ctx.count_buffer_creates(), creates);
    }

    #[test]
    fn test_push_monotonic_until_capacity() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);

        for i in 0..4 {
            assert_eq!(batch.len(), i as usize);
            batch.try_push(vertex(i)).unwrap();
        }
        assert_eq!(batch.len(), 4);

        // The fifth vertex is dropped, count unchanged
        assert_eq!(
            batch.try_push(vertex(4)),
            Err(BatchError::CapacityExceeded {
                len: 4,
                capacity: 4,
                requested: 1,
            })
        );
        assert_eq!(batch.len(), 4);
    }

    #[test]
    fn test_bulk_capacity_check_is_all_or_nothing() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);
        batch.try_extend(&[vertex(0), vertex(1)]).unwrap();

        // Not completely full, but three more do not fit: nothing is written
        assert_eq!(
            batch.try_extend(&[vertex(2), vertex(3), vertex(4)]),
            Err(BatchError::CapacityExceeded {
                len: 2,
                capacity: 4,
                requested: 3,
            })
        );
        assert_eq!(batch.len(), 2);

        batch.try_extend(&[vertex(2), vertex(3)]).unwrap();
        assert_eq!(batch.len(), 4);
    }

    #[test]
    fn test_logging_wrappers_drop_and_continue() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 2);
        batch.push(vertex(0));
        batch.push(vertex(1));
        batch.push(vertex(2));
        batch.extend(&[vertex(3)]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.vertices(), &[vertex(0), vertex(1)]);
    }

    #[test]
    fn test_upload_syncs_staged_prefix_byte_for_byte() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 8);
        batch.try_extend(&[vertex(1), vertex(2), vertex(3)]).unwrap();
        batch.upload(&ctx).unwrap();

        let vertex_buffer_id = 0; // first buffer created by init
        let bytes = ctx.buffer_contents(vertex_buffer_id).unwrap();
        let staged: &[u8] = bytemuck::cast_slice(batch.vertices());
        assert_eq!(&bytes[..staged.len()], staged);
    }

    #[test]
    fn test_upload_rewrites_draw_command() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 8);
        batch.try_extend(&[vertex(1), vertex(2), vertex(3)]).unwrap();
        batch.upload(&ctx).unwrap();

        let command_buffer_id = batch
            .command_buffer()
            .unwrap()
            .buffer()
            .mock_id()
            .unwrap();
        let bytes = ctx.buffer_contents(command_buffer_id).unwrap();
        let commands: &[DrawIndirect] = bytemuck::cast_slice(&bytes);
        assert_eq!(commands, &[DrawIndirect::single(3)]);
    }

    #[test]
    fn test_draw_resets_count() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);
        batch.try_extend(&[vertex(0), vertex(1), vertex(2)]).unwrap();
        batch.upload(&ctx).unwrap();

        let mut encoder = MockRenderEncoder::new();
        batch.draw(&mut encoder);

        assert_eq!(
            encoder.calls(),
            &[
                EncoderCall::SetVertexBuffer {
                    slot: 0,
                    buffer_id: Some(0),
                },
                EncoderCall::Draw {
                    vertices: 0..3,
                    instances: 0..1,
                },
            ]
        );
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_empty_draw_is_a_no_op() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);
        let mut encoder = MockRenderEncoder::new();
        batch.draw(&mut encoder);
        assert!(encoder.calls().is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);
        batch.try_push(vertex(0)).unwrap();
        batch.clear();
        assert_eq!(batch.len(), 0);
        batch.clear();
        assert_eq!(batch.len(), 0);
        assert!(batch.is_ready());
    }

    #[test]
    fn test_free_releases_both_sides_and_is_idempotent() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 4);
        batch.try_push(vertex(0)).unwrap();

        batch.free();
        assert!(!batch.is_ready());
        assert_eq!(batch.try_push(vertex(1)), Err(BatchError::Uninitialized));

        batch.free();
        assert!(!batch.is_ready());
    }

    #[test]
    fn test_status_reports_without_mutating() {
        let ctx = MockRenderContext::new();
        let mut batch = ready_batch(&ctx, 64);
        batch.try_extend(&[vertex(0); 12]).unwrap();

        let status = batch.status();
        assert_eq!(
            status,
            BatchStatus {
                vertex_count: 12,
                face_count: 2,
                capacity: 64,
                ready: true,
            }
        );
        assert_eq!(batch.len(), 12);
    }

    #[test]
    fn test_batches_order_by_z_index_only() {
        let near: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
            label: None,
            capacity: 1,
            z_index: 2,
        });
        let far: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
            label: None,
            capacity: 1024,
            z_index: -1,
        });
        assert!(far < near);
        assert!(near > far);
    }
}
