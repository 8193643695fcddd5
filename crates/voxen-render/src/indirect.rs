//! Indirect draw command support.
//!
//! Every batch keeps its current draw parameters in a small GPU command
//! buffer alongside the vertex data. The accumulate/draw path today issues
//! direct draws; the command buffer documents the multi-draw-indirect
//! extension point and stays correct so that wiring it up later is a
//! render-pass change, not a data-model change.
//!
//! Using `first_instance` in a command requires the
//! `INDIRECT_FIRST_INSTANCE` device feature at draw time.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use voxen_test_utils::{GpuBuffer, RenderContext};

/// Indirect draw command for non-indexed geometry.
///
/// Matches the layout expected by `wgpu::RenderPass::draw_indirect`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawIndirect {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

// SAFETY: DrawIndirect is a repr(C) struct of u32s with no padding
unsafe impl Pod for DrawIndirect {}
unsafe impl Zeroable for DrawIndirect {}

impl DrawIndirect {
    /// Create a new indirect draw command.
    pub const fn new(
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> Self {
        Self {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        }
    }

    /// A draw command for a single instance.
    pub const fn single(vertex_count: u32) -> Self {
        Self::new(vertex_count, 1, 0, 0)
    }

    /// A draw command for multiple instances.
    pub const fn instanced(vertex_count: u32, instance_count: u32) -> Self {
        Self::new(vertex_count, instance_count, 0, 0)
    }
}

/// Marker trait for indirect draw command types.
pub trait IndirectCommand: Pod + Zeroable + Default {
    /// Size of a single command in bytes.
    const SIZE: u64;
}

impl IndirectCommand for DrawIndirect {
    const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// A type-safe GPU buffer of indirect draw commands.
pub struct IndirectBuffer<T: IndirectCommand> {
    buffer: GpuBuffer,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: IndirectCommand> IndirectBuffer<T> {
    /// Create a buffer holding up to `capacity` commands.
    pub fn new(ctx: &dyn RenderContext, label: Option<&str>, capacity: usize) -> Self {
        let buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label,
            size: T::SIZE * capacity as u64,
            usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            capacity,
            _marker: PhantomData,
        }
    }

    /// The underlying GPU buffer.
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    /// Maximum number of commands.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte offset of the command at `index`.
    pub fn offset_of(&self, index: usize) -> u64 {
        T::SIZE * index as u64
    }

    /// Write commands starting at the given index.
    ///
    /// # Panics
    /// Panics if the write would exceed the buffer capacity.
    pub fn write_at(&self, ctx: &dyn RenderContext, start_index: usize, commands: &[T]) {
        assert!(
            start_index + commands.len() <= self.capacity,
            "indirect buffer write would exceed capacity: {} + {} > {}",
            start_index,
            commands.len(),
            self.capacity
        );

        ctx.write_buffer(
            &self.buffer,
            self.offset_of(start_index),
            bytemuck::cast_slice(commands),
        );
    }

    /// Write commands starting at index 0.
    pub fn write(&self, ctx: &dyn RenderContext, commands: &[T]) {
        self.write_at(ctx, 0, commands);
    }

    /// Zero out every command slot.
    pub fn clear(&self, ctx: &dyn RenderContext) {
        let zeros = vec![T::default(); self.capacity];
        ctx.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&zeros));
    }
}
