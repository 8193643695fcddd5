//! Mock implementations of [`RenderContext`] and [`RenderEncoder`].
//!
//! The mock context records operations instead of touching a GPU. Unlike a
//! real device, mock buffers keep their contents in host memory so tests
//! can compare uploaded bytes against the expected staging data.

use std::ops::Range;

use parking_lot::Mutex;
use wgpu::{BufferDescriptor, BufferUsages};

use crate::gpu_types::GpuBuffer;
use crate::render_context::{RenderContext, RenderEncoder};

/// Records a GPU operation call for verification in tests.
#[derive(Debug, Clone)]
pub enum RenderCall {
    CreateBuffer {
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer_id: usize,
        offset: u64,
        size: usize,
    },
}

/// Mock buffer stored in the context. Holds real bytes.
#[derive(Debug, Clone)]
struct MockBuffer {
    size: u64,
    usage: BufferUsages,
    data: Vec<u8>,
}

/// Mock implementation of [`RenderContext`].
///
/// Methods take `&self` but must mutate internal state, so the recorded
/// calls and buffer store sit behind `parking_lot::Mutex` (the trait
/// requires `Send + Sync`, ruling out `RefCell`).
pub struct MockRenderContext {
    calls: Mutex<Vec<RenderCall>>,
    buffers: Mutex<Vec<MockBuffer>>,
}

impl MockRenderContext {
    /// Create a new mock render context.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
        }
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// Count buffer creations.
    pub fn count_buffer_creates(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RenderCall::CreateBuffer { .. }))
            .count()
    }

    /// Count buffer write operations.
    pub fn count_buffer_writes(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, RenderCall::WriteBuffer { .. }))
            .count()
    }

    /// Get a copy of a mock buffer's current contents.
    pub fn buffer_contents(&self, buffer_id: usize) -> Option<Vec<u8>> {
        self.buffers.lock().get(buffer_id).map(|b| b.data.clone())
    }

    /// Get the declared usage of a mock buffer.
    pub fn buffer_usage(&self, buffer_id: usize) -> Option<BufferUsages> {
        self.buffers.lock().get(buffer_id).map(|b| b.usage)
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockRenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let mut buffers = self.buffers.lock();
        let id = buffers.len();

        buffers.push(MockBuffer {
            size: desc.size,
            usage: desc.usage,
            data: vec![0u8; desc.size as usize],
        });

        self.calls.lock().push(RenderCall::CreateBuffer {
            size: desc.size,
            usage: desc.usage,
        });

        GpuBuffer::mock(id, desc.size)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let Some(buffer_id) = buffer.mock_id() else {
            return;
        };

        let mut buffers = self.buffers.lock();
        let mock = &mut buffers[buffer_id];
        assert!(
            offset + data.len() as u64 <= mock.size,
            "mock buffer write out of bounds: {} + {} > {}",
            offset,
            data.len(),
            mock.size
        );
        let start = offset as usize;
        mock.data[start..start + data.len()].copy_from_slice(data);

        self.calls.lock().push(RenderCall::WriteBuffer {
            buffer_id,
            offset,
            size: data.len(),
        });
    }
}

/// Records a render-pass recording call for verification in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderCall {
    SetPipeline,
    SetBindGroup { index: u32 },
    SetVertexBuffer { slot: u32, buffer_id: Option<usize> },
    Draw { vertices: Range<u32>, instances: Range<u32> },
}

/// Mock implementation of [`RenderEncoder`].
///
/// Owned mutably by the test, so no interior mutability is needed.
#[derive(Default)]
pub struct MockRenderEncoder {
    calls: Vec<EncoderCall>,
}

impl MockRenderEncoder {
    /// Create a new mock encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls, in order.
    pub fn calls(&self) -> &[EncoderCall] {
        &self.calls
    }

    /// The draw calls only, in recorded order.
    pub fn draws(&self) -> Vec<EncoderCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, EncoderCall::Draw { .. }))
            .cloned()
            .collect()
    }

    /// Number of draw calls recorded.
    pub fn draw_count(&self) -> usize {
        self.draws().len()
    }
}

impl RenderEncoder for MockRenderEncoder {
    fn set_pipeline(&mut self, _pipeline: &wgpu::RenderPipeline) {
        self.calls.push(EncoderCall::SetPipeline);
    }

    fn set_bind_group(&mut self, index: u32, _bind_group: &wgpu::BindGroup) {
        self.calls.push(EncoderCall::SetBindGroup { index });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer) {
        self.calls.push(EncoderCall::SetVertexBuffer {
            slot,
            buffer_id: buffer.mock_id(),
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.calls.push(EncoderCall::Draw {
            vertices,
            instances,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_buffer_creation() {
        let mock = MockRenderContext::new();

        let buffer = mock.create_buffer(&BufferDescriptor {
            label: Some("test_buffer"),
            size: 1024,
            usage: BufferUsages::VERTEX,
            mapped_at_creation: false,
        });

        assert!(buffer.is_mock());
        assert_eq!(mock.count_buffer_creates(), 1);
        assert_eq!(buffer.size(), 1024);
    }

    #[test]
    fn test_mock_buffer_write_stores_bytes() {
        let mock = MockRenderContext::new();

        let buffer = mock.create_buffer(&BufferDescriptor {
            label: None,
            size: 16,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        mock.write_buffer(&buffer, 4, &[1, 2, 3, 4]);

        assert_eq!(mock.count_buffer_writes(), 1);
        let contents = mock.buffer_contents(buffer.mock_id().unwrap()).unwrap();
        assert_eq!(&contents[..8], &[0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_mock_encoder_records_order() {
        let mock = MockRenderContext::new();
        let buffer = mock.create_buffer(&BufferDescriptor {
            label: None,
            size: 64,
            usage: BufferUsages::VERTEX,
            mapped_at_creation: false,
        });

        let mut encoder = MockRenderEncoder::new();
        encoder.set_vertex_buffer(0, &buffer);
        encoder.draw(0..3, 0..1);

        assert_eq!(
            encoder.calls(),
            &[
                EncoderCall::SetVertexBuffer {
                    slot: 0,
                    buffer_id: Some(0)
                },
                EncoderCall::Draw {
                    vertices: 0..3,
                    instances: 0..1
                },
            ]
        );
    }

    #[test]
    fn test_clear_calls() {
        let mock = MockRenderContext::new();

        mock.create_buffer(&BufferDescriptor {
            label: None,
            size: 1024,
            usage: BufferUsages::VERTEX,
            mapped_at_creation: false,
        });

        assert_eq!(mock.call_count(), 1);

        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
    }
}
