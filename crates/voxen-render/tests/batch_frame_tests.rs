//! End-to-end frame flow against the mock GPU backend: accumulate, upload,
//! draw, reset, and cross-batch ordering.

use std::sync::Arc;

use glam::{IVec3, Mat4, Vec3};
use voxen_render::{
    Batch, BatchDescriptor, BatchError, ChunkRenderer, ChunkVertex, CubeFace, GraphicsContext,
};
use voxen_test_utils::{EncoderCall, MockRenderContext, MockRenderEncoder};

fn vertex(n: i32) -> ChunkVertex {
    ChunkVertex::new(
        IVec3::new(n, 0, 0),
        Vec3::new(n as f32 * 0.1, 0.0, 0.0),
        CubeFace::Top,
    )
}

/// The worked single-batch scenario: capacity 4, three single accumulates,
/// reload + draw, then overflow.
#[test]
fn small_batch_frame_cycle() {
    let ctx = MockRenderContext::new();
    let mut batch: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
        label: Some("scenario"),
        capacity: 4,
        z_index: 0,
    });
    batch.init(&ctx).unwrap();

    for n in 0..3 {
        batch.try_push(vertex(n)).unwrap();
    }
    assert_eq!(batch.len(), 3);

    batch.upload(&ctx).unwrap();
    let mut encoder = MockRenderEncoder::new();
    batch.draw(&mut encoder);

    assert_eq!(
        encoder.draws(),
        vec![EncoderCall::Draw {
            vertices: 0..3,
            instances: 0..1,
        }]
    );
    assert_eq!(batch.len(), 0);

    // Refill one at a time; the fifth must be rejected with the count
    // pinned at capacity.
    let mut results = Vec::new();
    for n in 0..5 {
        results.push(batch.try_push(vertex(n)));
    }
    assert!(results[..4].iter().all(Result::is_ok));
    assert_eq!(
        results[4],
        Err(BatchError::CapacityExceeded {
            len: 4,
            capacity: 4,
            requested: 1,
        })
    );
    assert_eq!(batch.len(), 4);
}

/// The worked two-batch scenario: sort keys 2 and -1; the -1 batch draws
/// first regardless of registration order.
#[test]
fn registry_draws_lowest_sort_key_first() {
    let mut renderer = ChunkRenderer::new(Arc::new(MockRenderContext::new()));

    let high = renderer
        .create_batch(&BatchDescriptor {
            label: Some("high"),
            capacity: 16,
            z_index: 2,
        })
        .unwrap();
    let low = renderer
        .create_batch(&BatchDescriptor {
            label: Some("low"),
            capacity: 16,
            z_index: -1,
        })
        .unwrap();

    renderer.submit(high, &[vertex(0), vertex(1), vertex(2)]);
    renderer.submit(low, &[vertex(3), vertex(4), vertex(5), vertex(6)]);

    let mut encoder = MockRenderEncoder::new();
    renderer.flush(&mut encoder, Mat4::IDENTITY, Mat4::IDENTITY);

    let draws = encoder.draws();
    assert_eq!(
        draws,
        vec![
            EncoderCall::Draw {
                vertices: 0..4,
                instances: 0..1,
            },
            EncoderCall::Draw {
                vertices: 0..3,
                instances: 0..1,
            },
        ]
    );
}

/// After upload, the GPU buffer's used prefix matches the staging buffer
/// byte for byte.
#[test]
fn upload_is_a_full_sync_of_the_used_prefix() {
    let ctx = MockRenderContext::new();
    let mut batch: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
        label: None,
        capacity: 32,
        z_index: 0,
    });
    batch.init(&ctx).unwrap();

    let run: Vec<ChunkVertex> = (0..7).map(vertex).collect();
    batch.try_extend(&run).unwrap();
    batch.upload(&ctx).unwrap();

    let staged: &[u8] = bytemuck::cast_slice(&run);
    let uploaded = ctx.buffer_contents(0).unwrap();
    assert_eq!(&uploaded[..staged.len()], staged);
}

/// Mixing single and bulk accumulation is safe: both stage to CPU, and one
/// upload reconciles everything.
#[test]
fn single_and_bulk_accumulation_share_one_sync_path() {
    let ctx = MockRenderContext::new();
    let mut batch: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
        label: None,
        capacity: 16,
        z_index: 0,
    });
    batch.init(&ctx).unwrap();

    batch.try_push(vertex(0)).unwrap();
    batch.try_extend(&[vertex(1), vertex(2)]).unwrap();
    batch.try_push(vertex(3)).unwrap();
    assert_eq!(batch.len(), 4);

    // No GPU writes yet: accumulation is CPU-side only
    assert_eq!(ctx.count_buffer_writes(), 0);

    batch.upload(&ctx).unwrap();
    let staged: &[u8] = bytemuck::cast_slice(batch.vertices());
    let uploaded = ctx.buffer_contents(0).unwrap();
    assert_eq!(&uploaded[..staged.len()], staged);
}

#[test]
#[ignore] // Requires GPU - run with: cargo test --test batch_frame_tests -- --ignored
fn real_context_round_trip() {
    let ctx = match GraphicsContext::new_owned_sync() {
        Ok(ctx) => ctx,
        Err(e) => {
            println!("GPU not available: {:?}", e);
            return;
        }
    };

    let mut batch: Batch<ChunkVertex> = Batch::new(&BatchDescriptor {
        label: Some("gpu"),
        capacity: 1024,
        z_index: 0,
    });
    batch.init(&*ctx).unwrap();
    batch.try_extend(&(0..6).map(vertex).collect::<Vec<_>>()).unwrap();
    batch.upload(&*ctx).unwrap();
    assert_eq!(batch.len(), 6);
}
