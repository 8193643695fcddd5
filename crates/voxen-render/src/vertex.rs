//! Chunk vertex format and the layout contract batches are built against.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use static_assertions::const_assert_eq;

/// Vertices per voxel face: one quad, two triangles.
pub const VERTS_PER_FACE: usize = 6;

/// A vertex type that can be accumulated into a [`Batch`](crate::Batch).
///
/// `layout()` is the batch's layout descriptor set: the ordered list of
/// `{shader slot, element format, byte offset}` tuples that maps the record's
/// fields to GPU attribute slots. It is consumed exactly once, when the
/// pipeline consuming the batch is built, and never changes afterwards.
pub trait BatchVertex: Pod + Zeroable {
    /// The vertex buffer layout for this record, bound at buffer slot 0.
    fn layout() -> wgpu::VertexBufferLayout<'static>;
}

/// One face of a voxel cube, packed into the vertex as a float indicator.
///
/// The shader unpacks it into a normal vector with a lookup table; keeping
/// it as a single float keeps the vertex at 28 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CubeFace {
    Top = 0,
    Bottom = 1,
    North = 2,
    South = 3,
    East = 4,
    West = 5,
}

impl CubeFace {
    /// The packed float indicator stored in [`ChunkVertex::normal`].
    pub fn packed(self) -> f32 {
        self as u8 as f32
    }

    /// Recover a face from a packed indicator.
    pub fn from_packed(value: f32) -> Option<Self> {
        match value as i32 {
            0 => Some(Self::Top),
            1 => Some(Self::Bottom),
            2 => Some(Self::North),
            3 => Some(Self::South),
            4 => Some(Self::East),
            5 => Some(Self::West),
            _ => None,
        }
    }

    /// The outward unit normal of this face.
    pub fn normal(self) -> Vec3 {
        match self {
            Self::Top => Vec3::Y,
            Self::Bottom => Vec3::NEG_Y,
            Self::North => Vec3::NEG_Z,
            Self::South => Vec3::Z,
            Self::East => Vec3::X,
            Self::West => Vec3::NEG_X,
        }
    }
}

/// A single chunk-mesh vertex: integer block-space position, 3D texture
/// coordinate (the third component selects the atlas layer), and a packed
/// face-normal indicator.
///
/// 28 bytes, immutable once constructed, copied by value into a batch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkVertex {
    pub position: [i32; 3],
    pub uv: [f32; 3],
    pub normal: f32,
}

// SAFETY: ChunkVertex is repr(C) with only i32/f32 fields, no padding holes
unsafe impl Pod for ChunkVertex {}
unsafe impl Zeroable for ChunkVertex {}

const_assert_eq!(std::mem::size_of::<ChunkVertex>(), 28);

impl ChunkVertex {
    pub fn new(position: IVec3, uv: Vec3, face: CubeFace) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            normal: face.packed(),
        }
    }

    /// Size of the vertex in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

impl BatchVertex for ChunkVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            // location 0: position (ivec3)
            0 => Sint32x3,
            // location 1: uv (vec3, z selects the atlas layer)
            1 => Float32x3,
            // location 2: packed face normal (f32)
            2 => Float32,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ChunkVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

/// A vertex layout that contradicts its own declaration.
///
/// Either defect silently corrupts rendered geometry if it reaches the GPU,
/// so layouts are checked once when a batch is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Two attributes claim the same shader location.
    DuplicateLocation(u32),
    /// An attribute's bytes extend past the vertex stride.
    OutOfBounds {
        location: u32,
        end: u64,
        stride: u64,
    },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateLocation(loc) => {
                write!(f, "shader location {} declared twice", loc)
            }
            Self::OutOfBounds {
                location,
                end,
                stride,
            } => write!(
                f,
                "attribute at location {} ends at byte {} but the stride is {}",
                location, end, stride
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Check a layout descriptor set: locations must be unique and every
/// attribute must lie within the vertex stride.
pub fn validate_layout(layout: &wgpu::VertexBufferLayout<'_>) -> Result<(), LayoutError> {
    for (i, attr) in layout.attributes.iter().enumerate() {
        for prev in &layout.attributes[..i] {
            if prev.shader_location == attr.shader_location {
                return Err(LayoutError::DuplicateLocation(attr.shader_location));
            }
        }
        let end = attr.offset + attr.format.size();
        if end > layout.array_stride {
            return Err(LayoutError::OutOfBounds {
                location: attr.shader_location,
                end,
                stride: layout.array_stride,
            });
        }
    }
    Ok(())
}
