//! Error types for the batching layer.

use crate::vertex::LayoutError;

/// Failure to acquire a graphics context.
#[derive(Debug)]
pub enum GraphicsError {
    /// No suitable GPU adapter was found.
    NoAdapter,
    /// The adapter refused the device request.
    RequestDevice(String),
}

impl std::fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "no suitable GPU adapter found"),
            Self::RequestDevice(msg) => write!(f, "device request failed: {}", msg),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Errors reported by batch operations.
///
/// All of these are recoverable: the offending operation is skipped and the
/// batch stays in a consistent state. The `try_*` methods surface them as
/// values; the logging wrappers report them through `tracing` and continue,
/// so a bad submission never takes down the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Accumulate/upload/draw on a batch whose `init` was never called.
    Uninitialized,
    /// `init` called on a batch that is already ready.
    AlreadyInitialized,
    /// Accumulating `requested` more vertices would exceed the batch
    /// capacity. Nothing is written; the count is unchanged.
    CapacityExceeded {
        len: usize,
        capacity: usize,
        requested: usize,
    },
    /// The vertex layout violates its own declaration.
    Layout(LayoutError),
    /// A registry operation named a batch id that was never created.
    UnknownBatch(usize),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "batch has no staging memory (init was never called)"),
            Self::AlreadyInitialized => write!(f, "batch is already initialized"),
            Self::CapacityExceeded {
                len,
                capacity,
                requested,
            } => write!(
                f,
                "batch is out of room: {}/{} vertices, {} more requested",
                len, capacity, requested
            ),
            Self::Layout(e) => write!(f, "invalid vertex layout: {}", e),
            Self::UnknownBatch(id) => write!(f, "unknown batch id {}", id),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LayoutError> for BatchError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}
