//! Voxen Core
//!
//! Engine-wide utilities shared by the voxen crates: logging setup and
//! frame profiling.

pub mod logging;
#[cfg(feature = "profiling")]
pub mod profiling;
