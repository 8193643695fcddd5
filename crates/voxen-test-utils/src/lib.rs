//! Test utilities for the voxen engine.
//!
//! The batching layer talks to the GPU through two small object-safe
//! traits so the same code runs against a real device and against mocks:
//!
//! - [`RenderContext`] — buffer creation and uploads
//! - [`RenderEncoder`] — render-pass recording (bindings and draws)
//!
//! With the `mock` feature enabled, [`MockRenderContext`] and
//! [`MockRenderEncoder`] record every call and keep buffer contents in
//! memory, so tests can assert on upload bytes and draw order without a
//! GPU.
//!
//! All wrapper types are owned (reference counting internally); no
//! lifetimes leak into the caller's types, which keeps the traits
//! object-safe.

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
