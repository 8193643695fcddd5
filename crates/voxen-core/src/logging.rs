//! Tracing subscriber setup for the engine.

/// Install the global tracing subscriber.
///
/// Engine crates log at `trace`; the wgpu internals are noisy at that level
/// and are capped at `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("trace,wgpu_core=info,wgpu_hal=info,naga=info")
        .init();
}
