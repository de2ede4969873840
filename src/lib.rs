//! # SceneSync
//!
//! Live 3D scene synchronization for CNC machine visualizers:
//! - Tool head tracking from controller telemetry
//! - Toolpath loading with automatic centring and camera framing
//! - Tool-head spin animation gated by machine and job state
//! - Trackball camera with pan, reset, and drag interaction
//!
//! ## Architecture
//!
//! SceneSync is organized as a workspace with multiple crates:
//!
//! 1. **scenesync-core** - Data model, typed event bus, errors
//! 2. **scenesync-settings** - Settings store and config file persistence
//! 3. **scenesync-visualizer** - Scene graph, camera, loader, scheduler, synchronizer
//! 4. **scenesync** - Logging setup and a headless demo binary

pub use scenesync_core::{data, event_bus};
pub use scenesync_visualizer::visualizer;

pub use scenesync_core::{
    ActiveState, AppEvent, BoundingBox, ConnectionEvent, Error, EventBus, MachineEvent,
    MotionKind, PathSegment, Result, TelemetryState, ToolpathDescription, ToolpathEvent, UiEvent,
    WorkPosition, WorkflowState,
};

pub use scenesync_settings::{SettingsStore, ANIMATION_KEY};

pub use scenesync_visualizer::{
    DelayedTextures, HeadlessRenderer, RenderState, SceneSynchronizer, SharedViewport, SyncDeps,
    SyncHandle, VisualizerConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support (defaults to `info`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
