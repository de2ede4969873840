//! # SceneSync Core
//!
//! Core types, events, and errors for SceneSync.
//! Provides the machine/toolpath data model, the typed event bus that
//! external sources publish on, and the shared error types.

pub mod data;
pub mod error;
pub mod event_bus;
pub mod types;

pub use data::{
    coerce_coordinate, ActiveState, BoundingBox, MachineStatusReport, MotionKind, PathSegment,
    TelemetryState, ToolpathDescription, WorkPosition, WorkflowState,
};

pub use error::{AssetError, Error, Result, ToolpathError};

pub use event_bus::{
    AppEvent, ConnectionEvent, EventBus, EventBusConfig, EventBusError, EventCategory,
    EventFilter, MachineEvent, SettingsEvent, SubscriptionId, ToolpathEvent, UiEvent,
};

pub use types::{shared, thread_safe, Shared, ThreadSafe, ThreadSafeDeque};
