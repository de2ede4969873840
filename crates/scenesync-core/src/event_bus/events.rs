//! Events carried by the bus: inbound machine and toolpath updates plus
//! the visualizer's own outbound notifications.
//!
//! Every inbound and outbound message of the visualizer is a variant here,
//! grouped by category. Events are cloneable and serializable for logging
//! and replay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{BoundingBox, TelemetryState, ToolpathDescription, WorkflowState};

/// Every event that can travel over the [`EventBus`](super::EventBus)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Controller connection events
    Connection(ConnectionEvent),
    /// Machine telemetry and job state
    Machine(MachineEvent),
    /// Toolpath load/unload and results
    Toolpath(ToolpathEvent),
    /// Window and widget events
    Ui(UiEvent),
    /// Settings store changes
    Settings(SettingsEvent),
}

impl AppEvent {
    /// Category used by [`EventFilter`](super::EventFilter)
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Connection(_) => EventCategory::Connection,
            AppEvent::Machine(_) => EventCategory::Machine,
            AppEvent::Toolpath(_) => EventCategory::Toolpath,
            AppEvent::Ui(_) => EventCategory::Ui,
            AppEvent::Settings(_) => EventCategory::Settings,
        }
    }

    /// One-line summary for logs
    pub fn description(&self) -> String {
        match self {
            AppEvent::Connection(e) => e.description(),
            AppEvent::Machine(e) => e.description(),
            AppEvent::Toolpath(e) => e.description(),
            AppEvent::Ui(e) => e.description(),
            AppEvent::Settings(e) => e.description(),
        }
    }
}

/// Coarse grouping used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Connection events.
    Connection,
    /// Machine telemetry events.
    Machine,
    /// Toolpath events.
    Toolpath,
    /// Host window and busy indication
    Ui,
    /// Settings events.
    Settings,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Connection => write!(f, "Connection"),
            EventCategory::Machine => write!(f, "Machine"),
            EventCategory::Toolpath => write!(f, "Toolpath"),
            EventCategory::Ui => write!(f, "Ui"),
            EventCategory::Settings => write!(f, "Settings"),
        }
    }
}

/// Serial port connection changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    /// The selected port changed. `None` or an empty string means disconnected.
    PortChanged {
        /// Port name.
        port: Option<String>,
    },
}

impl ConnectionEvent {
    fn description(&self) -> String {
        match self {
            ConnectionEvent::PortChanged { port: Some(port) } if !port.is_empty() => {
                format!("Port changed to {}", port)
            }
            ConnectionEvent::PortChanged { .. } => "Port disconnected".to_string(),
        }
    }
}

/// Machine state events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// Telemetry report (status + parser state).
    Telemetry(TelemetryState),
    /// Sender workflow state changed.
    WorkflowStateChanged(WorkflowState),
}

impl MachineEvent {
    fn description(&self) -> String {
        match self {
            MachineEvent::Telemetry(state) => {
                format!("Telemetry ({})", state.status.active_state)
            }
            MachineEvent::WorkflowStateChanged(state) => format!("Workflow state: {}", state),
        }
    }
}

/// Toolpath events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolpathEvent {
    /// Load a new toolpath, replacing any existing one.
    Load(ToolpathDescription),
    /// Unload the current toolpath. Also published by the visualizer on disconnect.
    Unload,
    /// Number of program segments already sent to the machine.
    Progress {
        /// Segments sent so far.
        sent: usize,
    },
    /// Published after a successful load.
    BoundingBoxComputed(BoundingBox),
    /// Published when a load could not be completed.
    LoadFailed {
        /// Why the load failed.
        reason: String,
    },
}

impl ToolpathEvent {
    fn description(&self) -> String {
        match self {
            ToolpathEvent::Load(desc) => format!("Load toolpath ({} segments)", desc.len()),
            ToolpathEvent::Unload => "Unload toolpath".to_string(),
            ToolpathEvent::Progress { sent } => format!("Toolpath progress: {} sent", sent),
            ToolpathEvent::BoundingBoxComputed(bbox) => format!("Bounding box {}", bbox),
            ToolpathEvent::LoadFailed { reason } => format!("Toolpath load failed: {}", reason),
        }
    }
}

/// User interface events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    /// The container or window was resized.
    Resize,
    /// Busy indication changed (a toolpath is loading).
    Busy(bool),
}

impl UiEvent {
    fn description(&self) -> String {
        match self {
            UiEvent::Resize => "Resize".to_string(),
            UiEvent::Busy(busy) => format!("Busy: {}", busy),
        }
    }
}

/// Settings events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingsEvent {
    /// A key in the settings store changed value.
    Changed {
        /// Settings key.
        key: String,
        /// New value.
        value: Value,
    },
}

impl SettingsEvent {
    fn description(&self) -> String {
        match self {
            SettingsEvent::Changed { key, value } => format!("Setting {} = {}", key, value),
        }
    }
}
