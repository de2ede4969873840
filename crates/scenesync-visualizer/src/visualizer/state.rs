use scenesync_core::{ActiveState, BoundingBox, WorkflowState};

/// UI-facing state of the visualizer.
///
/// Equality over these five fields decides whether a change is committed
/// and a redraw requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    /// Connected port, empty when disconnected
    pub port: String,
    /// A toolpath is loaded and framed
    pub ready: bool,
    pub active_state: ActiveState,
    pub workflow_state: WorkflowState,
    pub bounding_box: BoundingBox,
}

impl RenderState {
    pub fn with_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.port.is_empty()
    }

    /// Connected with a toolpath loaded and framed. Hosts hide the file
    /// uploader while this holds.
    pub fn has_loaded(&self) -> bool {
        self.is_connected() && self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        let state = RenderState::default();
        assert!(!state.is_connected());
        assert!(!state.has_loaded());
        assert_eq!(state.workflow_state, WorkflowState::Idle);
    }

    #[test]
    fn test_equality_covers_every_field() {
        let base = RenderState::with_port("/dev/ttyACM0");
        let mut other = base.clone();
        assert_eq!(base, other);
        other.active_state = ActiveState::Run;
        assert_ne!(base, other);
    }

    #[test]
    fn test_has_loaded_needs_port_and_ready() {
        let mut state = RenderState {
            ready: true,
            ..RenderState::default()
        };
        assert!(!state.has_loaded());
        state.port = "/dev/ttyUSB0".to_string();
        assert!(state.has_loaded());
    }
}
