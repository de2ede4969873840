//! Frame scheduling and tool-head animation.
//!
//! Frames are requested, not drawn, by state changes. Requests made
//! before the next frame collapse into one, so there is never more than
//! one animation loop alive.

use super::config::AnimationConfig;
use super::stage::Stage;
use scenesync_core::{ActiveState, WorkflowState};
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Animating,
}

/// Inputs deciding whether the tool head spins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationGate {
    pub animation_enabled: bool,
    pub active_state: ActiveState,
    pub workflow_state: WorkflowState,
}

impl AnimationGate {
    pub fn is_open(&self) -> bool {
        self.animation_enabled
            && self.active_state == ActiveState::Run
            && self.workflow_state == WorkflowState::Running
    }
}

/// Rotation about Z for one frame at `rpm`, negative for clockwise spin
pub fn rotation_step(rpm: f32, fps: f32) -> f32 {
    if fps <= 0.0 {
        return 0.0;
    }
    -(rpm / 60.0) * (TAU / fps)
}

#[derive(Debug)]
pub struct RenderScheduler {
    state: AnimationState,
    frame_requested: bool,
    rpm: f32,
    fps: f32,
    frames: u64,
}

impl RenderScheduler {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            state: AnimationState::Idle,
            frame_requested: false,
            rpm: config.rpm,
            fps: config.fps,
            frames: 0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame_requested
    }

    /// Frames this scheduler has drawn
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run the pending frame, if any.
    ///
    /// With the gate open the tool head advances one step and the next
    /// frame is requested. With it closed the scheduler goes idle and
    /// draws once more.
    pub fn on_frame(&mut self, gate: AnimationGate, stage: &mut Stage) -> AnimationState {
        if !self.frame_requested {
            return self.state;
        }
        self.frame_requested = false;

        if gate.is_open() {
            if self.state == AnimationState::Idle {
                tracing::debug!("Tool head animation started");
            }
            self.state = AnimationState::Animating;
            stage.rotate_tool_head(rotation_step(self.rpm, self.fps));
            self.frame_requested = true;
        } else {
            if self.state == AnimationState::Animating {
                tracing::debug!("Tool head animation stopped");
            }
            self.state = AnimationState::Idle;
        }

        stage.render();
        self.frames += 1;
        self.state
    }

    /// Drop any pending frame and go idle
    pub fn stop(&mut self) {
        self.frame_requested = false;
        self.state = AnimationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::backend::{DelayedTextures, HeadlessRenderer};
    use crate::visualizer::builder::SceneBuilder;
    use crate::visualizer::config::VisualizerConfig;
    use glam::{Quat, Vec3};

    fn open() -> AnimationGate {
        AnimationGate {
            animation_enabled: true,
            active_state: ActiveState::Run,
            workflow_state: WorkflowState::Running,
        }
    }

    fn stage_with_tool_head() -> Stage {
        let mut builder = SceneBuilder::new(VisualizerConfig::default());
        let mut stage = builder.build(Box::new(HeadlessRenderer::new()), 800.0, 600.0);
        let mut textures = DelayedTextures::ready();
        builder.poll_tool_head(&mut stage, &mut textures, true, Vec3::ZERO);
        stage
    }

    #[test]
    fn test_rotation_step() {
        let step = rotation_step(360.0, 60.0);
        assert!((step + TAU / 10.0).abs() < 1e-6);
        assert_eq!(rotation_step(0.0, 60.0), 0.0);
    }

    #[test]
    fn test_gate_requires_all_conditions() {
        assert!(open().is_open());
        assert!(!AnimationGate {
            animation_enabled: false,
            ..open()
        }
        .is_open());
        assert!(!AnimationGate {
            active_state: ActiveState::Hold,
            ..open()
        }
        .is_open());
        assert!(!AnimationGate {
            workflow_state: WorkflowState::Paused,
            ..open()
        }
        .is_open());
    }

    #[test]
    fn test_requests_coalesce() {
        let mut stage = stage_with_tool_head();
        let mut scheduler = RenderScheduler::new(&AnimationConfig::default());
        let closed = AnimationGate {
            animation_enabled: false,
            ..open()
        };

        scheduler.request_frame();
        scheduler.request_frame();
        scheduler.request_frame();
        scheduler.on_frame(closed, &mut stage);
        scheduler.on_frame(closed, &mut stage);
        assert_eq!(scheduler.frames(), 1);
    }

    #[test]
    fn test_animates_until_gate_closes() {
        let mut stage = stage_with_tool_head();
        let mut scheduler = RenderScheduler::new(&AnimationConfig::default());

        scheduler.request_frame();
        assert_eq!(scheduler.on_frame(open(), &mut stage), AnimationState::Animating);
        assert!(scheduler.has_pending_frame());
        assert_eq!(scheduler.on_frame(open(), &mut stage), AnimationState::Animating);

        let head = stage.tool_head().unwrap();
        let rotation = stage.graph().get(head).unwrap().rotation;
        assert_ne!(rotation, Quat::IDENTITY);

        let paused = AnimationGate {
            workflow_state: WorkflowState::Paused,
            ..open()
        };
        assert_eq!(scheduler.on_frame(paused, &mut stage), AnimationState::Idle);
        assert!(!scheduler.has_pending_frame());
        assert_eq!(stage.graph().get(head).unwrap().rotation, rotation);
    }
}
