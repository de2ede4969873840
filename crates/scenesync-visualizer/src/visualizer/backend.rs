//! Host seams.
//!
//! The visualizer never talks to a GPU, a window, or the network directly.
//! Drawing goes through [`RenderBackend`], viewport measurements through
//! [`ViewportSource`], and texture fetches through [`TextureSource`].
//! Headless implementations of all three are provided for tests and
//! offline runs.

use super::camera::PerspectiveCamera;
use super::scene::{NodeKind, SceneGraph, TOOL_HEAD_NODE};
use glam::{Quat, Vec3};
use scenesync_core::{shared, AssetError, Shared};
use std::task::Poll;

/// Draws the scene graph from a camera
pub trait RenderBackend {
    fn set_size(&mut self, width: u32, height: u32);
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera);
}

/// Measures the space available to the canvas
pub trait ViewportSource {
    fn container_width(&self) -> f32;
    fn window_height(&self) -> f32;
}

/// Decoded image data reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Asynchronous texture loader, polled once per tick until it settles
pub trait TextureSource {
    fn poll_texture(&mut self, url: &str) -> Poll<Result<Texture, AssetError>>;
}

/// What the headless renderer saw on its last frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLog {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub visible_nodes: usize,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub camera_aspect: f32,
    /// World position and rotation of the tool head, when one is attached
    pub tool_head: Option<(Vec3, Quat)>,
    pub tool_head_visible: bool,
}

/// Renderer that records frames instead of drawing them
#[derive(Debug)]
pub struct HeadlessRenderer {
    log: Shared<FrameLog>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            log: shared(FrameLog::default()),
        }
    }

    /// Handle for inspecting frames after the renderer is handed over
    pub fn frame_log(&self) -> Shared<FrameLog> {
        self.log.clone()
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        let mut log = self.log.borrow_mut();
        log.width = width;
        log.height = height;
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) {
        let mut visible_nodes = 0;
        let mut tool_head_seen = false;
        scene.visit_visible(|_, node| {
            visible_nodes += 1;
            if matches!(node.kind, NodeKind::ToolHead(_)) {
                tool_head_seen = true;
            }
        });

        let tool_head = scene
            .find_by_name(scene.root(), TOOL_HEAD_NODE)
            .and_then(|id| Some((scene.world_position(id)?, scene.get(id)?.rotation)));

        let mut log = self.log.borrow_mut();
        log.frames += 1;
        log.visible_nodes = visible_nodes;
        log.camera_position = camera.position;
        log.camera_target = camera.look_target;
        log.camera_aspect = camera.aspect;
        log.tool_head = tool_head;
        log.tool_head_visible = tool_head_seen;
        tracing::trace!("Headless frame {} ({} nodes)", log.frames, visible_nodes);
    }
}

/// Viewport with externally adjustable dimensions
#[derive(Debug, Clone)]
pub struct SharedViewport {
    size: Shared<(f32, f32)>,
}

impl SharedViewport {
    pub fn new(container_width: f32, window_height: f32) -> Self {
        Self {
            size: shared((container_width, window_height)),
        }
    }

    pub fn set(&self, container_width: f32, window_height: f32) {
        *self.size.borrow_mut() = (container_width, window_height);
    }
}

impl ViewportSource for SharedViewport {
    fn container_width(&self) -> f32 {
        self.size.borrow().0
    }

    fn window_height(&self) -> f32 {
        self.size.borrow().1
    }
}

/// Texture source that settles after a fixed number of polls
#[derive(Debug, Clone)]
pub struct DelayedTextures {
    remaining: u32,
    failure: Option<String>,
}

impl DelayedTextures {
    /// Succeeds on the first poll
    pub fn ready() -> Self {
        Self::after(0)
    }

    /// Pending for `polls` polls, then succeeds
    pub fn after(polls: u32) -> Self {
        Self {
            remaining: polls,
            failure: None,
        }
    }

    /// Fails on the first poll with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            remaining: 0,
            failure: Some(reason.into()),
        }
    }
}

impl TextureSource for DelayedTextures {
    fn poll_texture(&mut self, url: &str) -> Poll<Result<Texture, AssetError>> {
        if self.remaining > 0 {
            self.remaining -= 1;
            return Poll::Pending;
        }
        match &self.failure {
            Some(reason) => Poll::Ready(Err(AssetError::TextureUnavailable {
                url: url.to_string(),
                reason: reason.clone(),
            })),
            None => Poll::Ready(Ok(Texture {
                url: url.to_string(),
                width: 256,
                height: 256,
            })),
        }
    }
}
