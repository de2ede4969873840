//! 3D scene synchronization module
//!
//! This module provides:
//! - Scene graph and construction (grid, axes, labels, tool head)
//! - Pivot tracking that keeps the loaded toolpath centred
//! - Incremental toolpath loading
//! - Camera rig with trackball-style controls
//! - Frame scheduling and tool-head animation
//! - The synchronizer tying machine, toolpath, and UI events to the scene

pub mod backend;
pub mod builder;
pub mod camera;
pub mod config;
pub mod pivot;
pub mod resize;
pub mod scene;
pub mod scheduler;
pub mod stage;
pub mod state;
pub mod synchronizer;
pub mod toolpath;

pub use backend::{
    DelayedTextures, FrameLog, HeadlessRenderer, RenderBackend, SharedViewport, Texture,
    TextureSource, ViewportSource,
};
pub use builder::{BuiltScene, SceneBuilder, LIGHT_NODE};
pub use camera::{CameraFit, CameraRig, DragMode, PanDirection, PerspectiveCamera, TrackballControls};
pub use config::{
    AnimationConfig, CameraConfig, ControlsConfig, GridConfig, LayoutConfig, ResizeConfig,
    ToolHeadConfig, ToolpathConfig, VisualizerConfig,
};
pub use pivot::{PivotCallback, PivotPoint};
pub use resize::ResizeCoalescer;
pub use scene::{
    Color, Material, Node, NodeId, NodeKind, SceneGraph, TextLabel, ToolHeadMesh, AXES_NODE,
    GRID_NODE, GROUP_NODE, SCENE_NODE, TOOL_HEAD_NODE,
};
pub use scheduler::{rotation_step, AnimationGate, AnimationState, RenderScheduler};
pub use stage::Stage;
pub use state::RenderState;
pub use synchronizer::{SceneSynchronizer, SyncDeps, SyncHandle};
pub use toolpath::{
    GeometryRun, LoadCallback, LoadResult, LoadedToolpath, ToolpathGeometry, ToolpathLoader,
    TOOLPATH_NODE,
};
