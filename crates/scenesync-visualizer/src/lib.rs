//! # SceneSync Visualizer
//!
//! Keeps a 3D scene graph consistent with live machine telemetry, the
//! loaded toolpath, settings, and camera input, and decides when a frame
//! has to be drawn.

pub mod visualizer;

pub use visualizer::{
    AnimationGate, AnimationState, BuiltScene, CameraFit, CameraRig, Color, DelayedTextures,
    DragMode, FrameLog, HeadlessRenderer, LoadCallback, LoadResult, LoadedToolpath, Material,
    Node, NodeId, NodeKind, PanDirection, PerspectiveCamera, PivotPoint, RenderBackend,
    RenderScheduler, RenderState, ResizeCoalescer, SceneBuilder, SceneGraph, SceneSynchronizer,
    SharedViewport, Stage, SyncDeps, SyncHandle, TextLabel, Texture, TextureSource,
    ToolHeadMesh, ToolpathGeometry, ToolpathLoader, TrackballControls, ViewportSource,
    VisualizerConfig, TOOLPATH_NODE, TOOL_HEAD_NODE,
};
