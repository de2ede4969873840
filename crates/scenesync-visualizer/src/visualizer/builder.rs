//! Scene construction.
//!
//! Builds the static part of the scene (light, grid, axes, labels) and
//! attaches the tool head once its texture has settled.

use super::backend::{RenderBackend, TextureSource};
use super::camera::CameraRig;
use super::config::{GridConfig, VisualizerConfig};
use super::scene::{
    Color, Material, Node, NodeId, NodeKind, SceneGraph, TextLabel, ToolHeadMesh, AXES_NODE,
    GRID_NODE, GROUP_NODE, TOOL_HEAD_NODE,
};
use super::stage::Stage;
use glam::Vec3;
use std::task::Poll;

pub const LIGHT_NODE: &str = "AmbientLight";

/// Graph produced by [`SceneBuilder::build_graph`]
#[derive(Debug, Clone)]
pub struct BuiltScene {
    pub graph: SceneGraph,
    /// Child of the root that everything except the light hangs off
    pub group: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolHeadStatus {
    Pending,
    Attached,
}

#[derive(Debug)]
pub struct SceneBuilder {
    config: VisualizerConfig,
    tool_head: ToolHeadStatus,
}

impl SceneBuilder {
    pub fn new(config: VisualizerConfig) -> Self {
        Self {
            config,
            tool_head: ToolHeadStatus::Pending,
        }
    }

    pub fn tool_head_attached(&self) -> bool {
        self.tool_head == ToolHeadStatus::Attached
    }

    /// Light first, then the group with grid, axes, and labels
    pub fn build_graph(&self) -> BuiltScene {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let grid = &self.config.grid;

        let light = Node::new(NodeKind::AmbientLight {
            color: Color::GRAY_25,
        })
        .named(LIGHT_NODE);
        let group = Node::group().named(GROUP_NODE);
        graph.add(root, light);
        let group = graph.add(root, group).unwrap_or(root);

        add_grid(&mut graph, group, grid);
        add_axes(&mut graph, group, grid.axis_length);
        add_labels(&mut graph, group, grid);

        BuiltScene { graph, group }
    }

    /// Scene, camera rig, and sized renderer for a `width` x `height` viewport
    pub fn build(&self, renderer: Box<dyn RenderBackend>, width: f32, height: f32) -> Stage {
        let BuiltScene { graph, group } = self.build_graph();
        let rig = CameraRig::new(&self.config.camera, &self.config.controls, width, height);
        tracing::debug!("Scene built with {} nodes ({}x{})", graph.len(), width, height);
        Stage::new(graph, group, rig, renderer, width as u32, height as u32)
    }

    /// Poll the tool-head texture and attach the tool head once it settles.
    ///
    /// The tool head starts at `position` in group coordinates. A failed
    /// texture still attaches an untextured tool head. Renders once on
    /// attach and returns true on that call.
    pub fn poll_tool_head(
        &mut self,
        stage: &mut Stage,
        textures: &mut dyn TextureSource,
        visible: bool,
        position: Vec3,
    ) -> bool {
        if self.tool_head == ToolHeadStatus::Attached {
            return false;
        }
        let url = &self.config.tool_head.texture_url;
        let texture = match textures.poll_texture(url) {
            Poll::Pending => return false,
            Poll::Ready(Ok(texture)) => Some(texture),
            Poll::Ready(Err(err)) => {
                tracing::warn!("Tool head drawn without texture: {}", err);
                None
            }
        };

        let mesh = ToolHeadMesh {
            radius: self.config.tool_head.radius,
            height: self.config.tool_head.height,
            color: Color::SILVER,
            texture,
        };
        let node = Node::new(NodeKind::ToolHead(mesh))
            .named(TOOL_HEAD_NODE)
            .at(position)
            .hidden(!visible);
        let group = stage.group();
        stage.graph_mut().add(group, node);
        self.tool_head = ToolHeadStatus::Attached;
        stage.render();
        true
    }
}

fn add_grid(graph: &mut SceneGraph, group: NodeId, grid: &GridConfig) {
    let Some(grid_node) = graph.add(group, Node::group().named(GRID_NODE)) else {
        return;
    };

    let mut center = Vec::new();
    let mut lines = Vec::new();
    let (x_len, y_len) = (grid.x_length, grid.y_length);

    for x in steps(x_len, grid.x_spacing) {
        let target = if x == 0.0 { &mut center } else { &mut lines };
        target.extend([Vec3::new(x, -y_len, 0.0), Vec3::new(x, y_len, 0.0)]);
    }
    for y in steps(y_len, grid.y_spacing) {
        let target = if y == 0.0 { &mut center } else { &mut lines };
        target.extend([Vec3::new(-x_len, y, 0.0), Vec3::new(x_len, y, 0.0)]);
    }

    for (vertices, color) in [(center, Color::BLUE), (lines, Color::GRAY_44)] {
        let material = Material::overlay(color, grid.opacity);
        graph.add(grid_node, Node::new(NodeKind::Lines { vertices, material }));
    }
}

/// `-length, -length + spacing, ..., length`, with 0 exact when it is hit
fn steps(length: f32, spacing: f32) -> impl Iterator<Item = f32> {
    let count = (length / spacing).floor() as i64;
    (-count..=count).map(move |i| i as f32 * spacing)
}

fn add_axes(graph: &mut SceneGraph, group: NodeId, length: f32) {
    let Some(axes) = graph.add(group, Node::group().named(AXES_NODE)) else {
        return;
    };
    for (direction, color) in [
        (Vec3::X, Color::RED),
        (Vec3::Y, Color::GREEN),
        (Vec3::Z, Color::BLUE),
    ] {
        let vertices = vec![Vec3::ZERO, direction * length];
        graph.add(
            axes,
            Node::new(NodeKind::Lines {
                vertices,
                material: Material::solid(color),
            }),
        );
    }
}

fn label(text: impl Into<String>, size: f32, material: Material) -> Node {
    Node::new(NodeKind::Label(TextLabel {
        text: text.into(),
        size,
        material,
    }))
}

fn add_labels(graph: &mut SceneGraph, group: NodeId, grid: &GridConfig) {
    let offset = grid.axis_length + 10.0;
    for (text, position, color) in [
        ("X", Vec3::new(offset, 0.0, 0.0), Color::RED),
        ("Y", Vec3::new(0.0, offset, 0.0), Color::GREEN),
        ("Z", Vec3::new(0.0, 0.0, offset), Color::BLUE),
    ] {
        let node = label(text, grid.axis_label_size, Material::solid(color))
            .named(format!("AxisLabel{}", text))
            .at(position);
        graph.add(group, node);
    }

    let interval = grid.label_interval as usize;
    let tick = |color| Material {
        opacity: grid.label_opacity,
        transparent: true,
        ..Material::solid(color)
    };

    let x_len = grid.x_length as i64;
    for i in (-x_len..=x_len).step_by(interval).filter(|i| *i != 0) {
        let node = label(i.to_string(), grid.label_size, tick(Color::RED))
            .at(Vec3::new(i as f32, 10.0, 0.0));
        graph.add(group, node);
    }
    let y_len = grid.y_length as i64;
    for i in (-y_len..=y_len).step_by(interval).filter(|i| *i != 0) {
        let node = label(i.to_string(), grid.label_size, tick(Color::GREEN))
            .at(Vec3::new(-10.0, i as f32, 0.0));
        graph.add(group, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::backend::{DelayedTextures, HeadlessRenderer};

    fn labels(graph: &SceneGraph, group: NodeId) -> Vec<(String, Vec3)> {
        graph
            .children(group)
            .iter()
            .filter_map(|id| {
                let node = graph.get(*id)?;
                match &node.kind {
                    NodeKind::Label(label) if node.name.is_none() => {
                        Some((label.text.clone(), node.position))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    #[test]
    fn test_graph_layout() {
        let builder = SceneBuilder::new(VisualizerConfig::default());
        let BuiltScene { graph, group } = builder.build_graph();
        let root = graph.root();

        let first = graph.children(root)[0];
        assert!(graph.get(first).unwrap().has_name(LIGHT_NODE));
        assert_eq!(graph.children(root).len(), 2);
        assert!(graph.find_by_name(group, GRID_NODE).is_some());
        assert!(graph.find_by_name(group, AXES_NODE).is_some());
        assert!(graph.find_by_name(group, TOOL_HEAD_NODE).is_none());
    }

    #[test]
    fn test_tick_labels_skip_zero() {
        let builder = SceneBuilder::new(VisualizerConfig::default());
        let BuiltScene { graph, group } = builder.build_graph();
        let labels = labels(&graph, group);

        // 24 per axis: -600..=600 step 50 without 0
        assert_eq!(labels.len(), 48);
        assert!(labels.iter().all(|(text, _)| text != "0"));
        assert!(labels.contains(&("-600".to_string(), Vec3::new(-600.0, 10.0, 0.0))));
        assert!(labels.contains(&("50".to_string(), Vec3::new(-10.0, 50.0, 0.0))));
    }

    #[test]
    fn test_grid_materials() {
        let builder = SceneBuilder::new(VisualizerConfig::default());
        let BuiltScene { graph, group } = builder.build_graph();
        let grid = graph.find_by_name(group, GRID_NODE).unwrap();

        let children = graph.children(grid);
        assert_eq!(children.len(), 2);
        for id in children {
            match &graph.get(*id).unwrap().kind {
                NodeKind::Lines { material, .. } => {
                    assert_eq!(material.opacity, 0.15);
                    assert!(material.transparent);
                    assert!(!material.depth_write);
                }
                other => panic!("unexpected grid child: {:?}", other),
            }
        }
    }

    #[test]
    fn test_tool_head_attaches_once() {
        let mut builder = SceneBuilder::new(VisualizerConfig::default());
        let mut stage = builder.build(Box::new(HeadlessRenderer::new()), 800.0, 600.0);
        let mut textures = DelayedTextures::after(1);

        assert!(!builder.poll_tool_head(&mut stage, &mut textures, false, Vec3::ZERO));
        assert!(stage.tool_head().is_none());
        assert!(builder.poll_tool_head(&mut stage, &mut textures, false, Vec3::ZERO));
        assert!(!builder.poll_tool_head(&mut stage, &mut textures, false, Vec3::ZERO));

        let head = stage.graph().get(stage.tool_head().unwrap()).unwrap();
        assert!(!head.visible);
        assert_eq!(stage.frames(), 1);
        assert_eq!(stage.graph().count_named(TOOL_HEAD_NODE), 1);
    }

    #[test]
    fn test_texture_failure_still_attaches() {
        let mut builder = SceneBuilder::new(VisualizerConfig::default());
        let mut stage = builder.build(Box::new(HeadlessRenderer::new()), 800.0, 600.0);
        let mut textures = DelayedTextures::failing("not found");

        assert!(builder.poll_tool_head(&mut stage, &mut textures, true, Vec3::ZERO));
        let head = stage.graph().get(stage.tool_head().unwrap()).unwrap();
        match &head.kind {
            NodeKind::ToolHead(mesh) => assert!(mesh.texture.is_none()),
            other => panic!("unexpected tool head: {:?}", other),
        }
    }
}
