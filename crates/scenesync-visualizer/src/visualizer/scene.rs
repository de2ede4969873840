//! Scene graph.
//!
//! An arena of nodes addressed by [`NodeId`]. Nodes carry a local
//! transform, a visibility flag, an optional name for lookup, and the
//! drawable they represent. Rendering backends walk the graph read-only.

use super::backend::Texture;
use super::toolpath::ToolpathGeometry;
use glam::{Quat, Vec3};
use std::collections::HashMap;

pub const SCENE_NODE: &str = "Scene";
pub const GROUP_NODE: &str = "Group";
pub const GRID_NODE: &str = "GridLine";
pub const AXES_NODE: &str = "CoordinateAxes";
pub const TOOL_HEAD_NODE: &str = "ToolHead";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::hex(0xffffff);
    pub const RED: Color = Color::hex(0xff0000);
    pub const GREEN: Color = Color::hex(0x00ff00);
    pub const BLUE: Color = Color::hex(0x0000ff);
    pub const DEEP_SKY_BLUE: Color = Color::hex(0x00bfff);
    pub const SILVER: Color = Color::hex(0xc0c0c0);
    pub const GRAY_25: Color = Color::hex(0x404040);
    pub const GRAY_44: Color = Color::hex(0x707070);
    pub const GRAY_60: Color = Color::hex(0x999999);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color from a `0xRRGGBB` literal
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
}

impl Material {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
        }
    }

    /// See-through material that never occludes what is drawn after it
    pub fn overlay(color: Color, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            transparent: true,
            depth_write: false,
        }
    }
}

/// Billboard text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub size: f32,
    pub material: Material,
}

/// Spindle placeholder drawn at the machine position
#[derive(Debug, Clone, PartialEq)]
pub struct ToolHeadMesh {
    pub radius: f32,
    pub height: f32,
    pub color: Color,
    /// `None` when the texture could not be loaded
    pub texture: Option<Texture>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    AmbientLight { color: Color },
    /// Line list; every two vertices form one line
    Lines { vertices: Vec<Vec3>, material: Material },
    Label(TextLabel),
    ToolHead(ToolHeadMesh),
    Toolpath(ToolpathGeometry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.visible = !hidden;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Rotate about the local Z axis
    pub fn rotate_z(&mut self, angle: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_z(angle)).normalize();
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u32,
}

impl SceneGraph {
    /// Graph holding only the root node
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::group().named(SCENE_NODE));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Returns `None` when the parent does not exist.
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        Some(id)
    }

    /// Detach `id` and drop its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        true
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(Node::children).unwrap_or(&[])
    }

    /// Depth-first search below `from` (inclusive) for the first node called `name`
    pub fn find_by_name(&self, from: NodeId, name: &str) -> Option<NodeId> {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(&id)?;
            if node.has_name(name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Number of nodes anywhere in the graph called `name`
    pub fn count_named(&self, name: &str) -> usize {
        self.nodes.values().filter(|node| node.has_name(name)).count()
    }

    pub fn translate(&mut self, id: NodeId, delta: Vec3) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.position += delta;
        }
    }

    /// Shift every direct child of `parent` by `delta`
    pub fn translate_children(&mut self, parent: NodeId, delta: Vec3) {
        let children = self.children(parent).to_vec();
        for child in children {
            self.translate(child, delta);
        }
    }

    /// Remove every child of `parent` except the first; returns how many went
    pub fn clear_except_first(&mut self, parent: NodeId) -> usize {
        let doomed: Vec<NodeId> = self.children(parent).iter().skip(1).copied().collect();
        doomed.into_iter().filter(|id| self.remove(*id)).count()
    }

    /// Position of `id` in root coordinates, ignoring rotations
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        let mut node = self.nodes.get(&id)?;
        let mut position = node.position;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            position += parent.position;
            node = parent;
        }
        Some(position)
    }

    /// Visit visible nodes depth-first, skipping hidden subtrees
    pub fn visit_visible<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &Node),
    {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            visit(id, node);
            stack.extend(node.children.iter().rev());
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
