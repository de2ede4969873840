//! The live scene: graph, camera rig, renderer, and pivot.
//!
//! Everything that mutates what ends up on screen goes through a
//! [`Stage`], so the pivot invariant (children of the group are shifted by
//! the negated pivot) is maintained in one place.

use super::backend::RenderBackend;
use super::camera::CameraRig;
use super::pivot::PivotPoint;
use super::scene::{NodeId, SceneGraph, TOOL_HEAD_NODE};
use glam::Vec3;
use std::cell::Cell;
use std::rc::Rc;

pub struct Stage {
    graph: SceneGraph,
    group: NodeId,
    rig: CameraRig,
    renderer: Box<dyn RenderBackend>,
    pivot: PivotPoint,
    pivot_shift: Rc<Cell<Vec3>>,
    frames: u64,
}

impl Stage {
    pub fn new(
        graph: SceneGraph,
        group: NodeId,
        rig: CameraRig,
        mut renderer: Box<dyn RenderBackend>,
        width: u32,
        height: u32,
    ) -> Self {
        renderer.set_size(width, height);
        let pivot_shift = Rc::new(Cell::new(Vec3::ZERO));
        let shift = Rc::clone(&pivot_shift);
        let pivot = PivotPoint::new(Vec3::ZERO, move |delta| shift.set(shift.get() + delta));
        Self {
            graph,
            group,
            rig,
            renderer,
            pivot,
            pivot_shift,
            frames: 0,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Group holding the tool head and toolpath geometry
    pub fn group(&self) -> NodeId {
        self.group
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn render(&mut self) {
        self.renderer.render(&self.graph, self.rig.camera());
        self.frames += 1;
    }

    /// Frames drawn since the stage was created
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot.get()
    }

    /// Move the pivot and shift the group's children by the opposite delta
    pub fn set_pivot(&mut self, point: Vec3) {
        self.pivot.set_vec(point);
        let shift = self.pivot_shift.replace(Vec3::ZERO);
        if shift != Vec3::ZERO {
            tracing::debug!("Pivot moved to {:?}", point);
            self.graph.translate_children(self.group, -shift);
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.rig.set_aspect(width, height);
        self.renderer.set_size(width as u32, height as u32);
    }

    pub fn tool_head(&self) -> Option<NodeId> {
        self.graph.find_by_name(self.group, TOOL_HEAD_NODE)
    }

    /// Place the tool head, in group coordinates; false when none is attached
    pub fn set_tool_head_position(&mut self, position: Vec3) -> bool {
        match self.tool_head().and_then(|id| self.graph.get_mut(id)) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn rotate_tool_head(&mut self, angle: f32) -> bool {
        if angle == 0.0 {
            return false;
        }
        match self.tool_head().and_then(|id| self.graph.get_mut(id)) {
            Some(node) => {
                node.rotate_z(angle);
                true
            }
            None => false,
        }
    }

    pub fn set_tool_head_visible(&mut self, visible: bool) -> bool {
        match self.tool_head().and_then(|id| self.graph.get_mut(id)) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Drop everything below the root except its first child (the light)
    pub fn clear(&mut self) -> usize {
        let root = self.graph.root();
        self.graph.clear_except_first(root)
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("nodes", &self.graph.len())
            .field("pivot", &self.pivot.get())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
