//! Toolpath loading.
//!
//! A description is turned into geometry a bounded number of segments per
//! tick. Only when every segment converted cleanly is the geometry
//! attached to the scene; a failure leaves the scene as the preceding
//! unload left it. Each load gets a generation number, and anything that
//! unloads or starts a new load abandons the build in flight.

use super::scene::{Color, Node, NodeId, NodeKind};
use super::stage::Stage;
use glam::Vec3;
use scenesync_core::{BoundingBox, MotionKind, ToolpathDescription, ToolpathError};

pub const TOOLPATH_NODE: &str = "ToolpathGeometry";

/// Contiguous vertices produced from one path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryRun {
    pub motion: MotionKind,
    pub start: usize,
    pub len: usize,
}

/// Polyline geometry of a loaded toolpath
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolpathGeometry {
    vertices: Vec<Vec3>,
    runs: Vec<GeometryRun>,
    frame_index: usize,
}

impl ToolpathGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_run(&mut self, motion: MotionKind, points: &[Vec3]) {
        self.runs.push(GeometryRun {
            motion,
            start: self.vertices.len(),
            len: points.len(),
        });
        self.vertices.extend_from_slice(points);
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn runs(&self) -> &[GeometryRun] {
        &self.runs
    }

    pub fn segment_count(&self) -> usize {
        self.runs.len()
    }

    /// Segments already executed by the machine
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Mark the first `index` segments as executed; true when it changed
    pub fn set_frame_index(&mut self, index: usize) -> bool {
        let index = index.min(self.runs.len());
        if index == self.frame_index {
            return false;
        }
        self.frame_index = index;
        true
    }

    pub fn run_color(&self, run: usize) -> Color {
        if run < self.frame_index {
            return Color::GRAY_60;
        }
        match self.runs.get(run).map(|r| r.motion) {
            Some(MotionKind::Rapid) => Color::GREEN,
            Some(MotionKind::Arc) => Color::DEEP_SKY_BLUE,
            _ => Color::BLUE,
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter())
    }
}

/// Summary of a completed load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedToolpath {
    pub bounding_box: BoundingBox,
    pub segments: usize,
    pub vertices: usize,
}

pub type LoadResult = Result<LoadedToolpath, ToolpathError>;

/// Invoked exactly once when a load settles, unless it is abandoned
pub type LoadCallback = Box<dyn FnOnce(LoadResult)>;

struct PendingBuild {
    generation: u64,
    description: ToolpathDescription,
    next_segment: usize,
    geometry: ToolpathGeometry,
    on_done: LoadCallback,
}

pub struct ToolpathLoader {
    segments_per_tick: usize,
    generation: u64,
    pending: Option<PendingBuild>,
    node: Option<NodeId>,
}

impl ToolpathLoader {
    pub fn new(segments_per_tick: usize) -> Self {
        Self {
            segments_per_tick: segments_per_tick.max(1),
            generation: 0,
            pending: None,
            node: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.node.is_some()
    }

    pub fn geometry<'a>(&self, stage: &'a Stage) -> Option<&'a ToolpathGeometry> {
        match &stage.graph().get(self.node?)?.kind {
            NodeKind::Toolpath(geometry) => Some(geometry),
            _ => None,
        }
    }

    /// Unload, then start building `description`.
    ///
    /// The build advances in [`ToolpathLoader::poll`]; `on_done` runs when
    /// it settles.
    pub fn load(&mut self, stage: &mut Stage, description: ToolpathDescription, on_done: LoadCallback) {
        self.unload(stage);
        tracing::info!(
            "Loading toolpath with {} segments (generation {})",
            description.len(),
            self.generation
        );
        self.pending = Some(PendingBuild {
            generation: self.generation,
            description,
            next_segment: 0,
            geometry: ToolpathGeometry::new(),
            on_done,
        });
    }

    /// Remove any toolpath, reset pivot and view, render once.
    ///
    /// A build in flight is abandoned without calling its callback.
    /// Returns true if one was.
    pub fn unload(&mut self, stage: &mut Stage) -> bool {
        let abandoned = self.abandon();

        if let Some(node) = self.node.take() {
            stage.graph_mut().remove(node);
        }
        let group = stage.group();
        while let Some(stale) = stage.graph().find_by_name(group, TOOLPATH_NODE) {
            stage.graph_mut().remove(stale);
        }

        stage.set_pivot(Vec3::ZERO);
        stage.rig_mut().reset_view();
        stage.render();
        abandoned
    }

    /// Drop the build in flight, if any, without calling its callback
    pub fn abandon(&mut self) -> bool {
        self.generation += 1;
        let abandoned = self.pending.take().is_some();
        if abandoned {
            tracing::debug!("Abandoned toolpath build in flight");
        }
        abandoned
    }

    /// Advance the build in flight by up to `segments_per_tick` segments.
    ///
    /// Returns true while a build is still pending afterwards.
    pub fn poll(&mut self, stage: &mut Stage) -> bool {
        let Some(mut build) = self.pending.take() else {
            return false;
        };
        if build.generation != self.generation {
            return false;
        }

        let end = (build.next_segment + self.segments_per_tick).min(build.description.len());
        for index in build.next_segment..end {
            let segment = &build.description.segments[index];
            if let Err(err) = validate_segment(index, &segment.points) {
                tracing::warn!("Toolpath load failed: {}", err);
                (build.on_done)(Err(err));
                return false;
            }
            build.geometry.push_run(segment.motion, &segment.points);
        }
        build.next_segment = end;

        if build.next_segment < build.description.len() {
            self.pending = Some(build);
            return true;
        }

        let loaded = self.attach(stage, build.geometry);
        (build.on_done)(Ok(loaded));
        false
    }

    fn attach(&mut self, stage: &mut Stage, geometry: ToolpathGeometry) -> LoadedToolpath {
        let bounding_box = geometry.bounding_box().unwrap_or_default();
        let loaded = LoadedToolpath {
            bounding_box,
            segments: geometry.segment_count(),
            vertices: geometry.vertices().len(),
        };

        let group = stage.group();
        while let Some(stale) = stage.graph().find_by_name(group, TOOLPATH_NODE) {
            stage.graph_mut().remove(stale);
        }
        let node = Node::new(NodeKind::Toolpath(geometry)).named(TOOLPATH_NODE);
        self.node = stage.graph_mut().add(group, node);

        stage.set_pivot(bounding_box.center());
        let size = bounding_box.size();
        stage
            .rig_mut()
            .fit_to_bounding_box(size.x, size.y, Vec3::new(0.0, 0.0, bounding_box.max.z));
        stage.render();

        tracing::info!(
            "Toolpath loaded: {} segments, bounds {}",
            loaded.segments,
            bounding_box
        );
        loaded
    }

    /// Mark `sent` segments as executed; true when the geometry changed
    pub fn set_progress(&mut self, stage: &mut Stage, sent: usize) -> bool {
        let Some(node) = self.node else {
            return false;
        };
        match stage.graph_mut().get_mut(node).map(|node| &mut node.kind) {
            Some(NodeKind::Toolpath(geometry)) => geometry.set_frame_index(sent),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ToolpathLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolpathLoader")
            .field("segments_per_tick", &self.segments_per_tick)
            .field("generation", &self.generation)
            .field("loading", &self.is_loading())
            .field("node", &self.node)
            .finish()
    }
}

fn validate_segment(segment: usize, points: &[Vec3]) -> Result<(), ToolpathError> {
    if points.len() < 2 {
        return Err(ToolpathError::DegenerateSegment {
            segment,
            points: points.len(),
        });
    }
    match points.iter().position(|p| !p.is_finite()) {
        Some(point) => Err(ToolpathError::NonFiniteCoordinate { segment, point }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::backend::HeadlessRenderer;
    use crate::visualizer::camera::CameraRig;
    use crate::visualizer::config::{CameraConfig, ControlsConfig};
    use crate::visualizer::scene::SceneGraph;
    use scenesync_core::PathSegment;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stage() -> Stage {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add(root, Node::group()).unwrap();
        let rig = CameraRig::new(
            &CameraConfig::default(),
            &ControlsConfig::default(),
            800.0,
            600.0,
        );
        Stage::new(graph, group, rig, Box::new(HeadlessRenderer::new()), 800, 600)
    }

    fn square(n: usize) -> ToolpathDescription {
        let segments = (0..n)
            .map(|i| {
                let z = i as f32;
                PathSegment::line(
                    MotionKind::Feed,
                    Vec3::new(0.0, 0.0, z),
                    Vec3::new(100.0, 50.0, z),
                )
            })
            .collect();
        ToolpathDescription::new(segments)
    }

    fn capture() -> (LoadCallback, Rc<RefCell<Vec<LoadResult>>>) {
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        (Box::new(move |r| sink.borrow_mut().push(r)), results)
    }

    #[test]
    fn test_incremental_build() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(2);
        let (on_done, results) = capture();

        loader.load(&mut stage, square(5), on_done);
        assert!(loader.poll(&mut stage));
        assert!(loader.poll(&mut stage));
        assert!(results.borrow().is_empty());
        assert!(!loader.poll(&mut stage));

        let results = results.borrow();
        let loaded = results[0].as_ref().unwrap();
        assert_eq!(loaded.segments, 5);
        assert_eq!(
            loaded.bounding_box,
            BoundingBox::new(Vec3::ZERO, Vec3::new(100.0, 50.0, 4.0))
        );
        assert!(loader.is_loaded());
        assert_eq!(stage.pivot(), Vec3::new(50.0, 25.0, 2.0));
        assert_eq!(stage.graph().count_named(TOOLPATH_NODE), 1);
    }

    #[test]
    fn test_failure_leaves_no_geometry() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(16);
        let (on_done, results) = capture();

        let mut description = square(3);
        description.segments[1].points.truncate(1);
        loader.load(&mut stage, description, on_done);
        assert!(!loader.poll(&mut stage));

        assert_eq!(
            results.borrow()[0],
            Err(ToolpathError::DegenerateSegment {
                segment: 1,
                points: 1
            })
        );
        assert!(!loader.is_loaded());
        assert_eq!(stage.graph().count_named(TOOLPATH_NODE), 0);
        assert_eq!(stage.pivot(), Vec3::ZERO);
    }

    #[test]
    fn test_non_finite_rejected() {
        let points = [Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0)];
        assert_eq!(
            validate_segment(4, &points),
            Err(ToolpathError::NonFiniteCoordinate {
                segment: 4,
                point: 1
            })
        );
    }

    #[test]
    fn test_superseded_build_never_completes() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(1);
        let (first, first_results) = capture();
        let (second, second_results) = capture();

        loader.load(&mut stage, square(3), first);
        loader.poll(&mut stage);
        loader.load(&mut stage, square(1), second);
        while loader.poll(&mut stage) {}

        assert!(first_results.borrow().is_empty());
        assert_eq!(second_results.borrow().len(), 1);
        assert_eq!(stage.graph().count_named(TOOLPATH_NODE), 1);
    }

    #[test]
    fn test_abandoned_build_drops_callback() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(1);
        let (on_done, results) = capture();

        loader.load(&mut stage, square(4), on_done);
        assert!(loader.poll(&mut stage));
        assert!(loader.abandon());
        assert!(!loader.is_loading());
        assert!(!loader.poll(&mut stage));
        assert!(!loader.abandon());

        assert!(results.borrow().is_empty());
        assert_eq!(stage.graph().count_named(TOOLPATH_NODE), 0);
    }

    #[test]
    fn test_reload_keeps_single_node() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(64);
        for _ in 0..3 {
            let (on_done, _) = capture();
            loader.load(&mut stage, square(2), on_done);
            while loader.poll(&mut stage) {}
        }
        assert_eq!(stage.graph().count_named(TOOLPATH_NODE), 1);
    }

    #[test]
    fn test_unload_resets() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(64);
        let (on_done, _) = capture();
        loader.load(&mut stage, square(2), on_done);
        loader.poll(&mut stage);

        assert!(!loader.unload(&mut stage));
        assert!(!loader.is_loaded());
        assert_eq!(stage.pivot(), Vec3::ZERO);
        assert_eq!(stage.rig().camera().position, Vec3::new(0.0, 0.0, 200.0));
        assert!(stage.rig().last_fit().is_none());
    }

    #[test]
    fn test_empty_toolpath_has_zero_bounds() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(8);
        let (on_done, results) = capture();
        loader.load(&mut stage, ToolpathDescription::default(), on_done);
        assert!(!loader.poll(&mut stage));
        assert_eq!(
            results.borrow()[0].as_ref().unwrap().bounding_box,
            BoundingBox::default()
        );
    }

    #[test]
    fn test_progress_marks_executed_segments() {
        let mut stage = stage();
        let mut loader = ToolpathLoader::new(8);
        let (on_done, _) = capture();
        loader.load(&mut stage, square(4), on_done);
        loader.poll(&mut stage);

        assert!(loader.set_progress(&mut stage, 2));
        assert!(!loader.set_progress(&mut stage, 2));
        let geometry = loader.geometry(&stage).unwrap();
        assert_eq!(geometry.frame_index(), 2);
        assert_eq!(geometry.run_color(1), Color::GRAY_60);
        assert_eq!(geometry.run_color(2), Color::BLUE);

        assert!(loader.set_progress(&mut stage, 99));
        assert_eq!(loader.geometry(&stage).unwrap().frame_index(), 4);
    }
}
