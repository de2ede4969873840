//! Data models for machine telemetry and toolpaths
//!
//! This module provides:
//! - Machine active state and job workflow state
//! - Raw telemetry payloads as reported by the controller connection
//! - Toolpath descriptions handed to the visualizer for geometry building
//! - Axis-aligned bounding boxes

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ToolpathError;

/// Machine-reported execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActiveState {
    /// Connected and idle, ready for commands
    Idle,
    /// Executing motion
    Run,
    /// Feed hold
    Hold,
    /// Manual jog
    Jog,
    /// Alarm lock
    Alarm,
    /// Safety door open
    Door,
    /// Check (dry-run) mode
    Check,
    /// Homing cycle
    Home,
    /// Sleep mode
    Sleep,
    /// No report received yet, or a state this crate does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ActiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActiveState::Unknown => "Unknown",
            ActiveState::Idle => "Idle",
            ActiveState::Run => "Run",
            ActiveState::Hold => "Hold",
            ActiveState::Jog => "Jog",
            ActiveState::Alarm => "Alarm",
            ActiveState::Door => "Door",
            ActiveState::Check => "Check",
            ActiveState::Home => "Home",
            ActiveState::Sleep => "Sleep",
        };
        write!(f, "{}", name)
    }
}

/// Job-execution mode of the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// No job running
    #[default]
    Idle,
    /// Job streaming
    Running,
    /// Job paused
    Paused,
    /// Unrecognised workflow state
    #[serde(other)]
    Unknown,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "idle"),
            WorkflowState::Running => write!(f, "running"),
            WorkflowState::Paused => write!(f, "paused"),
            WorkflowState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Coerce a raw telemetry coordinate into a number.
///
/// Numbers pass through, numeric strings are parsed, booleans map to 1/0.
/// Everything else (missing, empty, garbage, NaN) becomes 0.
pub fn coerce_coordinate(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Work position exactly as reported, before coercion.
///
/// Kept raw so that repeated identical reports can be detected with deep
/// equality regardless of how the controller formats its numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPosition {
    /// X component
    #[serde(default)]
    pub x: Value,
    /// Y component
    #[serde(default)]
    pub y: Value,
    /// Z component
    #[serde(default)]
    pub z: Value,
}

impl WorkPosition {
    /// Create a work position from numeric components
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Value::from(x),
            y: Value::from(y),
            z: Value::from(z),
        }
    }

    /// Numeric position with malformed components coerced to zero
    pub fn resolve(&self) -> Vec3 {
        Vec3::new(
            coerce_coordinate(&self.x) as f32,
            coerce_coordinate(&self.y) as f32,
            coerce_coordinate(&self.z) as f32,
        )
    }
}

/// Status section of a telemetry report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStatusReport {
    /// Machine active state
    #[serde(rename = "activeState", default)]
    pub active_state: ActiveState,
    /// Work coordinates
    #[serde(rename = "workPosition", default)]
    pub work_position: WorkPosition,
}

/// One telemetry report: machine status plus opaque parser state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryState {
    /// Machine status
    #[serde(default)]
    pub status: MachineStatusReport,
    /// Parser/modal state, cached but never interpreted here
    #[serde(rename = "parserstate", default)]
    pub parser_state: Value,
}

impl TelemetryState {
    /// Build a report from an active state and numeric work position
    pub fn new(active_state: ActiveState, work_position: WorkPosition) -> Self {
        Self {
            status: MachineStatusReport {
                active_state,
                work_position,
            },
            parser_state: Value::Null,
        }
    }

    /// Decode a report from its JSON wire form
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a bounding box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for no points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Centre point
    pub fn center(&self) -> Vec3 {
        self.min + self.size() / 2.0
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2}, {:.2}, {:.2}] - [{:.2}, {:.2}, {:.2}]",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

/// Kind of motion a path segment represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    /// Rapid positioning
    Rapid,
    /// Linear feed move
    #[default]
    Feed,
    /// Arc, already tessellated into points
    Arc,
}

/// One polyline of the toolpath
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathSegment {
    /// Motion kind
    #[serde(default)]
    pub motion: MotionKind,
    /// Polyline points in machine coordinates
    pub points: Vec<Vec3>,
}

impl PathSegment {
    /// Create a new segment
    pub fn new(motion: MotionKind, points: Vec<Vec3>) -> Self {
        Self { motion, points }
    }

    /// Two-point segment
    pub fn line(motion: MotionKind, from: Vec3, to: Vec3) -> Self {
        Self::new(motion, vec![from, to])
    }
}

/// Structured path description handed over by whatever produced the toolpath
///
/// Producing this from program text is the job of an upstream component;
/// the visualizer only turns it into geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolpathDescription {
    /// Ordered segments
    pub segments: Vec<PathSegment>,
}

impl ToolpathDescription {
    /// Create a description from segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Decode a description from JSON
    pub fn from_json(raw: &str) -> Result<Self, ToolpathError> {
        serde_json::from_str(raw).map_err(|e| ToolpathError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when there are no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_coordinate(&json!(12.5)), 12.5);
        assert_eq!(coerce_coordinate(&json!("-3.250")), -3.25);
        assert_eq!(coerce_coordinate(&json!("  7 ")), 7.0);
    }

    #[test]
    fn test_coerce_garbage_to_zero() {
        assert_eq!(coerce_coordinate(&json!(null)), 0.0);
        assert_eq!(coerce_coordinate(&json!("")), 0.0);
        assert_eq!(coerce_coordinate(&json!("abc")), 0.0);
        assert_eq!(coerce_coordinate(&json!("NaN")), 0.0);
        assert_eq!(coerce_coordinate(&json!({"v": 1})), 0.0);
        assert_eq!(coerce_coordinate(&json!(false)), 0.0);
        assert_eq!(coerce_coordinate(&json!(true)), 1.0);
    }

    #[test]
    fn test_active_state_unknown_fallback() {
        let state: ActiveState = serde_json::from_str("\"Run\"").unwrap();
        assert_eq!(state, ActiveState::Run);
        let state: ActiveState = serde_json::from_str("\"Tool\"").unwrap();
        assert_eq!(state, ActiveState::Unknown);
    }

    #[test]
    fn test_workflow_state_lowercase() {
        let state: WorkflowState = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(state, WorkflowState::Running);
        assert_eq!(WorkflowState::Paused.to_string(), "paused");
    }

    #[test]
    fn test_bounding_box_from_points() {
        let points = [
            Vec3::new(0.0, 10.0, -1.0),
            Vec3::new(100.0, 0.0, 5.0),
            Vec3::new(20.0, 50.0, 20.0),
        ];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bbox.max, Vec3::new(100.0, 50.0, 20.0));
        let none: [Vec3; 0] = [];
        assert!(BoundingBox::from_points(&none).is_none());
    }

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox::new(Vec3::ZERO, Vec3::new(100.0, 50.0, 20.0));
        assert_eq!(bbox.center(), Vec3::new(50.0, 25.0, 10.0));
    }
}
