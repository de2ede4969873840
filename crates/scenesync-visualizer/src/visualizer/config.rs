//! Visualizer configuration.
//!
//! Every constant the scene, camera, controls, animation, and layout depend
//! on lives here so hosts can tune them from a `.json` or `.toml` file.

use glam::Vec3;
use scenesync_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 70.0,
            near: 0.001,
            far: 10000.0,
            position: Vec3::new(0.0, 0.0, 200.0),
        }
    }
}

/// Trackball control tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Fraction of the pending drag applied per update, in (0, 1]
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub no_rotate: bool,
    pub no_zoom: bool,
    pub no_pan: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.5,
            pan_speed: 1.0,
            damping_factor: 0.15,
            min_distance: 1.0,
            max_distance: 5000.0,
            no_rotate: false,
            no_zoom: false,
            no_pan: false,
        }
    }
}

/// Grid, axes, and tick labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub x_length: f32,
    pub x_spacing: f32,
    pub y_length: f32,
    pub y_spacing: f32,
    pub opacity: f32,
    pub axis_length: f32,
    /// Distance between tick labels along each axis
    pub label_interval: u32,
    pub label_size: f32,
    pub label_opacity: f32,
    pub axis_label_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_length: 600.0,
            x_spacing: 10.0,
            y_length: 600.0,
            y_spacing: 10.0,
            opacity: 0.15,
            axis_length: 300.0,
            label_interval: 50,
            label_size: 8.0,
            label_opacity: 0.5,
            axis_label_size: 20.0,
        }
    }
}

/// Tool-head spin animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub rpm: f32,
    /// Frame rate the rotation step is computed for
    pub fps: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            rpm: 360.0,
            fps: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub throttle_ms: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { throttle_ms: 10 }
    }
}

/// Chrome around the drawable area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub navbar_height: f32,
    pub widget_header_height: f32,
    pub border_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            navbar_height: 50.0,
            widget_header_height: 32.0,
            border_width: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Height left for the canvas in a window of `window_height`
    pub fn drawable_height(&self, window_height: f32) -> f32 {
        (window_height - self.navbar_height - self.widget_header_height - self.border_width)
            .max(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolpathConfig {
    /// Segments converted to geometry per tick while a load is in flight
    pub segments_per_tick: usize,
}

impl Default for ToolpathConfig {
    fn default() -> Self {
        Self {
            segments_per_tick: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolHeadConfig {
    pub texture_url: String,
    pub radius: f32,
    pub height: f32,
}

impl Default for ToolHeadConfig {
    fn default() -> Self {
        Self {
            texture_url: "textures/brushed-steel-texture.jpg".to_string(),
            radius: 2.0,
            height: 20.0,
        }
    }
}

/// Complete visualizer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub grid: GridConfig,
    pub animation: AnimationConfig,
    pub resize: ResizeConfig,
    pub layout: LayoutConfig,
    pub toolpath: ToolpathConfig,
    pub tool_head: ToolHeadConfig,
}

/// Upper bound on grid lines either side of an axis
const MAX_GRID_LINES: f32 = 10_000.0;

impl VisualizerConfig {
    /// Load from a `.json` or `.toml` file; missing fields keep their defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config: Self = scenesync_settings::load_from_file(path)?;
        config.validate()?;
        tracing::info!("Loaded visualizer config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        scenesync_settings::save_to_file(self, path)?;
        Ok(())
    }

    /// Reject values the scene cannot be built with
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(Error::config(format!(
                "camera.fov must be in (0, 180), got {}",
                camera.fov
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(Error::config(format!(
                "camera clip planes must satisfy 0 < near < far, got {} / {}",
                camera.near, camera.far
            )));
        }

        let controls = &self.controls;
        if !(controls.min_distance > 0.0 && controls.max_distance >= controls.min_distance) {
            return Err(Error::config(format!(
                "controls distance range {}..{} is invalid",
                controls.min_distance, controls.max_distance
            )));
        }
        if !(controls.damping_factor > 0.0 && controls.damping_factor <= 1.0) {
            return Err(Error::config(format!(
                "controls.damping_factor must be in (0, 1], got {}",
                controls.damping_factor
            )));
        }

        let grid = &self.grid;
        for (axis, length, spacing) in [
            ("x", grid.x_length, grid.x_spacing),
            ("y", grid.y_length, grid.y_spacing),
        ] {
            if !(length > 0.0 && length.is_finite()) {
                return Err(Error::config(format!(
                    "grid.{}_length must be positive, got {}",
                    axis, length
                )));
            }
            if !(spacing > 0.0 && length / spacing <= MAX_GRID_LINES) {
                return Err(Error::config(format!(
                    "grid.{}_spacing {} gives more than {} lines per side",
                    axis, spacing, MAX_GRID_LINES
                )));
            }
        }
        if grid.label_interval == 0 {
            return Err(Error::config("grid.label_interval must be positive"));
        }

        if !(self.animation.fps > 0.0 && self.animation.fps.is_finite()) {
            return Err(Error::config(format!(
                "animation.fps must be positive, got {}",
                self.animation.fps
            )));
        }
        if !self.animation.rpm.is_finite() {
            return Err(Error::config(format!(
                "animation.rpm must be finite, got {}",
                self.animation.rpm
            )));
        }
        if self.toolpath.segments_per_tick == 0 {
            return Err(Error::config("toolpath.segments_per_tick must be positive"));
        }
        Ok(())
    }
}
