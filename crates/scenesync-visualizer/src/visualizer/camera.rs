use super::config::{CameraConfig, ControlsConfig};
use glam::{Mat4, Quat, Vec2, Vec3};

/// Perspective camera described by eye position, look target, and up vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov: f32, // degrees, vertical
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub up: Vec3,
    pub look_target: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(&CameraConfig::default(), 1.0)
    }
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov: config.fov,
            aspect,
            near: config.near,
            far: config.far,
            position: config.position,
            up: Vec3::Y,
            look_target: Vec3::ZERO,
        }
    }

    pub fn update_aspect_ratio(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Horizontal field of view in radians
    pub fn horizontal_fov(&self) -> f32 {
        2.0 * ((self.fov.to_radians() / 2.0).tan() * self.aspect).atan()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Zoom,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PanDirection {
    /// Screen-space pan for one step of `speed`
    fn offset(self, speed: f32) -> Vec2 {
        match self {
            PanDirection::Up => Vec2::new(0.0, speed),
            PanDirection::Down => Vec2::new(0.0, -speed),
            PanDirection::Left => Vec2::new(speed, 0.0),
            PanDirection::Right => Vec2::new(-speed, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    mode: DragMode,
    pending: Vec2,
}

/// Trackball-style interaction: orbit, dolly, and pan around a target,
/// with the drag decaying by the damping factor on each update.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackballControls {
    config: ControlsConfig,
    pub target: Vec3,
    target0: Vec3,
    position0: Vec3,
    up0: Vec3,
    drag: Option<DragState>,
}

impl TrackballControls {
    pub fn new(config: ControlsConfig, camera: &PerspectiveCamera) -> Self {
        Self {
            config,
            target: camera.look_target,
            target0: camera.look_target,
            position0: camera.position,
            up0: camera.up,
            drag: None,
        }
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|drag| drag.mode)
    }

    fn mode_enabled(&self, mode: DragMode) -> bool {
        match mode {
            DragMode::Rotate => !self.config.no_rotate,
            DragMode::Zoom => !self.config.no_zoom,
            DragMode::Pan => !self.config.no_pan,
        }
    }
}

/// Camera framing chosen by the last fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub width: f32,
    pub height: f32,
    pub look_target: Vec3,
    pub distance: f32,
}

/// The scene camera together with its interactive controls
#[derive(Debug, Clone)]
pub struct CameraRig {
    camera: PerspectiveCamera,
    controls: TrackballControls,
    last_fit: Option<CameraFit>,
}

impl CameraRig {
    pub fn new(camera: &CameraConfig, controls: &ControlsConfig, width: f32, height: f32) -> Self {
        let mut camera = PerspectiveCamera::new(camera, 1.0);
        camera.update_aspect_ratio(width, height);
        let controls = TrackballControls::new(controls.clone(), &camera);
        Self {
            camera,
            controls,
            last_fit: None,
        }
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &TrackballControls {
        &self.controls
    }

    pub fn target(&self) -> Vec3 {
        self.controls.target
    }

    pub fn last_fit(&self) -> Option<CameraFit> {
        self.last_fit
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.camera.update_aspect_ratio(width, height);
    }

    /// Place the camera on +Z of `look_target`, far enough that a
    /// `width` x `height` rectangle fills the view in both directions.
    pub fn fit_to_bounding_box(&mut self, width: f32, height: f32, look_target: Vec3) -> CameraFit {
        let vertical = height.abs() / 2.0 / (self.camera.fov.to_radians() / 2.0).tan();
        let horizontal = width.abs() / 2.0 / (self.camera.horizontal_fov() / 2.0).tan();
        let config = self.controls.config();
        let distance = vertical
            .max(horizontal)
            .clamp(config.min_distance, config.max_distance);

        self.camera.up = Vec3::Y;
        self.camera.position = look_target + Vec3::Z * distance;
        self.look_at(look_target);

        let fit = CameraFit {
            width,
            height,
            look_target,
            distance,
        };
        self.last_fit = Some(fit);
        tracing::debug!(
            "Camera fit to {}x{} looking at {:?} from {:.2}",
            width,
            height,
            look_target,
            distance
        );
        fit
    }

    /// Pan by `dx` along the camera's horizontal and `dy` along its up vector
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let eye = self.camera.position - self.controls.target;
        let offset = eye.cross(self.camera.up).normalize_or_zero() * dx
            + self.camera.up.normalize_or_zero() * dy;
        self.camera.position += offset;
        self.controls.target += offset;
        self.camera.look_target = self.controls.target;
    }

    /// One pan step at the configured speed; false when panning is disabled
    pub fn pan_step(&mut self, direction: PanDirection) -> bool {
        if self.controls.config.no_pan {
            return false;
        }
        let offset = direction.offset(self.controls.config.pan_speed);
        self.pan(offset.x, offset.y);
        true
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.controls.target = target;
        self.camera.look_target = target;
    }

    /// Return camera and controls to their initial state
    pub fn reset_view(&mut self) {
        self.controls.drag = None;
        self.controls.target = self.controls.target0;
        self.camera.position = self.controls.position0;
        self.camera.up = self.controls.up0;
        self.camera.look_target = self.controls.target0;
        self.last_fit = None;
    }

    /// Start a drag; false when the mode is disabled
    pub fn begin_drag(&mut self, mode: DragMode) -> bool {
        if !self.controls.mode_enabled(mode) {
            return false;
        }
        self.controls.drag = Some(DragState {
            mode,
            pending: Vec2::ZERO,
        });
        true
    }

    /// Accumulate pointer movement for the active drag
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if let Some(drag) = self.controls.drag.as_mut() {
            drag.pending += Vec2::new(dx, dy);
        }
    }

    pub fn end_drag(&mut self) {
        self.controls.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.controls.is_dragging()
    }

    /// Apply a damped share of the pending drag; true when the camera moved
    pub fn update(&mut self) -> bool {
        let damping = self.controls.config.damping_factor;
        let Some(drag) = self.controls.drag.as_mut() else {
            return false;
        };
        let step = drag.pending * damping;
        drag.pending -= step;
        let mode = drag.mode;
        if step.length_squared() < 1e-8 {
            return false;
        }

        match mode {
            DragMode::Rotate => self.rotate(step),
            DragMode::Zoom => self.zoom(step.y),
            DragMode::Pan => {
                let eye = self.camera.position - self.controls.target;
                let scale = eye.length() * 0.001 * self.controls.config.pan_speed;
                self.pan(step.x * scale, step.y * scale);
            }
        }
        true
    }

    fn rotate(&mut self, step: Vec2) {
        let k = self.controls.config.rotate_speed * 0.01;
        let eye = self.camera.position - self.controls.target;
        let up = self.camera.up.normalize_or_zero();
        let right = eye.cross(up).normalize_or_zero();

        let mut rotation = Quat::IDENTITY;
        if up != Vec3::ZERO {
            rotation = Quat::from_axis_angle(up, -step.x * k);
        }
        if right != Vec3::ZERO {
            rotation *= Quat::from_axis_angle(right, step.y * k);
        }

        self.camera.position = self.controls.target + rotation * eye;
        self.camera.up = (rotation * self.camera.up).normalize_or_zero();
        self.camera.look_target = self.controls.target;
    }

    fn zoom(&mut self, amount: f32) {
        let config = &self.controls.config;
        let eye = self.camera.position - self.controls.target;
        let distance = (eye.length() * (1.0 + amount * config.zoom_speed * 0.01))
            .clamp(config.min_distance, config.max_distance);
        let direction = eye.normalize_or_zero();
        if direction != Vec3::ZERO {
            self.camera.position = self.controls.target + direction * distance;
        }
    }
}
