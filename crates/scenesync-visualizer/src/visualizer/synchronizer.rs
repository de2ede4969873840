//! Scene synchronizer.
//!
//! Owns the stage and reconciles it with everything that can change it:
//! connection, telemetry, workflow, toolpath, window size, settings, and
//! camera input. Event sources only enqueue into the synchronizer's
//! inbox; all scene work happens in [`SceneSynchronizer::tick`], on the thread
//! that owns the handle.

use super::backend::{RenderBackend, TextureSource, ViewportSource};
use super::builder::SceneBuilder;
use super::camera::{DragMode, PanDirection};
use super::config::VisualizerConfig;
use super::resize::ResizeCoalescer;
use super::scheduler::{AnimationGate, AnimationState, RenderScheduler};
use super::stage::Stage;
use super::state::RenderState;
use super::toolpath::{LoadResult, ToolpathGeometry, ToolpathLoader};
use glam::Vec3;
use scenesync_core::{
    thread_safe, AppEvent, BoundingBox, ConnectionEvent, EventBus, EventCategory, EventFilter,
    MachineEvent, Result, SettingsEvent, SubscriptionId, TelemetryState, ThreadSafeDeque,
    ToolpathDescription, ToolpathEvent, UiEvent, WorkPosition, WorkflowState,
};
use scenesync_settings::{ListenerId, SettingsStore, ANIMATION_KEY};
use serde_json::Value;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Collaborators handed to [`SceneSynchronizer::init`]
pub struct SyncDeps {
    pub bus: Arc<EventBus>,
    pub settings: Arc<SettingsStore>,
    pub renderer: Box<dyn RenderBackend>,
    pub viewport: Box<dyn ViewportSource>,
    pub textures: Box<dyn TextureSource>,
    /// Port already connected when the visualizer is mounted
    pub initial_port: Option<String>,
}

enum Envelope {
    Event(AppEvent),
    LoadSettled(LoadResult),
}

/// Queue between event sources and the tick loop; closed on teardown
#[derive(Clone)]
struct Inbox {
    queue: ThreadSafeDeque<Envelope>,
    open: Arc<AtomicBool>,
}

impl Inbox {
    fn new() -> Self {
        Self {
            queue: thread_safe(VecDeque::new()),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    fn push(&self, envelope: Envelope) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        self.queue.lock().push_back(envelope);
        true
    }

    fn drain(&self) -> Vec<Envelope> {
        self.queue.lock().drain(..).collect()
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.queue.lock().clear();
    }
}

type RenderStateObserver = Box<dyn FnMut(&RenderState)>;

pub struct SceneSynchronizer {
    config: VisualizerConfig,
    bus: Arc<EventBus>,
    stage: Option<Stage>,
    builder: SceneBuilder,
    loader: ToolpathLoader,
    scheduler: RenderScheduler,
    resize: ResizeCoalescer,
    viewport: Box<dyn ViewportSource>,
    textures: Box<dyn TextureSource>,
    inbox: Inbox,
    render_state: RenderState,
    ui_revision: u64,
    observers: Vec<RenderStateObserver>,
    parser_state: Value,
    work_position: WorkPosition,
    animation_enabled: bool,
    busy: bool,
    position_updates: u64,
    viewport_updates: u64,
    now: Instant,
}

impl SceneSynchronizer {
    /// Build the scene, subscribe to every event source, and size the
    /// viewport. The returned handle owns the subscriptions.
    pub fn init(config: VisualizerConfig, deps: SyncDeps) -> Result<SyncHandle> {
        config.validate()?;
        let SyncDeps {
            bus,
            settings,
            renderer,
            viewport,
            textures,
            initial_port,
        } = deps;

        let animation_enabled = settings.get_bool(ANIMATION_KEY, true).unwrap_or_else(|err| {
            warn!("Ignoring animation setting: {}", err);
            true
        });

        let width = viewport.container_width().max(1.0);
        let height = config.layout.drawable_height(viewport.window_height());
        let builder = SceneBuilder::new(config.clone());
        let stage = builder.build(renderer, width, height);
        let inbox = Inbox::new();

        let events = inbox.clone();
        let subscription = bus.subscribe(
            EventFilter::Categories(vec![
                EventCategory::Connection,
                EventCategory::Machine,
                EventCategory::Toolpath,
                EventCategory::Settings,
            ]),
            move |event| {
                events.push(Envelope::Event(event));
            },
        );

        let resizes = inbox.clone();
        let resize_subscription = bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Ui]),
            move |event| {
                if event == AppEvent::Ui(UiEvent::Resize) {
                    resizes.push(Envelope::Event(event));
                }
            },
        );

        let changes = inbox.clone();
        let settings_listener = settings.on_change(move |key, value| {
            if key == ANIMATION_KEY {
                changes.push(Envelope::Event(AppEvent::Settings(SettingsEvent::Changed {
                    key: key.to_string(),
                    value: value.to_json(),
                })));
            }
        });

        let mut sync = SceneSynchronizer {
            loader: ToolpathLoader::new(config.toolpath.segments_per_tick),
            scheduler: RenderScheduler::new(&config.animation),
            resize: ResizeCoalescer::new(Duration::from_millis(config.resize.throttle_ms)),
            config,
            bus: Arc::clone(&bus),
            stage: Some(stage),
            builder,
            viewport,
            textures,
            inbox,
            render_state: RenderState::with_port(initial_port.unwrap_or_default()),
            ui_revision: 0,
            observers: Vec::new(),
            parser_state: Value::Null,
            work_position: WorkPosition::new(0.0, 0.0, 0.0),
            animation_enabled,
            busy: false,
            position_updates: 0,
            viewport_updates: 0,
            now: Instant::now(),
        };
        sync.apply_resize();
        info!(
            "Visualizer mounted ({}x{}, animation {})",
            width,
            height,
            if animation_enabled { "on" } else { "off" }
        );

        Ok(SyncHandle {
            sync,
            bus,
            settings,
            subscription: Some(subscription),
            resize_subscription: Some(resize_subscription),
            settings_listener: Some(settings_listener),
        })
    }

    /// One cooperative step, driven by the host once per animation frame
    pub fn tick(&mut self, now: Instant) {
        if self.stage.is_none() {
            return;
        }
        self.now = now;
        self.pump();
        if self.resize.poll(now) {
            self.apply_resize();
        }
        self.poll_tool_head();
        if let Some(stage) = self.stage.as_mut() {
            self.loader.poll(stage);
        }
        self.pump();
        self.run_frame();
        self.run_drag();
    }

    /// Handle one event immediately, bypassing the bus
    pub fn dispatch(&mut self, event: AppEvent) {
        if self.stage.is_none() {
            return;
        }
        debug!("Dispatching {}", event.description());
        match event {
            AppEvent::Connection(ConnectionEvent::PortChanged { port }) => {
                self.on_port_changed(port.unwrap_or_default())
            }
            AppEvent::Machine(MachineEvent::Telemetry(state)) => self.on_telemetry(state),
            AppEvent::Machine(MachineEvent::WorkflowStateChanged(state)) => {
                self.on_workflow_state(state)
            }
            AppEvent::Toolpath(ToolpathEvent::Load(description)) => self.on_load(description),
            AppEvent::Toolpath(ToolpathEvent::Unload) => self.on_unload(),
            AppEvent::Toolpath(ToolpathEvent::Progress { sent }) => self.on_progress(sent),
            AppEvent::Toolpath(ToolpathEvent::BoundingBoxComputed(_))
            | AppEvent::Toolpath(ToolpathEvent::LoadFailed { .. }) => {}
            AppEvent::Ui(UiEvent::Resize) => {
                self.resize.request(self.now);
            }
            AppEvent::Ui(UiEvent::Busy(_)) => {}
            AppEvent::Settings(SettingsEvent::Changed { key, value }) => {
                if key == ANIMATION_KEY {
                    match value.as_bool() {
                        Some(enabled) => self.set_animation_enabled(enabled),
                        None => warn!("Ignoring non-boolean {} = {}", key, value),
                    }
                }
            }
        }
    }

    fn pump(&mut self) {
        loop {
            let batch = self.inbox.drain();
            if batch.is_empty() {
                break;
            }
            for envelope in batch {
                match envelope {
                    Envelope::Event(event) => self.dispatch(event),
                    Envelope::LoadSettled(result) => self.on_load_settled(result),
                }
            }
        }
    }

    fn commit<F>(&mut self, change: F) -> bool
    where
        F: FnOnce(&mut RenderState),
    {
        let mut next = self.render_state.clone();
        change(&mut next);
        if next == self.render_state {
            return false;
        }
        debug!("Render state committed: {:?}", next);
        self.render_state = next;
        self.ui_revision += 1;
        for observer in self.observers.iter_mut() {
            observer(&self.render_state);
        }
        self.scheduler.request_frame();
        true
    }

    fn publish(&self, event: AppEvent) {
        if let Err(err) = self.bus.publish(event) {
            trace!("Published event had no audience: {}", err);
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.publish(AppEvent::Ui(UiEvent::Busy(busy)));
        }
    }

    fn on_port_changed(&mut self, port: String) {
        if port.is_empty() {
            self.publish(AppEvent::Toolpath(ToolpathEvent::Unload));
            self.commit(|state| *state = RenderState::default());
        } else {
            self.commit(|state| state.port = port);
        }
    }

    fn on_telemetry(&mut self, telemetry: TelemetryState) {
        let TelemetryState {
            status,
            parser_state,
        } = telemetry;
        self.parser_state = parser_state;

        if status.active_state != self.render_state.active_state {
            self.commit(|state| state.active_state = status.active_state);
        }

        if status.work_position == self.work_position {
            return;
        }
        self.work_position = status.work_position;

        if let Some(stage) = self.stage.as_mut() {
            let position = self.work_position.resolve() - stage.pivot();
            stage.set_tool_head_position(position);
            stage.render();
            self.position_updates += 1;
            trace!("Tool head moved to {:?}", position);
        }
    }

    fn on_workflow_state(&mut self, workflow_state: WorkflowState) {
        if workflow_state != self.render_state.workflow_state {
            self.commit(|state| state.workflow_state = workflow_state);
        }
    }

    fn on_load(&mut self, description: ToolpathDescription) {
        self.set_busy(true);
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let inbox = self.inbox.clone();
        self.loader.load(
            stage,
            description,
            Box::new(move |result| {
                inbox.push(Envelope::LoadSettled(result));
            }),
        );
        self.commit(|state| state.ready = false);
    }

    fn on_load_settled(&mut self, result: LoadResult) {
        match result {
            Ok(loaded) => {
                let bounding_box = loaded.bounding_box;
                self.publish(AppEvent::Toolpath(ToolpathEvent::BoundingBoxComputed(
                    bounding_box,
                )));
                self.commit(|state| {
                    state.ready = true;
                    state.bounding_box = bounding_box;
                });
                self.set_busy(false);
            }
            Err(err) => {
                self.set_busy(false);
                self.commit(|state| {
                    state.ready = false;
                    state.bounding_box = BoundingBox::default();
                });
                self.publish(AppEvent::Toolpath(ToolpathEvent::LoadFailed {
                    reason: err.to_string(),
                }));
            }
        }
    }

    fn on_unload(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let abandoned = self.loader.unload(stage);
        self.commit(|state| state.ready = false);
        if abandoned {
            self.set_busy(false);
        }
    }

    fn on_progress(&mut self, sent: usize) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        if self.loader.set_progress(stage, sent) {
            stage.render();
        }
    }

    fn set_animation_enabled(&mut self, enabled: bool) {
        if enabled == self.animation_enabled {
            return;
        }
        self.animation_enabled = enabled;
        debug!("Tool head animation setting: {}", enabled);
        if let Some(stage) = self.stage.as_mut() {
            stage.set_tool_head_visible(enabled);
            stage.render();
        }
        self.scheduler.request_frame();
    }

    fn apply_resize(&mut self) {
        let width = self.viewport.container_width().max(1.0);
        let height = self
            .config
            .layout
            .drawable_height(self.viewport.window_height());
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        stage.resize(width, height);
        stage.render();
        self.viewport_updates += 1;
        debug!("Viewport resized to {}x{}", width, height);
    }

    fn poll_tool_head(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let position = self.work_position.resolve() - stage.pivot();
        self.builder.poll_tool_head(
            stage,
            self.textures.as_mut(),
            self.animation_enabled,
            position,
        );
    }

    fn gate(&self) -> AnimationGate {
        AnimationGate {
            animation_enabled: self.animation_enabled,
            active_state: self.render_state.active_state,
            workflow_state: self.render_state.workflow_state,
        }
    }

    fn run_frame(&mut self) {
        let gate = self.gate();
        if let Some(stage) = self.stage.as_mut() {
            self.scheduler.on_frame(gate, stage);
        }
    }

    fn run_drag(&mut self) {
        if let Some(stage) = self.stage.as_mut() {
            if stage.rig().is_dragging() {
                stage.rig_mut().update();
                stage.render();
            }
        }
    }

    fn ready_stage(&mut self) -> Option<&mut Stage> {
        if !(self.render_state.ready && self.loader.is_loaded()) {
            return None;
        }
        self.stage.as_mut()
    }

    pub fn pan(&mut self, direction: PanDirection) -> bool {
        let Some(stage) = self.ready_stage() else {
            return false;
        };
        if !stage.rig_mut().pan_step(direction) {
            return false;
        }
        stage.render();
        true
    }

    pub fn pan_up(&mut self) -> bool {
        self.pan(PanDirection::Up)
    }

    pub fn pan_down(&mut self) -> bool {
        self.pan(PanDirection::Down)
    }

    pub fn pan_left(&mut self) -> bool {
        self.pan(PanDirection::Left)
    }

    pub fn pan_right(&mut self) -> bool {
        self.pan(PanDirection::Right)
    }

    /// Restore the default camera pose; no-op until a toolpath is ready
    pub fn reset_view(&mut self) -> bool {
        let Some(stage) = self.ready_stage() else {
            return false;
        };
        stage.rig_mut().reset_view();
        stage.render();
        true
    }

    pub fn look_at(&mut self, x: f32, y: f32, z: f32) -> bool {
        let Some(stage) = self.stage.as_mut() else {
            return false;
        };
        stage.rig_mut().look_at(Vec3::new(x, y, z));
        stage.render();
        true
    }

    /// Start a camera drag; the camera follows on every tick until
    /// [`SceneSynchronizer::end_drag`]
    pub fn begin_drag(&mut self, mode: DragMode) -> bool {
        let Some(stage) = self.stage.as_mut() else {
            return false;
        };
        if !stage.rig_mut().begin_drag(mode) {
            return false;
        }
        stage.render();
        true
    }

    pub fn drag(&mut self, dx: f32, dy: f32) {
        if let Some(stage) = self.stage.as_mut() {
            stage.rig_mut().drag(dx, dy);
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(stage) = self.stage.as_mut() {
            stage.rig_mut().end_drag();
        }
    }

    /// Register a callback run after every committed render-state change
    pub fn on_render_state_change<F>(&mut self, observer: F)
    where
        F: FnMut(&RenderState) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    /// Bumped on every committed render-state change
    pub fn ui_revision(&self) -> u64 {
        self.ui_revision
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn animation_enabled(&self) -> bool {
        self.animation_enabled
    }

    pub fn animation_state(&self) -> AnimationState {
        self.scheduler.state()
    }

    /// Opaque parser state from the last telemetry report
    pub fn parser_state(&self) -> &Value {
        &self.parser_state
    }

    /// Tool-head moves applied from telemetry
    pub fn position_updates(&self) -> u64 {
        self.position_updates
    }

    /// Viewport recomputes, including the one at mount
    pub fn viewport_updates(&self) -> u64 {
        self.viewport_updates
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn toolpath(&self) -> Option<&ToolpathGeometry> {
        self.loader.geometry(self.stage.as_ref()?)
    }

    pub fn is_mounted(&self) -> bool {
        self.stage.is_some()
    }

    fn unmount(&mut self) {
        self.scheduler.stop();
        self.resize.cancel();
        self.inbox.close();
        if let Some(mut stage) = self.stage.take() {
            self.loader.abandon();
            let removed = stage.clear();
            stage.render();
            info!("Visualizer unmounted ({} scene nodes cleared)", removed);
        }
    }
}

impl std::fmt::Debug for SceneSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSynchronizer")
            .field("render_state", &self.render_state)
            .field("animation_enabled", &self.animation_enabled)
            .field("busy", &self.busy)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// Mounted visualizer; releases every subscription on teardown or drop
pub struct SyncHandle {
    sync: SceneSynchronizer,
    bus: Arc<EventBus>,
    settings: Arc<SettingsStore>,
    subscription: Option<SubscriptionId>,
    resize_subscription: Option<SubscriptionId>,
    settings_listener: Option<ListenerId>,
}

impl SyncHandle {
    /// Stop animating, release all subscriptions, and clear the scene
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.sync.scheduler.stop();
        if let Some(id) = self.resize_subscription.take() {
            self.bus.unsubscribe(id);
        }
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(id);
        }
        if let Some(id) = self.settings_listener.take() {
            self.settings.remove_listener(id);
        }
        self.sync.unmount();
    }
}

impl Deref for SyncHandle {
    type Target = SceneSynchronizer;

    fn deref(&self) -> &Self::Target {
        &self.sync
    }
}

impl DerefMut for SyncHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sync
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("sync", &self.sync)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}
