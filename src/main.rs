//! Headless demo: mounts the visualizer, streams a scripted job over the
//! event bus from a separate thread, and ticks the scene until it ends.

use anyhow::Context;
use glam::Vec3;
use scenesync::{
    init_logging, ActiveState, AppEvent, ConnectionEvent, DelayedTextures, EventBus,
    HeadlessRenderer, MachineEvent, MotionKind, PathSegment, SceneSynchronizer, SettingsStore,
    SharedViewport, SyncDeps, TelemetryState, ToolpathDescription, ToolpathEvent, UiEvent,
    VisualizerConfig, WorkPosition, WorkflowState, BUILD_DATE, VERSION,
};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

const FRAME: Duration = Duration::from_millis(16);

fn square_pocket(size: f32, depth: f32, passes: usize) -> ToolpathDescription {
    let mut segments = vec![PathSegment::line(
        MotionKind::Rapid,
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
    )];
    for pass in 1..=passes {
        let z = -depth * pass as f32 / passes as f32;
        segments.push(PathSegment::new(
            MotionKind::Feed,
            vec![
                Vec3::new(0.0, 0.0, z),
                Vec3::new(size, 0.0, z),
                Vec3::new(size, size, z),
                Vec3::new(0.0, size, z),
                Vec3::new(0.0, 0.0, z),
            ],
        ));
    }
    ToolpathDescription::new(segments)
}

fn stream_job(bus: &EventBus, toolpath: ToolpathDescription) {
    let publish = |event: AppEvent| {
        if let Err(err) = bus.publish(event) {
            tracing::warn!("Demo event dropped: {}", err);
        }
    };

    publish(AppEvent::Connection(ConnectionEvent::PortChanged {
        port: Some("/dev/ttyUSB0".to_string()),
    }));
    let points: Vec<Vec3> = toolpath
        .segments
        .iter()
        .flat_map(|segment| segment.points.iter().copied())
        .collect();
    let segment_count = toolpath.len();
    publish(AppEvent::Toolpath(ToolpathEvent::Load(toolpath)));
    thread::sleep(FRAME * 4);

    publish(AppEvent::Machine(MachineEvent::WorkflowStateChanged(
        WorkflowState::Running,
    )));
    for (i, point) in points.iter().enumerate() {
        let position = WorkPosition::new(point.x as f64, point.y as f64, point.z as f64);
        publish(AppEvent::Machine(MachineEvent::Telemetry(TelemetryState::new(
            ActiveState::Run,
            position,
        ))));
        publish(AppEvent::Toolpath(ToolpathEvent::Progress {
            sent: (i * segment_count / points.len().max(1)).min(segment_count),
        }));
        thread::sleep(FRAME);
    }

    publish(AppEvent::Ui(UiEvent::Resize));
    publish(AppEvent::Machine(MachineEvent::WorkflowStateChanged(
        WorkflowState::Idle,
    )));
    thread::sleep(FRAME * 2);
    publish(AppEvent::Connection(ConnectionEvent::PortChanged { port: None }));
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    info!("SceneSync {} (built {})", VERSION, BUILD_DATE);

    let config = match std::env::args().nth(1) {
        Some(path) => VisualizerConfig::load_from_file(Path::new(&path))
            .with_context(|| format!("loading visualizer config from {}", path))?,
        None => VisualizerConfig::default(),
    };

    let bus = Arc::new(EventBus::new());
    let settings = Arc::new(SettingsStore::with_defaults());
    let renderer = HeadlessRenderer::new();
    let frames = renderer.frame_log();
    let viewport = SharedViewport::new(1280.0, 883.0);

    let mut handle = SceneSynchronizer::init(
        config,
        SyncDeps {
            bus: Arc::clone(&bus),
            settings: Arc::clone(&settings),
            renderer: Box::new(renderer),
            viewport: Box::new(viewport.clone()),
            textures: Box::new(DelayedTextures::after(3)),
            initial_port: None,
        },
    )
    .context("mounting visualizer")?;

    let producer = {
        let bus = Arc::clone(&bus);
        thread::Builder::new()
            .name("job-stream".to_string())
            .spawn(move || stream_job(&bus, square_pocket(100.0, 6.0, 3)))
            .context("spawning job stream")?
    };

    viewport.set(1024.0, 683.0);
    while !producer.is_finished() {
        handle.tick(std::time::Instant::now());
        thread::sleep(FRAME);
    }
    if producer.join().is_err() {
        anyhow::bail!("job stream thread panicked");
    }
    for _ in 0..4 {
        handle.tick(std::time::Instant::now());
        thread::sleep(FRAME);
    }

    let log = frames.borrow().clone();
    info!(
        "Rendered {} frames at {}x{}; {} tool-head moves; final state {:?}",
        log.frames,
        log.width,
        log.height,
        handle.position_updates(),
        handle.render_state()
    );

    handle.teardown();
    Ok(())
}
