use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::geometry::Vec2;
use super::metrics::MetricsAccumulator;
use super::registry::AgentId;
use super::rendering::{FramePresenter, SceneRenderer};
use super::simulation::{FrameTime, Simulation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug)]
pub struct SimulationLoop<S: FrameScheduler> {
    scheduler: S,
    max_frame_delta_ms: f64,
    running: bool,
    pending: Option<FrameHandle>,
    last_timestamp_ms: Option<f64>,
}

impl<S: FrameScheduler> SimulationLoop<S> {
    pub fn new(scheduler: S, max_frame_delta: Duration) -> Self {
        Self {
            scheduler,
            max_frame_delta_ms: max_frame_delta.as_secs_f64() * 1000.0,
            running: false,
            pending: None,
            last_timestamp_ms: None,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.pending = Some(self.scheduler.request_frame());
        info!("simulation_loop_started");
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.last_timestamp_ms = None;
        info!("simulation_loop_stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Runs one frame. Returns `false` without touching the simulation when
    /// the loop is stopped or `handle` is not the pending frame.
    pub fn run_frame(
        &mut self,
        handle: FrameHandle,
        timestamp_ms: f64,
        sim: &mut Simulation,
        render: impl FnOnce(&Simulation),
    ) -> bool {
        if !self.running || self.pending != Some(handle) {
            debug!(frame = handle.0, running = self.running, "stale_frame_ignored");
            return false;
        }
        self.pending = None;

        let dt_ms = match self.last_timestamp_ms {
            Some(previous) => (timestamp_ms - previous).clamp(0.0, self.max_frame_delta_ms),
            None => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);

        sim.update(FrameTime::new(timestamp_ms, dt_ms));
        render(sim);

        self.pending = Some(self.scheduler.request_frame());
        true
    }
}

pub trait ArenaHost {
    fn load(&mut self, sim: &mut Simulation);
    fn before_frame(&mut self, now_ms: f64, sim: &mut Simulation);
    fn on_agent_clicked(&mut self, point: Vec2, hit: Option<AgentId>, sim: &mut Simulation);
    fn unload(&mut self, sim: &mut Simulation);
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Agent Arena".to_string(),
            window_width: 800,
            window_height: 600,
            max_frame_delta: Duration::from_millis(100),
            metrics_log_interval: Duration::from_secs(5),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize frame presenter: {0}")]
    CreatePresenter(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

#[derive(Debug)]
struct WindowFrameScheduler {
    next_id: u64,
    requested: Option<FrameHandle>,
}

impl WindowFrameScheduler {
    fn new() -> Self {
        Self {
            next_id: 0,
            requested: None,
        }
    }

    fn wants_redraw(&self) -> bool {
        self.requested.is_some()
    }

    fn take_requested(&mut self) -> Option<FrameHandle> {
        self.requested.take()
    }
}

impl FrameScheduler for WindowFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = FrameHandle(self.next_id);
        self.requested = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.requested == Some(handle) {
            self.requested = None;
        }
    }
}

pub fn run_app(
    config: LoopConfig,
    mut sim: Simulation,
    mut renderer: SceneRenderer,
    mut host: Box<dyn ArenaHost>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window: Arc<Window> = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut presenter =
        FramePresenter::new(Arc::clone(&window)).map_err(AppError::CreatePresenter)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(100));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);

    let (surface_width, surface_height) = presenter.size();
    sim.resize(surface_width, surface_height);
    host.load(&mut sim);
    info!(
        width = surface_width,
        height = surface_height,
        agents = sim.agents().len(),
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "arena_loaded"
    );

    let started = Instant::now();
    let mut sim_loop = SimulationLoop::new(WindowFrameScheduler::new(), max_frame_delta);
    let mut input_collector = InputCollector::default();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, started);
    let mut last_frame_instant = started;
    let mut last_present_instant = started;
    sim_loop.start();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = presenter.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "presenter_resize_failed");
                        window_target.exit();
                        return;
                    }
                    sim.resize(new_size.width, new_size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let escape = matches!(event.physical_key, PhysicalKey::Code(KeyCode::Escape));
                    if escape && event.state == ElementState::Pressed {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let timestamp_ms = now.saturating_duration_since(started).as_secs_f64() * 1000.0;
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    if let Some(point) = input_collector.take_left_click() {
                        let hit = sim.hit_test(point).map(|agent| agent.id.clone());
                        debug!(x = point.x, y = point.y, hit = ?hit, "arena_clicked");
                        host.on_agent_clicked(point, hit, &mut sim);
                    }
                    host.before_frame(timestamp_ms, &mut sim);

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let mut present_result = Ok(());
                    let ran = match sim_loop.scheduler_mut().take_requested() {
                        Some(handle) => sim_loop.run_frame(handle, timestamp_ms, &mut sim, |sim| {
                            present_result = presenter.present(sim, &mut renderer);
                        }),
                        None => false,
                    };
                    if !ran {
                        present_result = presenter.present(&sim, &mut renderer);
                    }
                    if let Err(error) = present_result {
                        warn!(error = %error, "presenter_draw_failed");
                        window_target.exit();
                        return;
                    }
                    last_present_instant = Instant::now();

                    metrics_accumulator.record_frame(raw_frame_dt, sim.last_collision_events().len());
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            max_frame_time_ms = snapshot.max_frame_time_ms,
                            collisions_per_s = snapshot.collisions_per_s,
                            agents = sim.agents().len(),
                            particles = sim.particles().len(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if sim_loop.scheduler().wants_redraw() {
                    window.request_redraw();
                }
            }
            Event::LoopExiting => {
                sim_loop.stop();
                host.unload(&mut sim);
                info!(frames = sim.frame_count(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    cursor_position: Option<Vec2>,
    left_mouse_is_down: bool,
    left_click_pressed_edge: Option<Vec2>,
}

impl InputCollector {
    fn set_cursor_position(&mut self, x: f32, y: f32) {
        self.cursor_position = Some(Vec2::new(x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position = None;
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.left_click_pressed_edge = self.cursor_position;
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => self.left_mouse_is_down = false,
        }
    }

    fn take_left_click(&mut self) -> Option<Vec2> {
        self.left_click_pressed_edge.take()
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::app::config::SimConfig;

    #[derive(Debug, Default)]
    struct ManualScheduler {
        next_id: u64,
        requested: Vec<FrameHandle>,
        cancelled: Vec<FrameHandle>,
    }

    impl FrameScheduler for ManualScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            let handle = FrameHandle(self.next_id);
            self.requested.push(handle);
            handle
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.cancelled.push(handle);
        }
    }

    fn simulation() -> Simulation {
        Simulation::new(SimConfig::default(), Box::new(SmallRng::seed_from_u64(5)))
            .expect("default config is valid")
    }

    fn sim_loop() -> SimulationLoop<ManualScheduler> {
        SimulationLoop::new(ManualScheduler::default(), Duration::from_millis(100))
    }

    #[test]
    fn frames_before_start_are_ignored() {
        let mut sim = simulation();
        let mut sim_loop = sim_loop();
        let mut rendered = 0;

        assert!(!sim_loop.run_frame(FrameHandle(1), 0.0, &mut sim, |_| rendered += 1));
        assert_eq!(rendered, 0);
        assert_eq!(sim.frame_count(), 0);
    }

    #[test]
    fn first_frame_has_zero_dt_and_requests_next() {
        let mut sim = simulation();
        let mut sim_loop = sim_loop();
        sim_loop.start();
        let first = sim_loop.pending_frame().expect("pending");

        let mut rendered = 0;
        assert!(sim_loop.run_frame(first, 5_000.0, &mut sim, |_| rendered += 1));
        assert_eq!(rendered, 1);
        assert_eq!(sim.animation_clock_s(), 0.0);

        let second = sim_loop.pending_frame().expect("next frame requested");
        assert_ne!(first, second);
        assert!(sim_loop.run_frame(second, 5_016.0, &mut sim, |_| {}));
        assert!((sim.animation_clock_s() - 0.016).abs() < 1e-9);
    }

    #[test]
    fn large_gaps_are_clamped_and_backwards_time_is_zero() {
        let mut sim = simulation();
        let mut sim_loop = sim_loop();
        sim_loop.start();

        let frame = sim_loop.pending_frame().expect("pending");
        sim_loop.run_frame(frame, 0.0, &mut sim, |_| {});
        let frame = sim_loop.pending_frame().expect("pending");
        sim_loop.run_frame(frame, 10_000.0, &mut sim, |_| {});
        assert!((sim.animation_clock_s() - 0.1).abs() < 1e-9);

        let frame = sim_loop.pending_frame().expect("pending");
        sim_loop.run_frame(frame, 9_000.0, &mut sim, |_| {});
        assert!((sim.animation_clock_s() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut sim = simulation();
        let mut sim_loop = sim_loop();
        sim_loop.start();
        let first = sim_loop.pending_frame().expect("pending");
        assert!(sim_loop.run_frame(first, 0.0, &mut sim, |_| {}));

        assert!(!sim_loop.run_frame(first, 16.0, &mut sim, |_| {}));
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn stop_cancels_pending_frame_and_forgets_timestamp() {
        let mut sim = simulation();
        let mut sim_loop = sim_loop();
        sim_loop.start();
        let frame = sim_loop.pending_frame().expect("pending");
        sim_loop.run_frame(frame, 1_000.0, &mut sim, |_| {});
        let pending = sim_loop.pending_frame().expect("pending");

        sim_loop.stop();
        assert!(!sim_loop.is_running());
        assert_eq!(sim_loop.scheduler().cancelled, vec![pending]);
        assert!(!sim_loop.run_frame(pending, 1_016.0, &mut sim, |_| {}));

        sim_loop.start();
        let restarted = sim_loop.pending_frame().expect("pending");
        sim_loop.run_frame(restarted, 9_000.0, &mut sim, |_| {});
        assert_eq!(sim.animation_clock_s(), 0.0);
    }

    #[test]
    fn window_scheduler_only_cancels_matching_request() {
        let mut scheduler = WindowFrameScheduler::new();
        let first = scheduler.request_frame();
        scheduler.cancel_frame(FrameHandle(first.0 + 7));
        assert!(scheduler.wants_redraw());
        scheduler.cancel_frame(first);
        assert!(!scheduler.wants_redraw());
    }

    #[test]
    fn left_click_is_edge_triggered_at_cursor() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.take_left_click(), None);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);

        input.set_cursor_position(10.0, 20.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.take_left_click(), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(input.take_left_click(), None);
    }

    #[test]
    fn cap_sleep_covers_remaining_frame_budget() {
        let target = target_frame_duration(normalize_render_fps_cap(Some(50)));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(5), target),
            Duration::from_millis(15)
        );
        assert_eq!(compute_cap_sleep(Duration::from_millis(25), target), Duration::ZERO);
        assert_eq!(target_frame_duration(normalize_render_fps_cap(Some(0))), None);
    }
}
