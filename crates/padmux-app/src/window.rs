//! Overlay window shell via winit.
//!
//! The overlay is a transparent, always-on-top, click-through surface the
//! size of the target; actual painting of menu chrome is platform glue
//! driven by the engine's computed layouts. The shell owns the event loop
//! and ticks the engine from `about_to_wait` on a fixed timestep.

use std::time::Instant;

use padmux_core::Size;
use padmux_dispatch::{InputSink, SyntheticEvent};
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowLevel};

use crate::engine::Engine;
use crate::gamepad::GamepadPoller;

/// Window attributes for the transparent overlay surface.
#[must_use]
pub fn overlay_window_attributes(target: Size) -> WindowAttributes {
    WindowAttributes::default()
        .with_title("padmux overlay")
        .with_transparent(true)
        .with_decorations(false)
        .with_window_level(WindowLevel::AlwaysOnTop)
        .with_inner_size(winit::dpi::LogicalSize::new(
            f64::from(target.w.max(1)),
            f64::from(target.h.max(1)),
        ))
}

/// A sink that logs events; stands in for the platform injection layer on
/// hosts where no injector is wired up.
#[derive(Debug, Default)]
pub struct LoggingSink {
    pending: Vec<SyntheticEvent>,
}

impl InputSink for LoggingSink {
    fn push(&mut self, event: SyntheticEvent) {
        self.pending.push(event);
    }

    fn flush(&mut self) {
        for event in self.pending.drain(..) {
            debug!("synthetic input: {event:?}");
        }
    }
}

/// The winit application: window lifecycle plus the fixed-timestep tick.
pub struct OverlayShell {
    engine: Engine,
    poller: GamepadPoller,
    sink: LoggingSink,
    window: Option<Window>,
    last_tick: Instant,
    accumulator_ms: f64,
    tick_ms: f64,
}

impl OverlayShell {
    #[must_use]
    pub fn new(engine: Engine, tick_rate_hz: u32) -> Self {
        Self {
            engine,
            poller: GamepadPoller::new(),
            sink: LoggingSink::default(),
            window: None,
            last_tick: Instant::now(),
            accumulator_ms: 0.0,
            tick_ms: 1000.0 / f64::from(tick_rate_hz.max(1)),
        }
    }

    /// Runs the event loop to completion. Returns the process exit code.
    pub fn run(mut self) -> i32 {
        let event_loop = match EventLoop::new() {
            Ok(el) => el,
            Err(e) => {
                error!("could not create event loop: {e}");
                return 1;
            }
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        match event_loop.run_app(&mut self) {
            Ok(()) => i32::from(self.window.is_none() && !self.engine.should_quit()),
            Err(e) => {
                error!("event loop error: {e}");
                1
            }
        }
    }

    fn step(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.accumulator_ms += now.duration_since(self.last_tick).as_secs_f64() * 1000.0;
        self.last_tick = now;
        // Clamp a long stall instead of replaying it.
        self.accumulator_ms = self.accumulator_ms.min(250.0);

        while self.accumulator_ms >= self.tick_ms {
            self.accumulator_ms -= self.tick_ms;
            let edges = self.poller.poll();
            self.engine
                .tick(self.tick_ms as u32, &edges, &mut self.sink);
        }
        if self.engine.should_quit() {
            info!("shutting down");
            self.engine.dispatcher.cleanup(&mut self.sink);
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for OverlayShell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = overlay_window_attributes(self.engine.target_size());
        match event_loop.create_window(attributes) {
            Ok(window) => {
                info!("overlay window created");
                self.window = Some(window);
            }
            Err(e) => {
                // Window creation failure is fatal by contract.
                error!("could not create overlay window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                self.engine
                    .set_target_size(Size::new(size.width as i32, size.height as i32));
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.step(event_loop);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Headless fallback: ticks the engine without any window, for profile
/// debugging and tests on displayless hosts.
pub fn run_headless(mut engine: Engine, tick_rate_hz: u32, max_ticks: Option<u64>) -> i32 {
    let mut sink = LoggingSink::default();
    let mut poller = GamepadPoller::new();
    let tick_ms = (1000 / tick_rate_hz.max(1)).max(1);
    let mut ticks = 0u64;
    info!("running headless at {tick_rate_hz} Hz");
    loop {
        let edges = poller.poll();
        engine.tick(tick_ms, &edges, &mut sink);
        if engine.should_quit() {
            engine.dispatcher.cleanup(&mut sink);
            return 0;
        }
        ticks += 1;
        if let Some(max) = max_ticks {
            if ticks >= max {
                return 0;
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(u64::from(tick_ms)));
    }
}
