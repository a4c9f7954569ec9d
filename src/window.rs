//! Demo window: drives a [`Simulation`] from a winit event loop.
//!
//! Controls:
//! - `1` / `2` / `3` select Fox, Book, Humanoid
//! - `D` toggles manual colors
//! - `Space` pauses, `R` restarts, `Esc` quits
//! - left drag orbits, wheel zooms

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::MorphConfig;
use crate::error::SimulationError;
use crate::gpu::{Camera, GpuContext, SpriteRenderer};
use crate::shape::{Shape, ShapeLibrary};
use crate::simulation::Simulation;
use crate::time::FrameClock;

/// Open a window and run the morph until it is closed.
pub fn run(config: MorphConfig, library: ShapeLibrary) -> Result<(), SimulationError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, library);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    renderer: SpriteRenderer,
    simulation: Simulation,
}

struct App {
    config: MorphConfig,
    library: Option<ShapeLibrary>,
    state: Option<Running>,
    clock: FrameClock,
    camera: Camera,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<SimulationError>,
}

impl App {
    fn new(config: MorphConfig, library: ShapeLibrary) -> Self {
        Self {
            config,
            library: Some(library),
            state: None,
            clock: FrameClock::new(),
            camera: Camera::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let Some(library) = self.library.take() else {
            return Ok(());
        };

        let window_attrs = Window::default_attributes()
            .with_title("Particle Morph")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();

        let instance = GpuContext::default_instance();
        let surface = instance
            .create_surface(window.clone())
            .map_err(crate::error::GpuError::from)?;
        let ctx = Arc::new(pollster::block_on(GpuContext::new(instance, Some(&surface)))?);

        let renderer = SpriteRenderer::new(&ctx, surface, size.width, size.height);
        let mut simulation = Simulation::new(ctx, self.config.clone(), library)?;
        simulation.init()?;
        self.clock.reset();

        window.request_redraw();
        self.state = Some(Running {
            window,
            renderer,
            simulation,
        });
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SimulationError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        if code == KeyCode::Escape {
            event_loop.exit();
            return;
        }
        let Some(state) = &mut self.state else {
            return;
        };
        let sim = &mut state.simulation;

        match code {
            KeyCode::Digit1 => sim.select_shape(Shape::Fox),
            KeyCode::Digit2 => sim.select_shape(Shape::Book),
            KeyCode::Digit3 => sim.select_shape(Shape::Humanoid),
            KeyCode::KeyD => {
                let enabled = sim.toggle_manual_colors();
                log::info!("Manual colors {}", if enabled { "on" } else { "off" });
            }
            KeyCode::Space => {
                self.clock.toggle_pause();
                log::info!("{}", if self.clock.is_paused() { "Paused" } else { "Resumed" });
            }
            KeyCode::KeyR => {
                if let Err(e) = sim.init() {
                    self.fail(event_loop, e);
                    return;
                }
                self.clock.reset();
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let tick = self.clock.tick();
        if let Err(e) = state.simulation.update(tick.delta) {
            self.fail(event_loop, e);
            return;
        }

        let sim = &state.simulation;
        match state.renderer.render(
            sim.context(),
            &self.camera,
            sim.instance_buffer(),
            sim.particle_count(),
        ) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                state.renderer.reconfigure(sim.context());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if tick.frame % 300 == 0 && tick.frame > 0 {
            log::debug!("{:.1} fps", self.clock.fps());
        }
        state.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(state) = &mut self.state {
                    state.renderer.resize(
                        state.simulation.context(),
                        physical_size.width,
                        physical_size.height,
                    );
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        self.camera
                            .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
