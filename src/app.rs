//! Application shell: window, event loop, input glue.
//!
//! Thin by design — all shader management happens inside
//! `graphics::Renderer`; this module only translates window events into the
//! renderer's explicit calls (fractal switch, DEC toggle, snippet cycling)
//! and feeds the per-frame uniform table.
//!
//! # Keyboard
//!
//! - 1-7: switch fractal kind (7 = DEC preview variant)
//! - P: toggle DEC snippet preview
//! - [ / ]: cycle through bundled DEC snippets
//! - ESC: quit

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::Config;
use crate::graphics::{Globals, Renderer};
use crate::shader_gen::FractalKind;

/// Orbit camera around a fixed target.
struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
}

impl OrbitCamera {
    fn new() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.35,
            distance: 4.0,
            target: Vec3::ZERO,
        }
    }

    fn eye(&self) -> Vec3 {
        let cp = self.pitch.cos();
        self.target
            + self.distance * Vec3::new(cp * self.yaw.sin(), self.pitch.sin(), cp * self.yaw.cos())
    }
}

pub struct ForgeApp {
    config: Config,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    camera: OrbitCamera,
    size: (u32, u32),
    started: Instant,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
}

impl ForgeApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            camera: OrbitCamera::new(),
            size: (1280, 720),
            started: Instant::now(),
            dragging: false,
            last_cursor: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn init_renderer(&mut self, window: Arc<Window>) -> Result<()> {
        let mut renderer = Renderer::new(window, &self.config)?;

        let kind = FractalKind::from_name(&self.config.scene.fractal).unwrap_or_else(|| {
            tracing::warn!(
                "unknown fractal \"{}\" in config, using menger",
                self.config.scene.fractal
            );
            FractalKind::Menger
        });

        if self.config.scene.dec_snippet.is_some() {
            renderer.select_snippet(self.config.scene.dec_snippet.clone());
        }
        if self.config.scene.dec_preview {
            renderer.set_preview_enabled(true);
        }

        // Compile every variant up front so kind switches never stutter.
        renderer.prewarm(&FractalKind::ALL);
        renderer.set_fractal_kind(kind);

        self.renderer = Some(renderer);
        Ok(())
    }

    fn frame_globals(&self) -> Globals {
        let mut globals = Globals::new();
        globals.set_resolution(self.size.0, self.size.1);
        globals.set_time(self.started.elapsed().as_secs_f32());
        globals.set_camera(self.camera.eye(), self.camera.target);
        globals.params = [
            self.config.quality.max_steps as f32,
            self.config.quality.max_distance,
            self.config.quality.focal_length,
            0.0,
        ];
        globals.quality = [
            self.config.quality.fog_density,
            self.config.quality.ao_strength,
            self.config.quality.shadow_sharpness,
            0.0,
        ];
        globals
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let Some(renderer) = self.renderer.as_mut() else {
            return false;
        };

        let kind = match code {
            KeyCode::Digit1 => Some(FractalKind::Menger),
            KeyCode::Digit2 => Some(FractalKind::Mandelbulb),
            KeyCode::Digit3 => Some(FractalKind::Mandelbox),
            KeyCode::Digit4 => Some(FractalKind::Sierpinski),
            KeyCode::Digit5 => Some(FractalKind::World),
            KeyCode::Digit6 => Some(FractalKind::Truchet),
            KeyCode::Digit7 => Some(FractalKind::UserDec),
            _ => None,
        };
        if let Some(kind) = kind {
            renderer.set_fractal_kind(kind);
            self.config.scene.fractal = kind.name().to_string();
            return false;
        }

        match code {
            KeyCode::Escape => return true,
            KeyCode::KeyP => {
                let enabled = !renderer.context().preview().enabled;
                renderer.set_preview_enabled(enabled);
                self.config.scene.dec_preview = enabled;
            }
            KeyCode::BracketRight => {
                renderer.cycle_snippet(true);
                self.config.scene.dec_snippet =
                    renderer.context().preview().selected_key.clone();
            }
            KeyCode::BracketLeft => {
                renderer.cycle_snippet(false);
                self.config.scene.dec_snippet =
                    renderer.context().preview().selected_key.clone();
            }
            _ => {}
        }
        false
    }
}

impl ApplicationHandler for ForgeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes()
            .with_title("SDF Forge")
            .with_inner_size(LogicalSize::new(1280, 720));
        if self.config.video.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        match event_loop.create_window(attributes) {
            Ok(window) => {
                let window = Arc::new(window);
                let size = window.inner_size();
                self.size = (size.width.max(1), size.height.max(1));
                if let Err(e) = self.init_renderer(window.clone()) {
                    tracing::error!("Failed to initialize renderer: {:#}", e);
                    event_loop.exit();
                    return;
                }
                self.window = Some(window);
            }
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.size = (size.width.max(1), size.height.max(1));
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if self.handle_key(code) {
                            event_loop.exit();
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
                if !self.dragging {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some((lx, ly)) = self.last_cursor {
                        let dx = (position.x - lx) as f32;
                        let dy = (position.y - ly) as f32;
                        self.camera.yaw -= dx * 0.01;
                        self.camera.pitch = (self.camera.pitch + dy * 0.01).clamp(-1.45, 1.45);
                    }
                    self.last_cursor = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.05,
                };
                self.camera.distance = (self.camera.distance * (1.0 - amount * 0.1)).clamp(0.5, 40.0);
            }
            WindowEvent::RedrawRequested => {
                let globals = self.frame_globals();
                if let Some(renderer) = self.renderer.as_mut() {
                    if let Err(e) = renderer.render(&globals) {
                        tracing::error!("Render error: {:#}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Run the app to completion, persisting scene selections on exit.
pub fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::new()?;

    let mut app = ForgeApp::new(config);
    event_loop.run_app(&mut app)?;

    if let Err(e) = crate::config::save(app.config()) {
        tracing::warn!("failed to save config: {}", e);
    }
    Ok(())
}
