use anyhow::{Context, Result};
use boxfall_input::{
    InputBus, MouseButton, MouseEvent, OrbitBinding, TouchEvent, TouchPhase, TouchPoint,
};
use boxfall_kernel::RapierBackend;
use boxfall_render_wgpu::BoxRenderer;
use boxfall_view::{DemoConfig, View};
use clap::Parser;
use glam::{Vec2, Vec3};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "boxfall-desktop", about = "Falling boxes with an orbit camera")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file (missing fields keep their defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Pixels of trackpad scroll treated as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 100.0;

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: BoxRenderer,
}

impl Gpu {
    fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("boxfall_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = BoxRenderer::new(&device, format, config.width, config.height);
        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct DesktopApp {
    view: View<RapierBackend>,
    bus: InputBus,
    _binding: OrbitBinding,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    last_frame: Instant,
    cursor: Option<Vec2>,
    touches: BTreeMap<u64, TouchPoint>,
}

impl DesktopApp {
    fn new(config: DemoConfig) -> Self {
        let view = View::with_rapier(config);
        let bus = InputBus::new();
        let binding = view.bind_input(&bus);
        Self {
            view,
            bus,
            _binding: binding,
            window: None,
            gpu: None,
            last_frame: Instant::now(),
            cursor: None,
            touches: BTreeMap::new(),
        }
    }

    fn cursor_moved(&mut self, x: f32, y: f32) {
        let point = Vec2::new(x, y);
        let delta = self.cursor.map_or(Vec2::ZERO, |last| point - last);
        self.cursor = Some(point);
        self.bus.dispatch(
            &MouseEvent::Move {
                x,
                y,
                dx: delta.x,
                dy: delta.y,
            }
            .into(),
        );
    }

    fn mouse_button(&mut self, button: winit::event::MouseButton, state: ElementState) {
        let button = match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Back => MouseButton::Other(3),
            winit::event::MouseButton::Forward => MouseButton::Other(4),
            winit::event::MouseButton::Other(n) => MouseButton::Other(n),
        };
        let Vec2 { x, y } = self.cursor.unwrap_or(Vec2::ZERO);
        let event = match state {
            ElementState::Pressed => MouseEvent::Down { button, x, y },
            ElementState::Released => MouseEvent::Up { button, x, y },
        };
        self.bus.dispatch(&event.into());
    }

    fn touch(&mut self, touch: winit::event::Touch) {
        let point = TouchPoint::new(
            touch.id,
            touch.location.x as f32,
            touch.location.y as f32,
        );
        let phase = match touch.phase {
            winit::event::TouchPhase::Started => {
                self.touches.insert(touch.id, point);
                TouchPhase::Start
            }
            winit::event::TouchPhase::Moved => {
                self.touches.insert(touch.id, point);
                TouchPhase::Move
            }
            winit::event::TouchPhase::Ended => {
                self.touches.remove(&touch.id);
                TouchPhase::End
            }
            winit::event::TouchPhase::Cancelled => {
                self.touches.remove(&touch.id);
                TouchPhase::Cancel
            }
        };
        let touches = self.touches.values().copied().collect();
        self.bus.dispatch(&TouchEvent::new(phase, touches).into());
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Space => {
                let focal = *self.view.orbit().focal_point().value();
                let position = Vec3::new(focal.x, focal.y + 4.0, focal.z);
                match self.view.spawn_box(position, Vec3::splat(0.5)) {
                    Ok(id) => tracing::info!(%id, "spawned box"),
                    Err(e) => tracing::warn!("spawn failed: {e}"),
                }
            }
            KeyCode::Delete | KeyCode::Backspace => {
                let last = self.view.simulation().bodies().keys().next_back().copied();
                if let Some(id) = last {
                    match self.view.remove_box(id) {
                        Ok(()) => tracing::info!(%id, "removed box"),
                        Err(e) => tracing::warn!("remove failed: {e}"),
                    }
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f64();
        self.last_frame = now;
        self.view.tick(dt);

        let Some(gpu) = &self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &target,
            &self.view.camera_view(),
            self.view.registry(),
        );
        output.present();
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("boxfall")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match Gpu::new(window.clone()) {
            Ok(gpu) => {
                self.view
                    .set_viewport(gpu.config.width as f32, gpu.config.height as f32);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.view
                        .set_viewport(gpu.config.width as f32, gpu.config.height as f32);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(key);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.bus.dispatch(&MouseEvent::Leave.into());
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling away from the user as positive
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(p) => -(p.y as f32) / PIXELS_PER_NOTCH,
                };
                self.bus.dispatch(&MouseEvent::Wheel { delta }.into());
            }
            WindowEvent::Touch(touch) => {
                self.touch(touch);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DemoConfig::default(),
    };

    tracing::info!("boxfall-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
