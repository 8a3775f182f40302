use boxfall_input::{InputBus, MouseButton, MouseEvent};
use boxfall_kernel::{PhysicsBackend, RapierBackend};
use boxfall_render::{DebugTextRenderer, Renderer};
use boxfall_smooth::Easing;
use boxfall_view::{DemoConfig, FrameStats, View};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boxfall-cli", about = "Headless runner for the box demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the default configuration
    Info,
    /// Simulate the box scene and print interpolated frames
    Run {
        /// Number of render frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Render frame rate; may differ from the physics step rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Print the scene every N frames (text mode)
        #[arg(long, default_value = "30")]
        every: u64,
        /// JSON config file (missing fields keep their defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Emit one JSON object per frame instead of text
        #[arg(long)]
        json: bool,
    },
    /// Feed a scripted drag and wheel through the input bus and print camera poses
    Orbit {
        /// Horizontal drag in pixels
        #[arg(long, default_value = "100", allow_hyphen_values = true)]
        dx: f32,
        /// Vertical drag in pixels
        #[arg(long, default_value = "-50", allow_hyphen_values = true)]
        dy: f32,
        /// Wheel notches; positive zooms out
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        wheel: f32,
        /// Frames to run after the input
        #[arg(short, long, default_value = "20")]
        frames: u32,
        /// Aim the camera from this world position before dragging
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_hyphen_values = true)]
        eye: Option<Vec<f32>>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DemoConfig> {
    Ok(match path {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    })
}

fn print_stats(stats: &FrameStats) {
    println!(
        "frame {:>4}: steps={} render_t={:.4} sim_t={:.4} fraction={} dropped={:.4}",
        stats.frame,
        stats.steps,
        stats.render_time,
        stats.sim_time,
        stats
            .fraction
            .map_or_else(|| "-".to_string(), |f| format!("{f:.3}")),
        stats.dropped,
    );
}

fn run(frames: u64, fps: f64, every: u64, config: DemoConfig, json: bool) -> anyhow::Result<()> {
    anyhow::ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");
    let frame_delta = 1.0 / fps;
    let mut view = View::with_rapier(config);
    let text = DebugTextRenderer::new();

    tracing::info!(frames, fps, sim_dt = view.simulation().dt(), "running");
    for _ in 0..frames {
        let stats = view.tick(frame_delta);
        if json {
            let mut bodies = serde_json::Map::new();
            for (_, visual) in view.registry().iter() {
                bodies.insert(visual.handle.name.clone(), serde_json::to_value(visual.pose)?);
            }
            let line = serde_json::json!({
                "frame": stats.frame,
                "steps": stats.steps,
                "render_time": stats.render_time,
                "sim_time": stats.sim_time,
                "fraction": stats.fraction,
                "dropped": stats.dropped,
                "bodies": bodies,
            });
            println!("{line}");
        } else if every > 0 && stats.frame % every == 0 {
            print_stats(&stats);
            print!("{}", text.render(view.registry(), &view.render_view()));
        }
    }

    if !json {
        let driver = view.driver();
        println!(
            "Done: frames={} steps={} sim_time={:.3}s dropped={:.3}s bodies={}",
            view.frame_count(),
            driver.total_steps(),
            view.simulation().time(),
            driver.total_dropped(),
            view.registry().len()
        );
    }
    Ok(())
}

fn orbit(dx: f32, dy: f32, wheel: f32, frames: u32, eye: Option<glam::Vec3>) {
    let mut view = View::with_rapier(DemoConfig::default());
    let bus = InputBus::new();
    let _binding = view.bind_input(&bus);

    if let Some(eye) = eye {
        let handle = view.orbit_handle();
        let mut orbit = handle.borrow_mut();
        let settle = orbit.config().transition_time;
        orbit.look_from(eye);
        // settle on the new angle so the drag starts from it
        orbit.update(settle);
    }

    let center = (640.0, 360.0);
    bus.dispatch(&MouseEvent::Move { x: center.0, y: center.1, dx: 0.0, dy: 0.0 }.into());
    bus.dispatch(&MouseEvent::Down { button: MouseButton::Left, x: center.0, y: center.1 }.into());
    bus.dispatch(
        &MouseEvent::Move { x: center.0 + dx, y: center.1 + dy, dx, dy }.into(),
    );
    bus.dispatch(&MouseEvent::Up { button: MouseButton::Left, x: center.0 + dx, y: center.1 + dy }.into());
    if wheel != 0.0 {
        bus.dispatch(&MouseEvent::Wheel { delta: wheel }.into());
    }

    let target = *view.orbit().azim_elev_distance().target();
    println!(
        "target: azimuth={:.2} elevation={:.2} distance={:.3}",
        target.x, target.y, target.z
    );
    for _ in 0..frames {
        let stats = view.tick(1.0 / 60.0);
        let cam = stats.camera;
        println!(
            "frame {:>3}: pos=({:.3}, {:.3}, {:.3}) euler=({:.2}, {:.2}, {:.2})",
            stats.frame,
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.euler_degrees.x,
            cam.euler_degrees.y,
            cam.euler_degrees.z
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("boxfall-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "kernel: rapier step dt={:.6}s",
                RapierBackend::new(glam::Vec3::new(0.0, -9.81, 0.0)).dt()
            );
            println!("render: {}", boxfall_render::crate_info());
            println!("input: {}", boxfall_input::crate_info());
            println!("view: {}", boxfall_view::crate_info());
            println!("easings: {:?}", Easing::ALL);
            println!(
                "default config:\n{}",
                serde_json::to_string_pretty(&DemoConfig::default())?
            );
        }
        Commands::Run {
            frames,
            fps,
            every,
            config,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            run(frames, fps, every, config, json)?;
        }
        Commands::Orbit {
            dx,
            dy,
            wheel,
            frames,
            eye,
        } => {
            let eye = eye.and_then(|v| match v[..] {
                [x, y, z] => Some(glam::Vec3::new(x, y, z)),
                _ => None,
            });
            orbit(dx, dy, wheel, frames, eye);
        }
    }

    Ok(())
}
