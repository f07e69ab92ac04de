//! Keel Engine Runtime
//!
//! Headless binary: loads settings, builds the configured scene and drives
//! it with the fixed-step loop.

use anyhow::{Context, Result};
use clap::Parser;
use keel_render::HeadlessRenderer;
use keel_runtime::{Application, DecaySystem, GameState, SpinSystem};
use keel_scene::SceneManager;
use keel_services::EngineSettings;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "keel", version, about = "Run a Keel scene headless")]
struct Args {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(long, default_value = "keel.json")]
    config: PathBuf,

    /// Scene file to build; overrides `scene.path` from the settings.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Run this many ticks as fast as possible, then exit.
    #[arg(long)]
    ticks: Option<u64>,
}

/// Logs scene metrics once per simulated second.
struct MetricsReporter {
    elapsed: Duration,
}

impl GameState for MetricsReporter {
    fn update(&mut self, scene: &mut SceneManager, ts: Duration) -> Result<()> {
        self.elapsed += ts;
        if self.elapsed >= Duration::from_secs(1) {
            self.elapsed = Duration::ZERO;
            let metrics = scene.metrics();
            tracing::info!(
                scene = metrics.scene.as_deref().unwrap_or("-"),
                prototypes = metrics.prototypes_total_alive,
                instances = metrics.instances_total_alive,
                released = metrics.entities_total_released,
                "scene metrics"
            );
        }
        Ok(())
    }
}

fn run(args: Args, settings: EngineSettings) -> Result<()> {
    let mut scene = SceneManager::new(Box::new(HeadlessRenderer::new()))
        .context("failed to register engine components")?;
    scene.register_system(
        "spin",
        Box::new(SpinSystem {
            radians_per_second: 1.0,
        }),
    )?;
    scene.register_system("decay", Box::new(DecaySystem { per_second: 1.0 }))?;

    let scene_path = args.scene.or(settings.scene.path.clone());
    if let Some(path) = scene_path {
        let id = settings.scene.id.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scene".into())
        });
        scene
            .create_scene(&id, &path)
            .with_context(|| format!("failed to build scene '{id}' from {}", path.display()))?;
    } else {
        tracing::warn!("no scene configured; running an empty world");
    }

    let state = MetricsReporter {
        elapsed: Duration::ZERO,
    };
    let mut app = Application::new(&settings, scene, Box::new(state));
    match args.ticks {
        Some(ticks) => app.run_ticks(ticks)?,
        None => app.run_realtime(u64::from(settings.simulation.tick_rate_hz) * 10)?,
    }

    let metrics = app.scene_mut().metrics().clone();
    tracing::info!(
        ticks = app.time().tick_count(),
        entities = metrics.entities_total_alive,
        created = metrics.entities_total_created,
        "runtime finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = EngineSettings::load_or_default(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(settings.logging.max_level()?)
        .init();
    tracing::info!("Keel Engine v{}", keel_core::VERSION);

    if let Err(err) = run(args, settings) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}
