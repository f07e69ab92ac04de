//! Keel Engine Editor
//!
//! Builds a scene, runs it for a few ticks with the inspector overlay and
//! prints the panels.

use anyhow::{Context, Result};
use clap::Parser;
use keel_editor::{EditorUiState, InspectorOverlay};
use keel_render::HeadlessRenderer;
use keel_runtime::{Application, IdleState};
use keel_scene::SceneManager;
use keel_services::EngineSettings;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "keel-editor", version, about = "Inspect a Keel scene")]
struct Args {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(long, default_value = "keel.json")]
    config: PathBuf,

    /// Scene file to open; overrides `scene.path` from the settings.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Ticks to simulate before printing the panels.
    #[arg(long, default_value_t = 1)]
    ticks: u64,

    /// Prefab to expand in the prefab panel.
    #[arg(long)]
    prefab: Option<String>,

    /// Named entity to inspect.
    #[arg(long)]
    select: Option<String>,

    /// Only list entries containing this text.
    #[arg(long, default_value = "")]
    filter: String,

    /// Also list prototype entities.
    #[arg(long)]
    prototypes: bool,
}

fn run(args: Args, settings: EngineSettings) -> Result<()> {
    let mut scene = SceneManager::new(Box::new(HeadlessRenderer::new()))
        .context("failed to register engine components")?;

    let path = args
        .scene
        .or(settings.scene.path.clone())
        .context("no scene given; pass --scene or set scene.path")?;
    let id = settings.scene.id.clone().unwrap_or_else(|| "editor".into());
    scene
        .create_scene(&id, &path)
        .with_context(|| format!("failed to open scene {}", path.display()))?;

    let mut state = EditorUiState {
        selected_prefab: args.prefab,
        filter: args.filter,
        show_prototypes: args.prototypes,
        ..EditorUiState::default()
    };
    if let Some(name) = &args.select {
        let entity = scene
            .named_entities()
            .get(name)
            .copied()
            .with_context(|| format!("no entity named '{name}'"))?;
        state.selected_entity = Some(entity);
    }

    let mut app = Application::new(&settings, scene, Box::new(IdleState))
        .with_overlay(Box::new(InspectorOverlay::new(state.clone(), 60)));
    app.run_ticks(args.ticks)?;

    let mut overlay = InspectorOverlay::new(state, 1);
    print!("{}", overlay.render(app.scene_mut()));
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = EngineSettings::load_or_default(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(settings.logging.max_level()?)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("Keel Editor v{}", keel_core::VERSION);

    if let Err(err) = run(args, settings) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}
