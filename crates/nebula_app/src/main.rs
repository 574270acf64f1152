// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nebula - headless particle scene runner
//!
//! Loads a scene config, builds the scene (particles, text, camera), starts
//! the camera sequence when one is configured and runs a fixed-rate frame
//! loop, logging a summary at the end.

mod cli;

use clap::Parser;
use cli::Cli;
use nebula_scene::{AssetLoader, FrameLoop, FrameRecorder, SceneConfig, SceneContext};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "nebula_app=info,nebula_scene=info,nebula_sequencer=info";

fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Nebula v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!("Nebula failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> nebula_scene::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    cli.apply(&mut config);

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let loader = AssetLoader::new(&cli.assets);
    let mut context = runtime.block_on(SceneContext::init(config, &loader, &mut rng))?;

    for missing in context.missing_assets() {
        if let Some(path) = missing.asset_path() {
            tracing::warn!("Rendering without {:?}", path);
        }
    }

    let mut recorder = FrameRecorder::new();
    let summary = FrameLoop::new(cli.fps).run(&mut context, &mut recorder, cli.frames)?;

    let camera = context.camera().position;
    tracing::info!(
        "Rendered {} frames ({:.2}s), camera travelled {:.2} and ended at ({:.2}, {:.2}, {:.2})",
        summary.frames,
        summary.elapsed,
        recorder.camera_travel(),
        camera.x,
        camera.y,
        camera.z
    );
    match (context.sequencer(), context.sequence_outcome()) {
        (Some(sequencer), Some(outcome)) => {
            tracing::info!("Sequence `{}` {:?}", sequencer.sequence().name, outcome);
        }
        (Some(sequencer), None) => {
            tracing::info!(
                "Sequence `{}` still {:?} at {:.2}s",
                sequencer.sequence().name,
                sequencer.status(),
                sequencer.position()
            );
        }
        (None, _) => {}
    }
    Ok(())
}
