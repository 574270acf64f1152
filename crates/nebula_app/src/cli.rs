// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line interface.

use clap::Parser;
use nebula_scene::SceneConfig;
use std::path::PathBuf;

/// Render a particle nebula headlessly, optionally flying the camera along a
/// keyframe sequence
#[derive(Parser, Debug, Clone)]
#[command(name = "nebula", version)]
pub struct Cli {
    /// Scene config (RON); defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory assets are loaded from
    #[arg(long, default_value = "static")]
    pub assets: PathBuf,

    /// Keyframe document, relative to the asset directory
    #[arg(long)]
    pub sequence: Option<String>,

    /// Sheet to load from the keyframe document
    #[arg(long)]
    pub sheet: Option<String>,

    /// Loop the sequence instead of playing it once
    #[arg(long = "loop")]
    pub looping: bool,

    /// Number of frames to run
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Simulated refresh rate
    #[arg(long, default_value_t = 60.0)]
    pub fps: f32,

    /// Viewport width
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height
    #[arg(long)]
    pub height: Option<u32>,

    /// Seed for the particle field
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config
    pub fn apply(&self, config: &mut SceneConfig) {
        if let Some(sequence) = &self.sequence {
            config.sequence.document = Some(sequence.clone());
        }
        if let Some(sheet) = &self.sheet {
            config.sequence.sheet = Some(sheet.clone());
        }
        if self.looping {
            config.sequence.looping = true;
        }
        if let Some(width) = self.width {
            config.viewport.width = width;
        }
        if let Some(height) = self.height {
            config.viewport.height = height;
        }
    }
}
