// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene errors.

use nebula_sequencer::SequenceError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or running a scene
#[derive(Debug, Error)]
pub enum SceneError {
    /// A requested texture, font or document could not be read
    #[error("Missing asset {}: {source}", path.display())]
    MissingAsset {
        /// Resolved asset path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// An asset was read but could not be decoded
    #[error("Invalid asset {}: {reason}", path.display())]
    InvalidAsset {
        /// Resolved asset path
        path: PathBuf,
        /// Decoding problem
        reason: String,
    },

    /// Configuration values out of range
    #[error("Config error: {0}")]
    Config(String),

    /// IO error outside asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// Sequence data rejected by the sequencer
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl SceneError {
    /// Path of the asset involved, if any
    pub fn asset_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::MissingAsset { path, .. } | Self::InvalidAsset { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
