// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequencer errors.

use thiserror::Error;

/// Errors raised while loading or driving a sequence
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Track data violates an invariant (ordering, missing channel, bad value)
    #[error("Malformed track data in {context}: {reason}")]
    MalformedTrackData {
        /// Where the problem was found (track, property or document path)
        context: String,
        /// What is wrong with it
        reason: String,
    },

    /// The requested sheet does not exist in the document
    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    /// Playback options out of range
    #[error("Invalid play options: {0}")]
    InvalidPlayOptions(String),

    /// JSON document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON document could not be parsed
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization failed
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
}

impl SequenceError {
    /// Shorthand for a [`SequenceError::MalformedTrackData`]
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTrackData {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a track data error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedTrackData { .. })
    }
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequenceError>;
