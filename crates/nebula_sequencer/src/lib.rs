// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe sequencer for Nebula.
//!
//! This crate provides property animation driven by keyframe documents:
//! - Per-channel keyframe tracks with linear, step and curve segments
//! - Pluggable curve interpolation
//! - JSON document loading and RON save files
//! - Playback with ranges, iterations, rate and direction
//! - Value-change subscriptions with cancellation handles
//! - An egui timeline panel
//!
//! ## Architecture
//!
//! A [`Sequencer`] owns a [`Sequence`] and a [`PlaybackState`]. Each call to
//! [`Sequencer::tick`] advances the cursor, evaluates every
//! [`AnimatedProperty`] and hands the resulting [`ValueSet`] to subscribers.
//! Render objects are never touched by the sequencer itself.

pub mod binding;
pub mod document;
pub mod error;
pub mod interpolator;
pub mod keyframe;
pub mod playback;
pub mod sequence;
pub mod sequencer;
pub mod subscription;
pub mod track;
pub mod ui;
pub mod value;

pub use binding::{AnimatedProperty, PropertyKey};
pub use document::{parse_document, sheet_names};
pub use error::{Result, SequenceError};
pub use interpolator::{CubicBezier, Interpolator, SmoothStep};
pub use keyframe::{Interpolation, InterpolationMode, Keyframe, KeyframeId};
pub use playback::{
    Completion, Direction, Iterations, PlayOptions, PlaybackOutcome, PlaybackState, PlaybackStatus,
};
pub use sequence::{PlaybackRange, Sequence, SequenceId};
pub use sequencer::Sequencer;
pub use subscription::{Subscription, SubscriptionId};
pub use track::KeyframeTrack;
pub use ui::{format_timecode, TimelineState};
pub use value::{ChannelValues, ValueSet};
