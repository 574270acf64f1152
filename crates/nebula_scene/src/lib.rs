// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene runtime for Nebula.
//!
//! A pink particle nebula with an optional extruded text block, viewed by an
//! orbiting perspective camera that a keyframe sequence can fly around.
//!
//! ## Architecture
//!
//! [`SceneContext`] is the one object a frame loop needs. It is built from a
//! [`SceneConfig`] with [`SceneContext::init`], which loads the sprite, the
//! typeface and the sequence document through an [`AssetLoader`]. Assets that
//! fail to load are reported, not fatal. A [`FrameLoop`] then ticks the
//! context at a fixed rate and hands each frame to a [`Renderer`].

pub mod assets;
pub mod camera;
pub mod config;
pub mod context;
pub mod error;
pub mod font;
pub mod frame_loop;
pub mod particles;
pub mod scene;
pub mod viewport;

pub use assets::{AlphaTexture, AssetLoader};
pub use camera::{OrbitControls, PerspectiveCamera};
pub use config::{
    CameraSettings, ParticleSettings, SceneConfig, SequenceSettings, TextSettings,
    ViewportSettings, CONFIG_FILE_NAME,
};
pub use context::{FrameUpdate, SceneContext};
pub use error::{Result, SceneError};
pub use font::{layout_text, TextBlock, TextStyle, Typeface};
pub use frame_loop::{FrameClock, FrameLoop, FrameRecorder, FrameStats, LoopSummary, Renderer};
pub use particles::{OrbitMotion, ParticleField};
pub use scene::{PointsMaterial, Scene, TextMesh};
pub use viewport::Viewport;
