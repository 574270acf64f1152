// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for the sequencer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a keyframe
///
/// Documents carry their own short string ids; keyframes authored in code get
/// a random one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyframeId(pub String);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for KeyframeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Interpolation mode from a keyframe to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationMode {
    /// Hold the value until the next keyframe
    Step,
    /// Linear interpolation
    #[default]
    Linear,
    /// Eased curve, evaluated by the sequencer's curve interpolator
    Curve,
}

impl InterpolationMode {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Step => "Step",
            Self::Linear => "Linear",
            Self::Curve => "Curve",
        }
    }
}

/// A keyframe in a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Keyframe ID
    pub id: KeyframeId,
    /// Time in seconds
    pub time: f32,
    /// Value at this keyframe
    pub value: f32,
    /// Interpolation mode to next keyframe
    pub interpolation: InterpolationMode,
    /// Curve handle arriving at this keyframe, in the previous segment's unit space
    #[serde(default)]
    pub in_handle: Option<[f32; 2]>,
    /// Curve handle leaving this keyframe, in the next segment's unit space
    #[serde(default)]
    pub out_handle: Option<[f32; 2]>,
}

impl Keyframe {
    /// Create a new linear keyframe
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            id: KeyframeId::new(),
            time,
            value,
            interpolation: InterpolationMode::Linear,
            in_handle: None,
            out_handle: None,
        }
    }

    /// Set the keyframe ID
    pub fn with_id(mut self, id: impl Into<KeyframeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set interpolation mode
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Set curve handles and switch to curve interpolation
    pub fn with_handles(mut self, in_handle: [f32; 2], out_handle: [f32; 2]) -> Self {
        self.in_handle = Some(in_handle);
        self.out_handle = Some(out_handle);
        self.interpolation = InterpolationMode::Curve;
        self
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Cubic bezier interpolation
    pub fn bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + 3.0 * p1 * mt2 * t + 3.0 * p2 * mt * t2 + p3 * t3
    }

    /// Derivative of [`Interpolation::bezier`] with respect to `t`
    pub fn bezier_slope(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        let mt = 1.0 - t;
        3.0 * mt * mt * (p1 - p0) + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
    }

    /// Smoothstep easing on `[0, 1]`
    pub fn smoothstep(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}
