// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence containing animated properties.

use crate::binding::{AnimatedProperty, PropertyKey};
use crate::error::{Result, SequenceError};
use crate::interpolator::Interpolator;
use crate::value::ValueSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default sequence length in seconds
pub const DEFAULT_LENGTH: f32 = 10.0;

/// Default number of snapping subdivisions per second
pub const DEFAULT_SUBUNITS_PER_UNIT: u32 = 30;

/// Unique identifier for a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub Uuid);

impl SequenceId {
    /// Create a new random sequence ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed time interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRange {
    /// Start time in seconds
    pub start: f32,
    /// End time in seconds
    pub end: f32,
}

impl PlaybackRange {
    /// Create a range, checking `0 <= start <= end`
    pub fn new(start: f32, end: f32) -> Result<Self> {
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || start > end {
            return Err(SequenceError::InvalidPlayOptions(format!(
                "range [{start}, {end}] is not an ordered non-negative interval"
            )));
        }
        Ok(Self { start, end })
    }

    /// Range length in seconds
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    /// Clamp a time into the range
    pub fn clamp(&self, time: f32) -> f32 {
        if time.is_nan() {
            return self.start;
        }
        time.clamp(self.start, self.end)
    }

    /// Whether `other` lies inside this range
    pub fn contains_range(&self, other: &PlaybackRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// A named set of animated properties with a playback range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Unique sequence ID
    pub id: SequenceId,
    /// Sequence name
    pub name: String,
    /// Animated properties
    properties: IndexMap<PropertyKey, AnimatedProperty>,
    /// Constant channel values used where no track exists
    #[serde(default)]
    static_overrides: IndexMap<PropertyKey, IndexMap<String, f32>>,
    /// Sequence length in seconds (can be longer than tracks)
    length: f32,
    /// Snapping subdivisions per second
    pub subunits_per_unit: u32,
}

impl Sequence {
    /// Create an empty sequence
    pub fn new(name: impl Into<String>, length: f32) -> Result<Self> {
        check_length(length)?;
        Ok(Self {
            id: SequenceId::new(),
            name: name.into(),
            properties: IndexMap::new(),
            static_overrides: IndexMap::new(),
            length,
            subunits_per_unit: DEFAULT_SUBUNITS_PER_UNIT,
        })
    }

    /// Parse the first sheet of a JSON keyframe document
    pub fn from_json(json: &str) -> Result<Self> {
        crate::document::parse_document(json, None)
    }

    /// Parse a sequence saved with [`Sequence::to_ron`]
    pub fn from_ron(ron_str: &str) -> Result<Self> {
        let sequence: Sequence = ron::from_str(ron_str)?;
        sequence.validate()?;
        Ok(sequence)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Check every invariant of the sequence and its tracks
    pub fn validate(&self) -> Result<()> {
        check_length(self.length)?;
        if self.subunits_per_unit == 0 {
            return Err(SequenceError::malformed(
                format!("sequence `{}`", self.name),
                "subunits per unit must be positive",
            ));
        }
        for (key, property) in &self.properties {
            if key != &property.key {
                return Err(SequenceError::malformed(
                    key.to_string(),
                    format!("entry holds property `{}`", property.key),
                ));
            }
            property.validate()?;
        }
        for (key, channels) in &self.static_overrides {
            if let Some((channel, _)) = channels.iter().find(|(_, v)| !v.is_finite()) {
                return Err(SequenceError::malformed(
                    key.to_string(),
                    format!("static value for `{channel}` is not finite"),
                ));
            }
        }
        Ok(())
    }

    /// Add a property
    pub fn add_property(&mut self, property: AnimatedProperty) -> Result<()> {
        property.validate()?;
        if self.properties.contains_key(&property.key) {
            return Err(SequenceError::malformed(
                property.key.to_string(),
                "property bound twice",
            ));
        }
        self.properties.insert(property.key.clone(), property);
        Ok(())
    }

    /// Remove a property
    pub fn remove_property(&mut self, key: &PropertyKey) -> Option<AnimatedProperty> {
        self.properties.shift_remove(key)
    }

    /// Get a property
    pub fn property(&self, key: &PropertyKey) -> Option<&AnimatedProperty> {
        self.properties.get(key)
    }

    /// Get a mutable property
    pub fn property_mut(&mut self, key: &PropertyKey) -> Option<&mut AnimatedProperty> {
        self.properties.get_mut(key)
    }

    /// Get all properties
    pub fn properties(&self) -> impl Iterator<Item = &AnimatedProperty> {
        self.properties.values()
    }

    /// Get property count
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Set a constant channel value for a property
    pub fn set_static_override(
        &mut self,
        key: PropertyKey,
        channel: impl Into<String>,
        value: f32,
    ) -> Result<()> {
        if !value.is_finite() {
            return Err(SequenceError::malformed(key.to_string(), "static value is not finite"));
        }
        self.static_overrides
            .entry(key)
            .or_default()
            .insert(channel.into(), value);
        Ok(())
    }

    /// Get a constant channel value
    pub fn static_override(&self, key: &PropertyKey, channel: &str) -> Option<f32> {
        self.static_overrides.get(key)?.get(channel).copied()
    }

    /// Sequence length in seconds
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Change the sequence length
    pub fn set_length(&mut self, length: f32) -> Result<()> {
        check_length(length)?;
        self.length = length;
        Ok(())
    }

    /// Full range `[0, length]`
    pub fn full_range(&self) -> PlaybackRange {
        PlaybackRange {
            start: 0.0,
            end: self.length,
        }
    }

    /// Get the duration based on track content
    pub fn content_duration(&self) -> f32 {
        self.properties
            .values()
            .map(AnimatedProperty::duration)
            .fold(0.0, f32::max)
    }

    /// Convert time to frame number
    pub fn time_to_frame(&self, time: f32) -> u32 {
        (time.max(0.0) * self.subunits_per_unit as f32).round() as u32
    }

    /// Convert frame number to time
    pub fn frame_to_time(&self, frame: u32) -> f32 {
        frame as f32 / self.subunits_per_unit as f32
    }

    /// Round a time to the nearest frame
    pub fn snap_to_frame(&self, time: f32) -> f32 {
        self.frame_to_time(self.time_to_frame(time))
    }

    /// Evaluate every property at `time`
    ///
    /// Muted and empty tracks are skipped; channels without a track fall back
    /// to the static overrides.
    pub fn evaluate(&self, time: f32, curve: &dyn Interpolator) -> ValueSet {
        let mut values = ValueSet::new(time);

        for property in self.properties.values() {
            for track in property.channels() {
                if track.muted {
                    continue;
                }
                if let Some(value) = track.evaluate(time, curve) {
                    values.entry(property.key.clone()).set(track.channel.clone(), value);
                }
            }
        }

        for (key, channels) in &self.static_overrides {
            for (channel, value) in channels {
                let entry = values.entry(key.clone());
                if !entry.contains(channel) {
                    entry.set(channel.clone(), *value);
                }
            }
        }

        values
    }
}

fn check_length(length: f32) -> Result<()> {
    if !length.is_finite() || length < 0.0 {
        return Err(SequenceError::malformed(
            "sequence",
            format!("length {length} must be finite and non-negative"),
        ));
    }
    Ok(())
}
