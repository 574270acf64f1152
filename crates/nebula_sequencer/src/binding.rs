// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding of tracks to object properties.

use crate::error::{Result, SequenceError};
use crate::track::KeyframeTrack;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of an animated property on a scene object, e.g. `Camera.position`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyKey {
    /// Target object name
    pub object: String,
    /// Property path within the object, segments joined with `.`
    pub property: String,
}

impl PropertyKey {
    /// Create a property key
    pub fn new(object: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            property: property.into(),
        }
    }

    /// Split a full property path into key and channel
    ///
    /// The last segment is the channel; the rest form the property. A single
    /// segment path animates the property's `value` channel.
    pub fn from_path(object: &str, path: &[String]) -> Result<(Self, String)> {
        match path {
            [] => Err(SequenceError::malformed(
                format!("object `{object}`"),
                "empty property path",
            )),
            [single] => Ok((Self::new(object, single.as_str()), "value".to_string())),
            [parents @ .., channel] => {
                Ok((Self::new(object, parents.join(".")), channel.clone()))
            }
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.property)
    }
}

/// A property animated by one track per numeric channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedProperty {
    /// Property this binding drives
    pub key: PropertyKey,
    /// Channel tracks, in authoring order
    channels: IndexMap<String, KeyframeTrack>,
}

impl AnimatedProperty {
    /// Create a property with no channels
    pub fn new(key: PropertyKey) -> Self {
        Self {
            key,
            channels: IndexMap::new(),
        }
    }

    /// Add a channel track
    ///
    /// Fails if the channel is already bound.
    pub fn add_channel(&mut self, track: KeyframeTrack) -> Result<()> {
        if self.channels.contains_key(&track.channel) {
            return Err(SequenceError::malformed(
                self.key.to_string(),
                format!("channel `{}` bound twice", track.channel),
            ));
        }
        self.channels.insert(track.channel.clone(), track);
        Ok(())
    }

    /// Get a channel track
    pub fn channel(&self, name: &str) -> Option<&KeyframeTrack> {
        self.channels.get(name)
    }

    /// Get a mutable channel track
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut KeyframeTrack> {
        self.channels.get_mut(name)
    }

    /// Iterate channel tracks
    pub fn channels(&self) -> impl Iterator<Item = &KeyframeTrack> {
        self.channels.values()
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Time of the last keyframe across channels
    pub fn duration(&self) -> f32 {
        self.channels
            .values()
            .map(KeyframeTrack::duration)
            .fold(0.0, f32::max)
    }

    /// Validate every channel
    pub fn validate(&self) -> Result<()> {
        for (name, track) in &self.channels {
            if name != &track.channel {
                return Err(SequenceError::malformed(
                    self.key.to_string(),
                    format!("channel `{name}` holds track for `{}`", track.channel),
                ));
            }
            track.validate().map_err(|e| match e {
                SequenceError::MalformedTrackData { context, reason } => {
                    SequenceError::malformed(format!("{} {context}", self.key), reason)
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_path() {
        let (key, channel) = PropertyKey::from_path("Camera", &path(&["position", "x"])).unwrap();
        assert_eq!(key.to_string(), "Camera.position");
        assert_eq!(channel, "x");

        let (key, channel) = PropertyKey::from_path("Box", &path(&["opacity"])).unwrap();
        assert_eq!(key.property, "opacity");
        assert_eq!(channel, "value");

        let (key, channel) =
            PropertyKey::from_path("Rig", &path(&["arm", "offset", "z"])).unwrap();
        assert_eq!(key.property, "arm.offset");
        assert_eq!(channel, "z");

        assert!(PropertyKey::from_path("Rig", &[]).is_err());
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let mut prop = AnimatedProperty::new(PropertyKey::new("Camera", "position"));
        prop.add_channel(KeyframeTrack::empty("x")).unwrap();
        assert!(prop.add_channel(KeyframeTrack::empty("x")).is_err());
    }

    #[test]
    fn test_duration_across_channels() {
        let mut prop = AnimatedProperty::new(PropertyKey::new("Camera", "position"));
        prop.add_channel(KeyframeTrack::new("x", vec![Keyframe::new(0.0, 1.0), Keyframe::new(3.0, 2.0)]).unwrap())
            .unwrap();
        prop.add_channel(KeyframeTrack::new("y", vec![Keyframe::new(5.0, 1.0)]).unwrap())
            .unwrap();
        assert_eq!(prop.duration(), 5.0);
        assert_eq!(prop.channel_count(), 2);
        prop.validate().unwrap();
    }
}
