// SPDX-License-Identifier: MIT OR Apache-2.0
//! Computed property values handed to subscribers.

use crate::binding::PropertyKey;
use indexmap::IndexMap;

/// Channel values of one property at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelValues(IndexMap<String, f32>);

impl ChannelValues {
    /// Set a channel value
    pub fn set(&mut self, channel: impl Into<String>, value: f32) {
        self.0.insert(channel.into(), value);
    }

    /// Get a channel value
    pub fn get(&self, channel: &str) -> Option<f32> {
        self.0.get(channel).copied()
    }

    /// Whether a channel is present
    pub fn contains(&self, channel: &str) -> bool {
        self.0.contains_key(channel)
    }

    /// `x`, `y`, `z` channels, if all three are present
    pub fn vec3(&self) -> Option<[f32; 3]> {
        Some([self.get("x")?, self.get("y")?, self.get("z")?])
    }

    /// `x`, `y`, `z` channels, missing ones taken from `fallback`
    pub fn vec3_or(&self, fallback: [f32; 3]) -> [f32; 3] {
        [
            self.get("x").unwrap_or(fallback[0]),
            self.get("y").unwrap_or(fallback[1]),
            self.get("z").unwrap_or(fallback[2]),
        ]
    }

    /// Iterate `(channel, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no channel is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Values of every evaluated property at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    /// Playback time the values were computed for
    pub time: f32,
    values: IndexMap<PropertyKey, ChannelValues>,
}

impl ValueSet {
    /// Create an empty set for `time`
    pub fn new(time: f32) -> Self {
        Self {
            time,
            values: IndexMap::new(),
        }
    }

    /// Mutable access to a property's channels, created on demand
    pub fn entry(&mut self, key: PropertyKey) -> &mut ChannelValues {
        self.values.entry(key).or_default()
    }

    /// Get a property's channels
    pub fn get(&self, key: &PropertyKey) -> Option<&ChannelValues> {
        self.values.get(key)
    }

    /// Shorthand for a single channel value
    pub fn channel(&self, key: &PropertyKey, channel: &str) -> Option<f32> {
        self.get(key)?.get(channel)
    }

    /// Iterate properties
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &ChannelValues)> {
        self.values.iter()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of this set restricted to `keys`
    pub fn subset<'a>(&self, keys: impl IntoIterator<Item = &'a PropertyKey>) -> ValueSet {
        let mut out = ValueSet::new(self.time);
        for key in keys {
            if let Some(values) = self.values.get(key) {
                out.values.insert(key.clone(), values.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_helpers() {
        let mut values = ChannelValues::default();
        values.set("x", 1.0);
        values.set("z", 3.0);
        assert_eq!(values.vec3(), None);
        assert_eq!(values.vec3_or([0.0, 2.0, 0.0]), [1.0, 2.0, 3.0]);
        values.set("y", 2.0);
        assert_eq!(values.vec3(), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_subset() {
        let camera = PropertyKey::new("Camera", "position");
        let light = PropertyKey::new("Light", "intensity");
        let mut set = ValueSet::new(1.5);
        set.entry(camera.clone()).set("x", 4.0);
        set.entry(light.clone()).set("value", 0.5);

        let only_camera = set.subset([&camera]);
        assert_eq!(only_camera.len(), 1);
        assert_eq!(only_camera.channel(&camera, "x"), Some(4.0));
        assert_eq!(only_camera.time, 1.5);
        assert!(only_camera.get(&light).is_none());
    }
}
