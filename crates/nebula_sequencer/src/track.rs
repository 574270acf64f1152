// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe tracks: one numeric channel of an animated property.

use crate::error::{Result, SequenceError};
use crate::interpolator::Interpolator;
use crate::keyframe::{Interpolation, InterpolationMode, Keyframe, KeyframeId};
use serde::{Deserialize, Serialize};

/// Keyframes closer than this are considered to sit at the same time
const TIME_EPSILON: f32 = 0.001;

/// Ordered keyframes for one numeric channel
///
/// Keyframe times are finite, non-negative and strictly increasing. Every
/// mutating operation keeps that invariant or fails without changing the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeTrack {
    /// Channel name (`x`, `y`, `z`, ...)
    pub channel: String,
    /// Keyframes in this track
    keyframes: Vec<Keyframe>,
    /// Whether the track is muted
    #[serde(default)]
    pub muted: bool,
}

impl KeyframeTrack {
    /// Create an empty track
    pub fn empty(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            keyframes: Vec::new(),
            muted: false,
        }
    }

    /// Create a track from keyframes that are already in time order
    pub fn new(channel: impl Into<String>, keyframes: Vec<Keyframe>) -> Result<Self> {
        let track = Self {
            channel: channel.into(),
            keyframes,
            muted: false,
        };
        track.validate()?;
        Ok(track)
    }

    /// Check the ordering and value invariants
    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<f32> = None;
        for (index, kf) in self.keyframes.iter().enumerate() {
            check_keyframe(&self.channel, kf)?;
            if let Some(prev) = previous {
                if kf.time <= prev {
                    return Err(SequenceError::malformed(
                        format!("track `{}`", self.channel),
                        format!(
                            "keyframe {index} at t={} does not come after t={prev}",
                            kf.time
                        ),
                    ));
                }
            }
            previous = Some(kf.time);
        }
        Ok(())
    }

    /// Add a keyframe, keeping time order
    pub fn add_keyframe(&mut self, keyframe: Keyframe) -> Result<()> {
        check_keyframe(&self.channel, &keyframe)?;
        if self.keyframes.iter().any(|k| k.time == keyframe.time) {
            return Err(SequenceError::malformed(
                format!("track `{}`", self.channel),
                format!("duplicate keyframe at t={}", keyframe.time),
            ));
        }
        let index = self.keyframes.partition_point(|k| k.time < keyframe.time);
        self.keyframes.insert(index, keyframe);
        Ok(())
    }

    /// Insert or update keyframe at time
    pub fn set_keyframe_at(&mut self, time: f32, value: f32) -> Result<()> {
        if let Some(kf) = self
            .keyframes
            .iter_mut()
            .find(|k| (k.time - time).abs() < TIME_EPSILON)
        {
            kf.value = value;
            return Ok(());
        }
        self.add_keyframe(Keyframe::new(time, value))
    }

    /// Remove a keyframe
    pub fn remove_keyframe(&mut self, keyframe_id: &KeyframeId) -> Option<Keyframe> {
        let index = self.keyframes.iter().position(|k| &k.id == keyframe_id)?;
        Some(self.keyframes.remove(index))
    }

    /// Move keyframe to a new time
    pub fn move_keyframe(&mut self, keyframe_id: &KeyframeId, new_time: f32) -> Result<()> {
        let Some(index) = self.keyframes.iter().position(|k| &k.id == keyframe_id) else {
            return Err(SequenceError::malformed(
                format!("track `{}`", self.channel),
                format!("no keyframe with id {}", keyframe_id.0),
            ));
        };
        let mut moved = self.keyframes[index].clone();
        moved.time = new_time;
        let previous = self.keyframes.remove(index);
        if let Err(e) = self.add_keyframe(moved) {
            self.keyframes.insert(index, previous);
            return Err(e);
        }
        Ok(())
    }

    /// Offset all keyframes by a time delta
    ///
    /// Fails if the shift would move a keyframe before zero.
    pub fn offset_time(&mut self, delta: f32) -> Result<()> {
        if let Some(first) = self.keyframes.first() {
            if first.time + delta < 0.0 {
                return Err(SequenceError::malformed(
                    format!("track `{}`", self.channel),
                    format!("offset {delta} moves t={} below zero", first.time),
                ));
            }
        }
        for kf in &mut self.keyframes {
            kf.time += delta;
        }
        Ok(())
    }

    /// Scale all keyframes by a positive time factor
    pub fn scale_time(&mut self, factor: f32) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(SequenceError::malformed(
                format!("track `{}`", self.channel),
                format!("time scale {factor} must be positive"),
            ));
        }
        for kf in &mut self.keyframes {
            kf.time *= factor;
        }
        Ok(())
    }

    /// Get all keyframes
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Get keyframe by ID
    pub fn keyframe(&self, keyframe_id: &KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| &k.id == keyframe_id)
    }

    /// Get keyframe count
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the track has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the first keyframe
    pub fn start_time(&self) -> f32 {
        self.keyframes.first().map_or(0.0, |k| k.time)
    }

    /// Get the duration (time of last keyframe)
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Get keyframes in a time range
    pub fn keyframes_in_range(&self, start: f32, end: f32) -> &[Keyframe] {
        let from = self.keyframes.partition_point(|k| k.time < start);
        let to = self.keyframes.partition_point(|k| k.time <= end);
        if from >= to {
            return &[];
        }
        &self.keyframes[from..to]
    }

    /// Get nearest keyframe to time
    pub fn nearest_keyframe(&self, time: f32) -> Option<&Keyframe> {
        self.keyframes
            .iter()
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }

    /// Find the keyframe pair bracketing `time`
    ///
    /// Returns `None` outside `(first, last)`, where the value is clamped.
    fn bracket(&self, time: f32) -> Option<(&Keyframe, &Keyframe)> {
        let next = self.keyframes.partition_point(|k| k.time <= time);
        if next == 0 || next >= self.keyframes.len() {
            return None;
        }
        Some((&self.keyframes[next - 1], &self.keyframes[next]))
    }

    /// Evaluate the track value at a given time
    ///
    /// Times before the first keyframe clamp to its value, times after the
    /// last keyframe clamp to the last value. `curve` evaluates
    /// [`InterpolationMode::Curve`] segments.
    pub fn evaluate(&self, time: f32, curve: &dyn Interpolator) -> Option<f32> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if time.is_nan() || time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        let (a, b) = self.bracket(time)?;
        let frac = (time - a.time) / (b.time - a.time);
        Some(match a.interpolation {
            InterpolationMode::Step => a.value,
            InterpolationMode::Linear => Interpolation::lerp(a.value, b.value, frac),
            InterpolationMode::Curve => curve.interpolate(frac, a, b),
        })
    }
}

fn check_keyframe(channel: &str, kf: &Keyframe) -> Result<()> {
    if !kf.time.is_finite() || kf.time < 0.0 {
        return Err(SequenceError::malformed(
            format!("track `{channel}`"),
            format!("keyframe time {} must be finite and non-negative", kf.time),
        ));
    }
    if !kf.value.is_finite() {
        return Err(SequenceError::malformed(
            format!("track `{channel}`"),
            format!("keyframe value at t={} is not finite", kf.time),
        ));
    }
    Ok(())
}
