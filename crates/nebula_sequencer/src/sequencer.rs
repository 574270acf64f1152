// SPDX-License-Identifier: MIT OR Apache-2.0
//! The sequencer: playback of a sequence and value notification.

use crate::binding::PropertyKey;
use crate::document;
use crate::error::Result;
use crate::interpolator::{CubicBezier, Interpolator};
use crate::playback::{Completion, PlayOptions, PlaybackState, PlaybackStatus};
use crate::sequence::Sequence;
use crate::subscription::{SharedSubscribers, Subscribers, Subscription, SubscriptionId};
use crate::value::ValueSet;
use std::fmt;

/// Drives a [`Sequence`] over time
///
/// The sequencer owns track data and the playback cursor only. Whatever the
/// values are applied to (a camera, a light) is reached through subscription
/// handlers or the [`ValueSet`] returned by [`Sequencer::tick`].
pub struct Sequencer {
    sequence: Sequence,
    playback: PlaybackState,
    curve: Box<dyn Interpolator>,
    subscribers: SharedSubscribers,
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("sequence", &self.sequence.name)
            .field("properties", &self.sequence.property_count())
            .field("playback", &self.playback)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl Sequencer {
    /// Create a stopped sequencer at the start of `sequence`
    pub fn new(sequence: Sequence) -> Self {
        let playback = PlaybackState::new(sequence.full_range());
        Self {
            sequence,
            playback,
            curve: Box::new(CubicBezier),
            subscribers: SharedSubscribers::default(),
        }
    }

    /// Load the first sheet of a JSON keyframe document
    pub fn load(json: &str) -> Result<Self> {
        Self::from_parsed(document::parse_document(json, None)?)
    }

    /// Load a named sheet of a JSON keyframe document
    pub fn load_sheet(json: &str, sheet: &str) -> Result<Self> {
        Self::from_parsed(document::parse_document(json, Some(sheet))?)
    }

    fn from_parsed(sequence: Sequence) -> Result<Self> {
        tracing::info!(
            "Loaded sequence `{}`: {} properties, length {}s",
            sequence.name,
            sequence.property_count(),
            sequence.length()
        );
        Ok(Self::new(sequence))
    }

    /// Use `curve` for curve segments
    pub fn with_interpolator(mut self, curve: impl Interpolator + 'static) -> Self {
        self.curve = Box::new(curve);
        self
    }

    /// Replace the curve interpolator
    pub fn set_interpolator(&mut self, curve: impl Interpolator + 'static) {
        self.curve = Box::new(curve);
    }

    /// The sequence being played
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Swap in a new sequence, stopping playback
    pub fn replace_sequence(&mut self, sequence: Sequence) -> Sequence {
        self.playback.stop();
        self.playback = PlaybackState::new(sequence.full_range());
        std::mem::replace(&mut self.sequence, sequence)
    }

    /// Mute or unmute one channel; returns whether the channel exists
    pub fn set_channel_muted(&mut self, key: &PropertyKey, channel: &str, muted: bool) -> bool {
        match self
            .sequence
            .property_mut(key)
            .and_then(|p| p.channel_mut(channel))
        {
            Some(track) => {
                track.muted = muted;
                true
            }
            None => false,
        }
    }

    /// Playback cursor
    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    /// Current playback time
    pub fn position(&self) -> f32 {
        self.playback.current_time()
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.playback.status()
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Start playback from the start of the requested range
    ///
    /// Calling this while already playing restarts from the new start; the
    /// previous completion resolves as interrupted.
    pub fn play(&mut self, options: PlayOptions) -> Result<Completion> {
        let range = options.resolve(self.sequence.full_range())?;
        if self.playback.is_playing() {
            tracing::debug!(
                "Restarting `{}` at {}s (was at {}s)",
                self.sequence.name,
                range.start,
                self.playback.current_time()
            );
        }
        let completion = self.playback.start(range, &options);
        tracing::debug!(
            "Playing `{}` over [{}, {}] x{:?} at rate {}",
            self.sequence.name,
            range.start,
            range.end,
            options.iterations,
            options.rate
        );
        Ok(completion)
    }

    /// Play `[start, end]` once
    pub fn play_range(&mut self, start: f32, end: f32) -> Result<Completion> {
        self.play(PlayOptions::new().range(start, end))
    }

    /// Pause playback; the pending completion resolves as interrupted
    pub fn pause(&mut self) {
        self.playback.pause();
    }

    /// Resume paused playback; returns whether playback was paused
    pub fn resume(&mut self) -> bool {
        self.playback.resume()
    }

    /// Stop and rewind to the range start
    pub fn stop(&mut self) {
        self.playback.stop();
    }

    /// Move the cursor; out-of-range times are clamped
    pub fn seek(&mut self, time: f32) {
        self.playback.seek(time);
    }

    /// Advance playback and notify subscribers
    ///
    /// Time only advances while playing, but values are computed and
    /// published on every tick.
    pub fn tick(&mut self, delta_time: f32) -> ValueSet {
        if self.playback.advance(delta_time) {
            tracing::info!(
                "Sequence `{}` finished at {}s",
                self.sequence.name,
                self.playback.current_time()
            );
        }
        let values = self.values_at(self.playback.current_time());
        Subscribers::notify(&self.subscribers, &values);
        values
    }

    /// Evaluate every property at `time` without touching playback
    pub fn values_at(&self, time: f32) -> ValueSet {
        self.sequence.evaluate(time, self.curve.as_ref())
    }

    /// Call `handler` once per tick with the values of `keys`
    ///
    /// The handler is skipped on ticks where none of the keys has a value.
    pub fn subscribe(
        &self,
        keys: impl IntoIterator<Item = PropertyKey>,
        handler: impl FnMut(&ValueSet) + 'static,
    ) -> Subscription {
        Subscribers::add(&self.subscribers, Some(keys.into_iter().collect()), handler)
    }

    /// Call `handler` once per tick with every value
    pub fn subscribe_all(&self, handler: impl FnMut(&ValueSet) + 'static) -> Subscription {
        Subscribers::add(&self.subscribers, None, handler)
    }

    /// Remove a handler; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow_mut().remove(id)
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::AnimatedProperty;
    use crate::keyframe::{InterpolationMode, Keyframe};
    use crate::playback::PlaybackOutcome;
    use crate::track::KeyframeTrack;
    use futures::FutureExt;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn camera() -> PropertyKey {
        PropertyKey::new("Camera", "position")
    }

    /// `x` ramps 0 -> 10 over [0, 1], `y` ramps 0 -> 20 over [0, 2]
    fn ramp_sequencer() -> Sequencer {
        let mut seq = Sequence::new("Ramp", 2.0).unwrap();
        let mut prop = AnimatedProperty::new(camera());
        prop.add_channel(
            KeyframeTrack::new("x", vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 10.0)]).unwrap(),
        )
        .unwrap();
        prop.add_channel(
            KeyframeTrack::new("y", vec![Keyframe::new(0.0, 0.0), Keyframe::new(2.0, 20.0)]).unwrap(),
        )
        .unwrap();
        seq.add_property(prop).unwrap();
        Sequencer::new(seq)
    }

    #[test]
    fn test_debug_output() {
        let sequencer = ramp_sequencer();
        let _sub = sequencer.subscribe_all(|_| {});
        let text = format!("{sequencer:?}");
        assert!(text.starts_with("Sequencer"));
        assert!(text.contains("\"Ramp\""));
        assert!(text.contains("subscribers: 1"));
    }

    #[test]
    fn test_tick_interpolates_and_clamps() {
        let mut sequencer = ramp_sequencer();
        let _completion = sequencer.play_range(0.0, 2.0).unwrap();
        let values = sequencer.tick(0.5);
        assert_eq!(values.channel(&camera(), "x"), Some(5.0));
        assert_eq!(values.channel(&camera(), "y"), Some(5.0));

        let values = sequencer.tick(1.0);
        assert_eq!(values.channel(&camera(), "x"), Some(10.0));
        assert_eq!(values.channel(&camera(), "y"), Some(15.0));

        assert_eq!(sequencer.values_at(-1.0).channel(&camera(), "x"), Some(0.0));
        assert_eq!(sequencer.values_at(2.0).channel(&camera(), "x"), Some(10.0));
    }

    #[test]
    fn test_completion_not_before_end() {
        let mut sequencer = ramp_sequencer();
        let mut completion = sequencer.play_range(0.0, 2.0).unwrap();
        for _ in 0..7 {
            sequencer.tick(0.25);
            assert_eq!(completion.try_outcome(), None);
        }
        assert_eq!(sequencer.position(), 1.75);
        sequencer.tick(0.25);
        assert_eq!(completion.try_outcome(), Some(PlaybackOutcome::Finished));
        assert_eq!(sequencer.status(), PlaybackStatus::Stopped);

        // Stopped at the end: further ticks keep publishing the final values
        let values = sequencer.tick(1.0);
        assert_eq!(values.time, 2.0);
        assert_eq!(values.channel(&camera(), "y"), Some(20.0));
    }

    #[test]
    fn test_restart_resets_and_stays_ordered() {
        let mut sequencer = ramp_sequencer();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = sequencer.subscribe([camera()], move |values| {
            sink.borrow_mut().push(values.time);
        });

        let first = sequencer.play_range(0.0, 2.0).unwrap();
        sequencer.tick(0.5);
        sequencer.tick(0.5);
        seen.borrow_mut().clear();

        let _second = sequencer.play_range(0.25, 2.0).unwrap();
        assert_eq!(sequencer.position(), 0.25);
        assert_eq!(first.now_or_never(), Some(PlaybackOutcome::Interrupted));

        for _ in 0..4 {
            sequencer.tick(0.25);
        }
        let times = seen.borrow().clone();
        assert_eq!(times, vec![0.5, 0.75, 1.0, 1.25]);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_subscription_filter_and_cancel() {
        let mut sequencer = ramp_sequencer();
        let calls = Rc::new(RefCell::new(0));
        let other_calls = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&calls);
        let camera_sub = sequencer.subscribe([camera()], move |values| {
            assert!(values.get(&camera()).is_some());
            *counter.borrow_mut() += 1;
        });
        let counter = Rc::clone(&other_calls);
        let _other = sequencer.subscribe([PropertyKey::new("Light", "intensity")], move |_| {
            *counter.borrow_mut() += 1;
        });
        assert_eq!(sequencer.subscriber_count(), 2);

        sequencer.tick(0.0);
        sequencer.tick(0.0);
        assert_eq!(*calls.borrow(), 2);
        // No Light values: handler never called
        assert_eq!(*other_calls.borrow(), 0);

        assert!(camera_sub.cancel());
        assert!(!camera_sub.is_active());
        assert!(!camera_sub.cancel());
        sequencer.tick(0.0);
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(sequencer.subscriber_count(), 1);
    }

    #[test]
    fn test_cancel_during_dispatch() {
        let mut sequencer = ramp_sequencer();
        let later_calls = Rc::new(RefCell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let target = Rc::clone(&victim);
        let _first = sequencer.subscribe_all(move |_| {
            if let Some(sub) = target.borrow().as_ref() {
                sub.cancel();
            }
        });
        let counter = Rc::clone(&later_calls);
        let second = sequencer.subscribe_all(move |_| *counter.borrow_mut() += 1);
        let second_id = second.id();
        *victim.borrow_mut() = Some(second);

        sequencer.tick(0.1);
        assert_eq!(*later_calls.borrow(), 0);
        assert!(!sequencer.unsubscribe(second_id));
    }

    #[test]
    fn test_custom_interpolator() {
        let mut seq = Sequence::new("Curve", 1.0).unwrap();
        let mut prop = AnimatedProperty::new(camera());
        prop.add_channel(
            KeyframeTrack::new(
                "x",
                vec![
                    Keyframe::new(0.0, 0.0).with_interpolation(InterpolationMode::Curve),
                    Keyframe::new(1.0, 10.0),
                ],
            )
            .unwrap(),
        )
        .unwrap();
        seq.add_property(prop).unwrap();

        let sequencer = Sequencer::new(seq)
            .with_interpolator(|frac: f32, a: &Keyframe, b: &Keyframe| a.value + (b.value - a.value) * frac * frac);
        assert_eq!(sequencer.values_at(0.5).channel(&camera(), "x"), Some(2.5));
    }

    #[test]
    fn test_pause_seek_resume() {
        let mut sequencer = ramp_sequencer();
        let completion = sequencer.play(PlayOptions::new()).unwrap();
        sequencer.tick(0.5);
        sequencer.pause();
        assert_eq!(completion.now_or_never(), Some(PlaybackOutcome::Interrupted));
        sequencer.tick(1.0);
        assert_eq!(sequencer.position(), 0.5);

        sequencer.seek(10.0);
        assert_eq!(sequencer.position(), 2.0);
        sequencer.seek(-3.0);
        assert_eq!(sequencer.position(), 0.0);

        assert!(sequencer.resume());
        sequencer.tick(0.5);
        assert_eq!(sequencer.position(), 0.5);
        sequencer.stop();
        assert!(!sequencer.is_playing());
    }

    #[test]
    fn test_invalid_options() {
        let mut sequencer = ramp_sequencer();
        assert!(sequencer.play_range(0.0, 5.0).is_err());
        assert!(sequencer.play(PlayOptions::new().rate(-1.0)).is_err());
        assert_eq!(sequencer.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_load_rejects_partial_documents() {
        let json = r#"{ "sheetsById": { "S": { "sequence": { "tracksByObject": { "Camera": {
            "trackData": { "t": { "keyframes": [
                { "position": 1, "value": 0 }, { "position": 0.5, "value": 1 } ] } },
            "trackIdByPropPath": { "[\"position\",\"x\"]": "t" } } } } } } }"#;
        let err = Sequencer::load(json).err().unwrap();
        assert!(err.is_malformed());
    }
}
