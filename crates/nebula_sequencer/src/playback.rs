// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback state, play options and completion futures.

use crate::error::{Result, SequenceError};
use crate::sequence::PlaybackRange;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Not started, or finished
    #[default]
    Stopped,
    /// Advancing time every tick
    Playing,
    /// Holding the current time
    Paused,
}

/// Direction of each iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Start to end
    #[default]
    Normal,
    /// End to start
    Reverse,
    /// Ping-pong, starting forward
    Alternate,
    /// Ping-pong, starting backward
    AlternateReverse,
}

impl Direction {
    /// Whether iteration `index` (zero based) runs forward
    pub fn is_forward(&self, index: u32) -> bool {
        match self {
            Self::Normal => true,
            Self::Reverse => false,
            Self::Alternate => index % 2 == 0,
            Self::AlternateReverse => index % 2 == 1,
        }
    }
}

/// How many times the range is played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    /// A fixed number of passes
    Finite(u32),
    /// Until stopped
    Infinite,
}

impl Default for Iterations {
    fn default() -> Self {
        Self::Finite(1)
    }
}

/// How a [`Completion`] resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every iteration reached the end of the range
    Finished,
    /// Paused, restarted or dropped before finishing
    Interrupted,
}

/// Options for [`Sequencer::play`](crate::Sequencer::play)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Range to play, the whole sequence when unset
    pub range: Option<(f32, f32)>,
    /// Number of passes
    pub iterations: Iterations,
    /// Time multiplier
    pub rate: f32,
    /// Direction of the passes
    pub direction: Direction,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            range: None,
            iterations: Iterations::default(),
            rate: 1.0,
            direction: Direction::Normal,
        }
    }
}

impl PlayOptions {
    /// Play the whole sequence once, forward, at normal speed
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict playback to `[start, end]`
    pub fn range(mut self, start: f32, end: f32) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Play `count` passes
    pub fn iterations(mut self, count: u32) -> Self {
        self.iterations = Iterations::Finite(count);
        self
    }

    /// Loop until paused
    pub fn infinite(mut self) -> Self {
        self.iterations = Iterations::Infinite;
        self
    }

    /// Set the time multiplier
    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Set the direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Check the options against a sequence range
    pub(crate) fn resolve(&self, full: PlaybackRange) -> Result<PlaybackRange> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(SequenceError::InvalidPlayOptions(format!(
                "rate {} must be positive",
                self.rate
            )));
        }
        if self.iterations == Iterations::Finite(0) {
            return Err(SequenceError::InvalidPlayOptions(
                "iteration count must be at least 1".to_string(),
            ));
        }
        let Some((start, end)) = self.range else {
            return Ok(full);
        };
        let range = PlaybackRange::new(start, end)?;
        if !full.contains_range(&range) {
            return Err(SequenceError::InvalidPlayOptions(format!(
                "range [{start}, {end}] exceeds sequence [{}, {}]",
                full.start, full.end
            )));
        }
        Ok(range)
    }
}

/// One-shot notification that a `play` call ended
///
/// Resolves exactly once: [`PlaybackOutcome::Finished`] when the last
/// iteration reaches its end, [`PlaybackOutcome::Interrupted`] otherwise.
#[derive(Debug)]
#[must_use = "a completion does nothing unless polled or checked"]
pub struct Completion {
    receiver: oneshot::Receiver<PlaybackOutcome>,
    outcome: Option<PlaybackOutcome>,
}

impl Completion {
    fn new() -> (oneshot::Sender<PlaybackOutcome>, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            sender,
            Self {
                receiver,
                outcome: None,
            },
        )
    }

    /// Outcome, if playback already ended
    pub fn try_outcome(&mut self) -> Option<PlaybackOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.receiver.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::Canceled) => Some(PlaybackOutcome::Interrupted),
            };
        }
        self.outcome
    }

    /// Whether playback ended
    pub fn is_resolved(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for Completion {
    type Output = PlaybackOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(result) => {
                let outcome = result.unwrap_or(PlaybackOutcome::Interrupted);
                self.outcome = Some(outcome);
                Poll::Ready(outcome)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Time cursor of a sequencer
#[derive(Debug)]
pub struct PlaybackState {
    current_time: f32,
    status: PlaybackStatus,
    range: PlaybackRange,
    rate: f32,
    direction: Direction,
    iterations: Iterations,
    /// Completed passes of the current play call
    iteration: u32,
    pending: Option<oneshot::Sender<PlaybackOutcome>>,
}

impl PlaybackState {
    /// Stopped state at the start of `range`
    pub fn new(range: PlaybackRange) -> Self {
        Self {
            current_time: range.start,
            status: PlaybackStatus::Stopped,
            range,
            rate: 1.0,
            direction: Direction::Normal,
            iterations: Iterations::default(),
            iteration: 0,
            pending: None,
        }
    }

    /// Current playback time
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Active range
    pub fn range(&self) -> PlaybackRange {
        self.range
    }

    /// Completed passes of the current play call
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Whether time advances on tick
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Start a new play call, interrupting any pending one
    pub(crate) fn start(&mut self, range: PlaybackRange, options: &PlayOptions) -> Completion {
        self.resolve_pending(PlaybackOutcome::Interrupted);

        self.range = range;
        self.rate = options.rate;
        self.direction = options.direction;
        self.iterations = options.iterations;
        self.iteration = 0;
        self.current_time = self.iteration_start();
        self.status = PlaybackStatus::Playing;

        let (sender, completion) = Completion::new();
        self.pending = Some(sender);
        completion
    }

    /// Resume a paused play call; returns whether anything changed
    pub(crate) fn resume(&mut self) -> bool {
        if self.status == PlaybackStatus::Paused {
            self.status = PlaybackStatus::Playing;
            return true;
        }
        false
    }

    /// Pause, interrupting the pending completion
    pub(crate) fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
            self.resolve_pending(PlaybackOutcome::Interrupted);
        }
    }

    /// Stop and rewind to the range start
    pub(crate) fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.current_time = self.range.start;
        self.resolve_pending(PlaybackOutcome::Interrupted);
    }

    /// Jump to `time`, clamped into the range
    pub(crate) fn seek(&mut self, time: f32) {
        self.current_time = self.range.clamp(time);
    }

    /// Advance by `delta` seconds of wall time
    ///
    /// Returns `true` when this call finished the play call.
    pub(crate) fn advance(&mut self, delta: f32) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        let mut remaining = if delta.is_finite() {
            (delta.max(0.0) * self.rate).min(f32::MAX)
        } else {
            0.0
        };

        if self.range.duration() <= 0.0 {
            return match self.iterations {
                Iterations::Finite(_) => {
                    self.finish();
                    true
                }
                Iterations::Infinite => false,
            };
        }

        let forward = self.direction.is_forward(self.iteration);
        let boundary = if forward { self.range.end } else { self.range.start };
        let distance = (boundary - self.current_time).abs();
        if remaining < distance {
            self.current_time += if forward { remaining } else { -remaining };
            return false;
        }

        remaining -= distance;
        if self.complete_passes(1) {
            return true;
        }

        // Skip whole passes in one step
        let duration = self.range.duration();
        let passes = (remaining / duration).floor();
        if passes >= 1.0 {
            if self.complete_passes(passes as u32) {
                return true;
            }
            remaining = remaining.rem_euclid(duration);
        }

        self.current_time = self.iteration_start();
        let forward = self.direction.is_forward(self.iteration);
        self.current_time += if forward { remaining } else { -remaining };
        false
    }

    /// Count `passes` finished passes; returns `true` when the play call ended
    fn complete_passes(&mut self, passes: u32) -> bool {
        let iteration = self.iteration.saturating_add(passes);
        if let Iterations::Finite(count) = self.iterations {
            if iteration >= count {
                self.iteration = count;
                let last_forward = self.direction.is_forward(count.saturating_sub(1));
                self.current_time = if last_forward {
                    self.range.end
                } else {
                    self.range.start
                };
                self.finish();
                return true;
            }
        }
        self.iteration = iteration;
        false
    }

    fn iteration_start(&self) -> f32 {
        if self.direction.is_forward(self.iteration) {
            self.range.start
        } else {
            self.range.end
        }
    }

    fn finish(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.resolve_pending(PlaybackOutcome::Finished);
    }

    fn resolve_pending(&mut self, outcome: PlaybackOutcome) {
        if let Some(sender) = self.pending.take() {
            // The receiver may already be gone
            let _ = sender.send(outcome);
        }
    }
}
