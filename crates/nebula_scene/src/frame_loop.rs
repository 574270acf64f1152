// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-rate frame loop.
//!
//! The loop simulates a display refresh: every frame it asks the
//! [`FrameClock`] for the next timestamp, ticks the [`SceneContext`] and
//! hands the result to a [`Renderer`].

use crate::context::{FrameUpdate, SceneContext};
use crate::error::Result;
use glam::Vec3;

/// Draws a frame
pub trait Renderer {
    /// Render the context after `update` was applied
    fn render(&mut self, context: &SceneContext, update: &FrameUpdate) -> Result<()>;
}

/// Per-frame numbers captured by [`FrameRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    /// Frame index, starting at 0
    pub frame: u64,
    /// Seconds since the loop started
    pub elapsed: f32,
    /// Sequence cursor, if a sequence is attached
    pub sequence_time: Option<f32>,
    /// Camera position
    pub camera_position: Vec3,
    /// Particle group position
    pub particle_position: Vec3,
    /// Drawing buffer size
    pub buffer_size: (u32, u32),
}

/// Renderer that records [`FrameStats`] instead of drawing
#[derive(Debug, Default)]
pub struct FrameRecorder {
    frames: Vec<FrameStats>,
}

impl FrameRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded frames
    pub fn frames(&self) -> &[FrameStats] {
        &self.frames
    }

    /// Most recent frame
    pub fn last(&self) -> Option<&FrameStats> {
        self.frames.last()
    }

    /// Total distance the camera travelled
    pub fn camera_travel(&self) -> f32 {
        self.frames
            .windows(2)
            .map(|pair| pair[0].camera_position.distance(pair[1].camera_position))
            .sum()
    }
}

impl Renderer for FrameRecorder {
    fn render(&mut self, context: &SceneContext, update: &FrameUpdate) -> Result<()> {
        self.frames.push(FrameStats {
            frame: self.frames.len() as u64,
            elapsed: update.elapsed,
            sequence_time: update.sequence_time,
            camera_position: update.camera_position,
            particle_position: update.particle_position,
            buffer_size: context.viewport().buffer_size(),
        });
        Ok(())
    }
}

/// Fixed-step clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f32,
    frame: u64,
}

impl FrameClock {
    /// Clock ticking `fps` times per second; non-positive rates fall back to 60
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Self { fps, frame: 0 }
    }

    /// Frames per second
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Seconds per frame
    pub fn delta(&self) -> f32 {
        1.0 / self.fps
    }

    /// Frames handed out so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Next `(elapsed, delta)` pair
    ///
    /// The first frame reports zero elapsed time and zero delta.
    pub fn tick(&mut self) -> (f32, f32) {
        let elapsed = self.frame as f32 / self.fps;
        let delta = if self.frame == 0 { 0.0 } else { self.delta() };
        self.frame += 1;
        (elapsed, delta)
    }
}

/// Totals for one [`FrameLoop::run`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    /// Frames rendered
    pub frames: u64,
    /// Simulated seconds
    pub elapsed: f32,
}

/// Drives a context and renderer at a fixed rate
#[derive(Debug)]
pub struct FrameLoop {
    clock: FrameClock,
}

impl FrameLoop {
    /// Loop at `fps` frames per second
    pub fn new(fps: f32) -> Self {
        Self {
            clock: FrameClock::new(fps),
        }
    }

    /// Clock state
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Run `frames` frames; stops at the first render error
    pub fn run(
        &mut self,
        context: &mut SceneContext,
        renderer: &mut dyn Renderer,
        frames: u64,
    ) -> Result<LoopSummary> {
        let mut elapsed = 0.0;
        for _ in 0..frames {
            let (now, delta) = self.clock.tick();
            let update = context.tick(now, delta);
            renderer.render(context, &update)?;
            elapsed = now;
        }
        tracing::debug!("Ran {} frames at {} fps", frames, self.clock.fps());
        Ok(LoopSummary { frames, elapsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::error::SceneError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context() -> SceneContext {
        let mut config = SceneConfig::default();
        config.particles.count = 8;
        SceneContext::new(config, &mut StdRng::seed_from_u64(4)).unwrap()
    }

    #[test]
    fn test_clock() {
        let mut clock = FrameClock::new(50.0);
        assert_eq!(clock.tick(), (0.0, 0.0));
        assert_eq!(clock.tick(), (0.02, 0.02));
        assert_eq!(clock.frame(), 2);
        assert_eq!(FrameClock::new(-1.0).fps(), 60.0);
    }

    #[test]
    fn test_loop_records_frames() {
        let mut context = context();
        let mut recorder = FrameRecorder::new();
        let summary = FrameLoop::new(10.0).run(&mut context, &mut recorder, 11).unwrap();

        assert_eq!(summary.frames, 11);
        assert!((summary.elapsed - 1.0).abs() < 1e-5);
        assert_eq!(recorder.frames().len(), 11);
        assert_eq!(recorder.last().map(|f| f.frame), Some(10));
        assert_eq!(recorder.frames()[0].buffer_size, (1280, 720));
        // particles orbit, the idle camera does not move
        assert_ne!(recorder.frames()[0].particle_position, recorder.frames()[10].particle_position);
        assert!(recorder.camera_travel() < 1e-3);
    }

    struct FailingRenderer {
        after: usize,
        rendered: usize,
    }

    impl Renderer for FailingRenderer {
        fn render(&mut self, _context: &SceneContext, _update: &FrameUpdate) -> Result<()> {
            if self.rendered == self.after {
                return Err(SceneError::Config("surface lost".to_string()));
            }
            self.rendered += 1;
            Ok(())
        }
    }

    #[test]
    fn test_render_error_stops_loop() {
        let mut context = context();
        let mut renderer = FailingRenderer { after: 3, rendered: 0 };
        let result = FrameLoop::new(60.0).run(&mut context, &mut renderer, 10);
        assert!(result.is_err());
        assert_eq!(renderer.rendered, 3);
    }
}
