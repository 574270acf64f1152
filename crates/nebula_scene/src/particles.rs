// SPDX-License-Identifier: MIT OR Apache-2.0
//! Random point cloud that drifts around the scene origin.

use crate::config::ParticleSettings;
use glam::Vec3;
use rand::Rng;

/// Horizontal orbit with a vertical bob
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitMotion {
    /// Orbit radius
    pub radius: f32,
    /// Radians per second
    pub speed: f32,
    /// Vertical bob amplitude
    pub bob: f32,
}

impl Default for OrbitMotion {
    fn default() -> Self {
        Self {
            radius: 5.0,
            speed: 0.25,
            bob: 0.25,
        }
    }
}

impl OrbitMotion {
    /// Group offset at `elapsed` seconds
    pub fn offset(&self, elapsed: f32) -> Vec3 {
        let angle = elapsed * self.speed;
        Vec3::new(
            angle.cos() * self.radius,
            elapsed.sin() * self.bob,
            angle.sin() * self.radius,
        )
    }
}

/// Point cloud with per-point colors
#[derive(Debug, Clone)]
pub struct ParticleField {
    /// Point positions, relative to the group
    pub positions: Vec<Vec3>,
    /// Point colors, RGB in `[0, 1)`
    pub colors: Vec<Vec3>,
    /// Sprite variant, `1..=variants`
    pub variant: u32,
    /// Group position
    pub position: Vec3,
    /// Group motion
    pub motion: OrbitMotion,
}

impl ParticleField {
    /// Scatter `count` points uniformly in a cube of edge `spread`
    pub fn random(rng: &mut impl Rng, count: usize, spread: f32, variants: u32) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push((random_vec3(rng) - Vec3::splat(0.5)) * spread);
            colors.push(random_vec3(rng));
        }
        let variant = rng.random_range(1..=variants.max(1));

        tracing::debug!("Scattered {} particles, sprite variant {}", count, variant);
        Self {
            positions,
            colors,
            variant,
            position: Vec3::ZERO,
            motion: OrbitMotion::default(),
        }
    }

    /// Build from settings
    pub fn from_settings(rng: &mut impl Rng, settings: &ParticleSettings) -> Self {
        let mut field = Self::random(rng, settings.count, settings.spread, settings.texture_variants);
        field.motion = OrbitMotion {
            radius: settings.orbit_radius,
            speed: settings.orbit_speed,
            bob: settings.bob_amplitude,
        };
        field
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the field has no points
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sprite path inside `dir`
    pub fn texture_path(&self, dir: &str) -> String {
        format!("{}/{}.png", dir.trim_end_matches('/'), self.variant)
    }

    /// Move the group along its orbit
    pub fn orbit(&mut self, elapsed: f32) {
        self.position = self.motion.offset(elapsed);
    }
}

fn random_vec3(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(rng.random(), rng.random(), rng.random())
}
