// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene graph contents.

use crate::assets::AlphaTexture;
use crate::config::{ParticleSettings, TextSettings};
use crate::font::TextBlock;
use crate::particles::ParticleField;
use glam::Vec3;

/// Point sprite material
#[derive(Debug, Clone, PartialEq)]
pub struct PointsMaterial {
    /// Point size
    pub size: f32,
    /// Shrink with distance
    pub size_attenuation: bool,
    /// Discard threshold for the alpha map
    pub alpha_test: f32,
    /// Tint
    pub color: Vec3,
    /// Alpha map; points render as squares without one
    pub alpha_map: Option<AlphaTexture>,
    /// Blend with what is behind
    pub transparent: bool,
    /// Take per-point colors from the field
    pub vertex_colors: bool,
}

impl PointsMaterial {
    /// Material from settings, without an alpha map
    pub fn from_settings(settings: &ParticleSettings) -> Self {
        Self {
            size: settings.size,
            size_attenuation: settings.size_attenuation,
            alpha_test: settings.alpha_test,
            color: Vec3::from_array(settings.color),
            alpha_map: None,
            transparent: true,
            vertex_colors: settings.vertex_colors,
        }
    }
}

/// Extruded text object
#[derive(Debug, Clone, PartialEq)]
pub struct TextMesh {
    /// Centered layout
    pub block: TextBlock,
    /// Flat color
    pub color: Vec3,
}

impl TextMesh {
    /// Mesh from a laid out block; the block is centered on the origin
    pub fn new(mut block: TextBlock, settings: &TextSettings) -> Self {
        block.center();
        Self {
            block,
            color: Vec3::from_array(settings.color),
        }
    }
}

/// Everything drawn each frame
#[derive(Debug, Clone)]
pub struct Scene {
    /// Particle group
    pub particles: ParticleField,
    /// Particle material
    pub particle_material: PointsMaterial,
    /// Optional text block
    pub text: Option<TextMesh>,
}

impl Scene {
    /// Scene with the given particle group and no text
    pub fn new(particles: ParticleField, particle_material: PointsMaterial) -> Self {
        Self {
            particles,
            particle_material,
            text: None,
        }
    }

    /// Number of drawable objects
    pub fn object_count(&self) -> usize {
        1 + usize::from(self.text.is_some())
    }

    /// Advance time-driven motion
    pub fn animate(&mut self, elapsed: f32) {
        self.particles.orbit(elapsed);
    }
}
