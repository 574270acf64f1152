// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene configuration.
//!
//! Settings are stored as RON. Every field has a default, so a config file
//! only needs to list what it changes:
//! - Particle field (count, spread, material, orbit motion)
//! - Text block (font, content, extrusion)
//! - Camera and orbit controls
//! - Viewport
//! - Keyframe sequence driving the camera

use crate::error::{Result, SceneError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "scene.ron";

/// Pink, as linear RGB
pub const PINK: [f32; 3] = [1.0, 0.753, 0.796];

/// Particle field settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    /// Number of points
    pub count: usize,
    /// Edge length of the cube the points are scattered in
    pub spread: f32,
    /// Point size
    pub size: f32,
    /// Shrink points with distance
    pub size_attenuation: bool,
    /// Alpha below which fragments are discarded
    pub alpha_test: f32,
    /// Tint color
    pub color: [f32; 3],
    /// Multiply the tint by per-point colors
    pub vertex_colors: bool,
    /// Directory holding `1.png` .. `N.png` alpha maps
    pub texture_dir: String,
    /// Number of alpha map variants to pick from
    pub texture_variants: u32,
    /// Radius of the horizontal orbit
    pub orbit_radius: f32,
    /// Angular speed of the orbit (radians per second)
    pub orbit_speed: f32,
    /// Amplitude of the vertical bob
    pub bob_amplitude: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: 10_000,
            spread: 30.0,
            size: 0.4,
            size_attenuation: true,
            alpha_test: 0.15,
            color: PINK,
            vertex_colors: false,
            texture_dir: "textures/particles".to_string(),
            texture_variants: 12,
            orbit_radius: 5.0,
            orbit_speed: 0.25,
            bob_amplitude: 0.25,
        }
    }
}

/// Extruded text settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    /// Whether to build the text block
    pub enabled: bool,
    /// Typeface JSON path
    pub font: String,
    /// Text, `\n` separated lines
    pub content: String,
    /// Glyph size in world units
    pub size: f32,
    /// Extrusion depth
    pub depth: f32,
    /// Subdivisions per curved outline segment
    pub curve_segments: u32,
    /// Bevel the extrusion edges
    pub bevel_enabled: bool,
    /// Bevel depth along the extrusion axis
    pub bevel_thickness: f32,
    /// Bevel extent around the outline
    pub bevel_size: f32,
    /// Outline offset where the bevel starts
    pub bevel_offset: f32,
    /// Bevel subdivisions
    pub bevel_segments: u32,
    /// Text color
    pub color: [f32; 3],
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            font: "fonts/font-1.typeface.json".to_string(),
            content: "Nebula".to_string(),
            size: 2.0,
            depth: 0.2,
            curve_segments: 22,
            bevel_enabled: true,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_offset: 0.0,
            bevel_segments: 2,
            color: PINK,
        }
    }
}

/// Camera and orbit control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Initial position
    pub position: [f32; 3],
    /// Point the camera orbits and looks at
    pub target: [f32; 3],
    /// Smooth orbit motion
    pub damping: bool,
    /// Fraction of the pending rotation applied per update
    pub damping_factor: f32,
    /// Closest orbit distance
    pub min_distance: f32,
    /// Farthest orbit distance
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [6.0, 4.0, 12.0],
            target: [0.0, 0.0, 0.0],
            damping: true,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

/// Viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Initial width in CSS pixels
    pub width: u32,
    /// Initial height in CSS pixels
    pub height: u32,
    /// Display pixel ratio
    pub device_pixel_ratio: f32,
    /// Upper bound for the drawing buffer pixel ratio
    pub max_pixel_ratio: f32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: 1.0,
            max_pixel_ratio: 2.0,
        }
    }
}

/// Keyframe sequence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    /// JSON keyframe document; no sequence when unset
    pub document: Option<String>,
    /// Sheet to load; the first one when unset
    pub sheet: Option<String>,
    /// Object whose `position` drives the camera
    pub camera_object: String,
    /// Start playing once loaded
    pub autoplay: bool,
    /// Loop forever instead of playing once
    pub looping: bool,
    /// Playback rate
    pub rate: f32,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            document: None,
            sheet: None,
            camera_object: "Camera".to_string(),
            autoplay: true,
            looping: false,
            rate: 1.0,
        }
    }
}

/// Complete scene configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Particle field
    pub particles: ParticleSettings,
    /// Text block
    pub text: TextSettings,
    /// Camera
    pub camera: CameraSettings,
    /// Viewport
    pub viewport: ViewportSettings,
    /// Camera sequence
    pub sequence: SequenceSettings,
}

impl SceneConfig {
    /// Parse a RON config
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        let config: SceneConfig = ron::from_str(ron_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&contents)?;
        tracing::info!("Loaded scene config from {:?}", path);
        Ok(config)
    }

    /// Save as pretty RON
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved scene config to {:?}", path);
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let p = &self.particles;
        if !(p.spread.is_finite() && p.spread >= 0.0) {
            return Err(SceneError::Config(format!("particle spread {} must be >= 0", p.spread)));
        }
        if p.texture_variants == 0 {
            return Err(SceneError::Config("texture variants must be at least 1".to_string()));
        }

        let c = &self.camera;
        if !(c.fov > 0.0 && c.fov < 180.0) {
            return Err(SceneError::Config(format!("fov {} must be in (0, 180)", c.fov)));
        }
        if !(c.near > 0.0 && c.far > c.near) {
            return Err(SceneError::Config(format!(
                "clip planes near={} far={} must satisfy 0 < near < far",
                c.near, c.far
            )));
        }
        if !(0.0..=1.0).contains(&c.damping_factor) {
            return Err(SceneError::Config(format!(
                "damping factor {} must be in [0, 1]",
                c.damping_factor
            )));
        }
        if c.min_distance < 0.0 || c.max_distance < c.min_distance {
            return Err(SceneError::Config(format!(
                "orbit distances [{}, {}] are not ordered",
                c.min_distance, c.max_distance
            )));
        }

        let v = &self.viewport;
        if v.width == 0 || v.height == 0 {
            return Err(SceneError::Config("viewport must not be empty".to_string()));
        }
        if !(v.device_pixel_ratio > 0.0 && v.max_pixel_ratio > 0.0) {
            return Err(SceneError::Config("pixel ratios must be positive".to_string()));
        }

        if !(self.text.size > 0.0) {
            return Err(SceneError::Config(format!("text size {} must be positive", self.text.size)));
        }
        if !(self.sequence.rate.is_finite() && self.sequence.rate > 0.0) {
            return Err(SceneError::Config(format!(
                "sequence rate {} must be positive",
                self.sequence.rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let config = SceneConfig::default();
        assert_eq!(config.particles.count, 10_000);
        assert_eq!(config.camera.position, [6.0, 4.0, 12.0]);
        assert_eq!(config.viewport.max_pixel_ratio, 2.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SceneConfig::from_ron_str(
            r#"(
                particles: (count: 500),
                sequence: (document: Some("sequences/camera.json"), looping: true),
            )"#,
        )
        .unwrap();
        assert_eq!(config.particles.count, 500);
        assert_eq!(config.particles.spread, 30.0);
        assert_eq!(config.sequence.document.as_deref(), Some("sequences/camera.json"));
        assert!(config.sequence.looping);
        assert_eq!(config.camera.fov, 75.0);
    }

    #[test]
    fn test_validation() {
        let mut config = SceneConfig::default();
        config.camera.near = 0.0;
        assert!(matches!(config.validate(), Err(SceneError::Config(_))));

        let mut config = SceneConfig::default();
        config.particles.texture_variants = 0;
        assert!(config.validate().is_err());

        assert!(SceneConfig::from_ron_str("(camera: (fov: 190.0))").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("nebula_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        let mut config = SceneConfig::default();
        config.text.content = "Hello\nWorld".to_string();
        config.camera.max_distance = 40.0;
        config.save(&path).unwrap();

        let loaded = SceneConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
