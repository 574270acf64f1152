// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output surface size.

use crate::config::ViewportSettings;

/// Logical size and drawing buffer size of the output surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    max_pixel_ratio: f32,
}

impl Viewport {
    /// Viewport from settings
    pub fn from_settings(settings: &ViewportSettings) -> Self {
        let mut viewport = Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
            max_pixel_ratio: settings.max_pixel_ratio,
        };
        viewport.resize(settings.width, settings.height, settings.device_pixel_ratio);
        viewport
    }

    /// Apply a new size; the pixel ratio is capped by the configured maximum
    ///
    /// Zero sizes are raised to one pixel so the aspect stays finite.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.width = width.max(1);
        self.height = height.max(1);
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        self.pixel_ratio = ratio.min(self.max_pixel_ratio);
        tracing::debug!(
            "Viewport {}x{} @ {} -> buffer {:?}",
            self.width,
            self.height,
            self.pixel_ratio,
            self.buffer_size()
        );
    }

    /// Logical width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Effective pixel ratio
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Drawing buffer size in physical pixels
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}
