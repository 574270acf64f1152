// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset loading.
//!
//! Every load is a one-shot async read below a root directory. A file that
//! cannot be read becomes [`SceneError::MissingAsset`]; a file that cannot be
//! decoded becomes [`SceneError::InvalidAsset`].

use crate::error::{Result, SceneError};
use crate::font::Typeface;
use nebula_sequencer::Sequencer;
use std::path::{Path, PathBuf};

/// Single-channel alpha map
///
/// Built from the green channel of the source image, which is how the
/// particle sprites store their coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaTexture {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major alpha values
    pub alpha: Vec<u8>,
}

impl AlphaTexture {
    /// Alpha at a pixel, normalized to `[0, 1]`
    pub fn sample(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y * self.width + x) as usize;
        self.alpha.get(index).map(|a| f32::from(*a) / 255.0)
    }

    /// Share of pixels at or above `threshold`
    pub fn coverage(&self, threshold: f32) -> f32 {
        if self.alpha.is_empty() {
            return 0.0;
        }
        let cutoff = (threshold.clamp(0.0, 1.0) * 255.0).round() as u8;
        let covered = self.alpha.iter().filter(|a| **a >= cutoff).count();
        covered as f32 / self.alpha.len() as f32
    }
}

/// Loads assets relative to a root directory
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an asset path; a leading `/` is relative to the root
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Read raw bytes
    pub async fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(path);
        match tokio::fs::read(&resolved).await {
            Ok(bytes) => {
                tracing::debug!("Loaded {} bytes from {:?}", bytes.len(), resolved);
                Ok(bytes)
            }
            Err(source) => Err(SceneError::MissingAsset {
                path: resolved,
                source,
            }),
        }
    }

    /// Read a UTF-8 text file
    pub async fn load_text(&self, path: &str) -> Result<String> {
        let bytes = self.load_bytes(path).await?;
        String::from_utf8(bytes).map_err(|e| SceneError::InvalidAsset {
            path: self.resolve(path),
            reason: e.to_string(),
        })
    }

    /// Decode an image into an alpha map
    pub async fn load_texture(&self, path: &str) -> Result<AlphaTexture> {
        let bytes = self.load_bytes(path).await?;
        let image = image::load_from_memory(&bytes).map_err(|e| SceneError::InvalidAsset {
            path: self.resolve(path),
            reason: e.to_string(),
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let alpha = rgba.pixels().map(|p| p.0[1]).collect();
        Ok(AlphaTexture {
            width,
            height,
            alpha,
        })
    }

    /// Parse a typeface JSON file
    pub async fn load_typeface(&self, path: &str) -> Result<Typeface> {
        let text = self.load_text(path).await?;
        Typeface::from_json(&text).map_err(|e| SceneError::InvalidAsset {
            path: self.resolve(path),
            reason: e.to_string(),
        })
    }

    /// Parse a keyframe document into a sequencer
    ///
    /// Loads `sheet` when given, otherwise the first sheet.
    pub async fn load_sequencer(&self, path: &str, sheet: Option<&str>) -> Result<Sequencer> {
        let json = self.load_text(path).await?;
        let sequencer = match sheet {
            Some(sheet) => Sequencer::load_sheet(&json, sheet)?,
            None => Sequencer::load(&json)?,
        };
        Ok(sequencer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nebula_assets_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_resolve_strips_leading_slash() {
        let loader = AssetLoader::new("/srv/static");
        assert_eq!(
            loader.resolve("/textures/particles/1.png"),
            PathBuf::from("/srv/static/textures/particles/1.png")
        );
        assert_eq!(loader.resolve("fonts/a.json"), PathBuf::from("/srv/static/fonts/a.json"));
    }

    #[test]
    fn test_missing_asset_reports_path() {
        let root = temp_root("missing");
        let loader = AssetLoader::new(&root);
        let err = block_on(loader.load_bytes("nope.png")).unwrap_err();
        assert!(matches!(err, SceneError::MissingAsset { .. }));
        assert_eq!(err.asset_path(), Some(root.join("nope.png").as_path()));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_texture_uses_green_channel() {
        let root = temp_root("texture");
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 200, 0, 255]));
        img.save(root.join("sprite.png")).unwrap();

        let loader = AssetLoader::new(&root);
        let texture = block_on(loader.load_texture("sprite.png")).unwrap();
        assert_eq!((texture.width, texture.height), (2, 1));
        assert_eq!(texture.alpha, vec![0, 200]);
        assert_eq!(texture.sample(1, 0), Some(200.0 / 255.0));
        assert_eq!(texture.sample(2, 0), None);
        assert_eq!(texture.coverage(0.5), 0.5);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_undecodable_texture() {
        let root = temp_root("garbage");
        std::fs::write(root.join("bad.png"), b"not an image").unwrap();
        let loader = AssetLoader::new(&root);
        let err = block_on(loader.load_texture("bad.png")).unwrap_err();
        assert!(matches!(err, SceneError::InvalidAsset { .. }));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_sequencer() {
        let root = temp_root("sequence");
        std::fs::write(
            root.join("camera.json"),
            r#"{
                "sheetsById": {
                    "Scene": {
                        "sequence": {
                            "length": 4,
                            "tracksByObject": {
                                "Camera": {
                                    "trackData": {
                                        "t1": {
                                            "type": "BasicKeyframedTrack",
                                            "keyframes": [
                                                {"id": "a", "position": 0, "value": 1, "connectedRight": true, "type": "linear"},
                                                {"id": "b", "position": 2, "value": 3, "connectedRight": true, "type": "linear"}
                                            ]
                                        }
                                    },
                                    "trackIdByPropPath": {"[\"position\",\"x\"]": "t1"}
                                }
                            }
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        let loader = AssetLoader::new(&root);
        let sequencer = block_on(loader.load_sequencer("camera.json", None)).unwrap();
        assert_eq!(sequencer.sequence().property_count(), 1);

        let err = block_on(loader.load_sequencer("camera.json", Some("Other"))).unwrap_err();
        assert!(matches!(err, SceneError::Sequence(_)));
        std::fs::remove_dir_all(&root).unwrap();
    }
}
