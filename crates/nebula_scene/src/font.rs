// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typeface fonts and text layout.
//!
//! Typefaces use the JSON glyph format: each glyph has an advance (`ha`) and
//! an outline string of `m`, `l`, `q` and `b` commands in font units. Curve
//! commands list their end point first, then the control points.

use crate::config::TextSettings;
use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::collections::HashMap;

/// Glyph used when a character has no glyph of its own
pub const FALLBACK_GLYPH: char = '?';

/// One outline command in font units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    /// Start a new contour
    MoveTo(Vec2),
    /// Straight segment
    LineTo(Vec2),
    /// Quadratic curve: control, end
    QuadTo(Vec2, Vec2),
    /// Cubic curve: control 1, control 2, end
    CubicTo(Vec2, Vec2, Vec2),
}

/// A glyph with its parsed outline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    /// Horizontal advance in font units
    pub advance: f32,
    /// Leftmost extent
    pub x_min: f32,
    /// Rightmost extent
    pub x_max: f32,
    /// Outline commands
    pub outline: Vec<OutlineCommand>,
}

#[derive(Debug, Deserialize)]
struct GlyphData {
    ha: f32,
    #[serde(default)]
    x_min: f32,
    #[serde(default)]
    x_max: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBox {
    y_min: f32,
    y_max: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceData {
    glyphs: HashMap<String, GlyphData>,
    #[serde(default)]
    family_name: Option<String>,
    resolution: f32,
    bounding_box: BoundingBox,
    #[serde(default)]
    underline_thickness: f32,
}

/// A parsed typeface
#[derive(Debug, Clone)]
pub struct Typeface {
    /// Family name, when the file has one
    pub family_name: Option<String>,
    /// Font units per em
    pub resolution: f32,
    /// Lowest point of any glyph
    pub y_min: f32,
    /// Highest point of any glyph
    pub y_max: f32,
    /// Underline thickness in font units
    pub underline_thickness: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Typeface {
    /// Parse typeface JSON
    ///
    /// Glyphs with malformed outlines keep their advance but draw nothing.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let data: TypefaceData = serde_json::from_str(json)?;

        let mut glyphs = HashMap::with_capacity(data.glyphs.len());
        for (key, glyph) in data.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                tracing::debug!("Skipping multi-character glyph key {:?}", key);
                continue;
            };
            let outline = match glyph.o.as_deref() {
                Some(o) => parse_outline(o).unwrap_or_else(|| {
                    tracing::warn!("Malformed outline for glyph {:?}", ch);
                    Vec::new()
                }),
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    x_min: glyph.x_min,
                    x_max: glyph.x_max,
                    outline,
                },
            );
        }

        Ok(Self {
            family_name: data.family_name,
            resolution: data.resolution,
            y_min: data.bounding_box.y_min,
            y_max: data.bounding_box.y_max,
            underline_thickness: data.underline_thickness,
            glyphs,
        })
    }

    /// Glyph for a character, without fallback
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Glyph for a character, falling back to `?`
    pub fn glyph_or_fallback(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch).or_else(|| self.glyphs.get(&FALLBACK_GLYPH))
    }

    /// Number of glyphs
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Line height in font units
    pub fn line_height(&self) -> f32 {
        self.y_max - self.y_min + self.underline_thickness
    }
}

fn next_point<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<Vec2> {
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    Some(Vec2::new(x, y))
}

fn parse_outline(outline: &str) -> Option<Vec<OutlineCommand>> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();
    while let Some(action) = tokens.next() {
        let command = match action {
            "m" => OutlineCommand::MoveTo(next_point(&mut tokens)?),
            "l" => OutlineCommand::LineTo(next_point(&mut tokens)?),
            "q" => {
                let end = next_point(&mut tokens)?;
                let control = next_point(&mut tokens)?;
                OutlineCommand::QuadTo(control, end)
            }
            "b" => {
                let end = next_point(&mut tokens)?;
                let c1 = next_point(&mut tokens)?;
                let c2 = next_point(&mut tokens)?;
                OutlineCommand::CubicTo(c1, c2, end)
            }
            // close
            "z" => continue,
            _ => return None,
        };
        commands.push(command);
    }
    Some(commands)
}

/// Extrusion parameters for a text block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph size in world units
    pub size: f32,
    /// Extrusion depth
    pub depth: f32,
    /// Points per curved segment
    pub curve_segments: u32,
    /// Whether the bevel is applied
    pub bevel_enabled: bool,
    /// Bevel depth
    pub bevel_thickness: f32,
    /// Bevel extent
    pub bevel_size: f32,
    /// Bevel start offset
    pub bevel_offset: f32,
}

impl From<&TextSettings> for TextStyle {
    fn from(settings: &TextSettings) -> Self {
        Self {
            size: settings.size,
            depth: settings.depth,
            curve_segments: settings.curve_segments,
            bevel_enabled: settings.bevel_enabled,
            bevel_thickness: settings.bevel_thickness,
            bevel_size: settings.bevel_size,
            bevel_offset: settings.bevel_offset,
        }
    }
}

/// Laid out and flattened text
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Closed contours in world units, z = 0 at the front face
    pub contours: Vec<Vec<Vec2>>,
    /// Number of lines
    pub lines: usize,
    /// Characters that had no glyph and no fallback
    pub skipped: usize,
    /// Offset applied by [`TextBlock::center`]
    pub offset: Vec3,
    min: Vec3,
    max: Vec3,
}

impl TextBlock {
    /// Bounding box minimum, including extrusion and bevel
    pub fn min(&self) -> Vec3 {
        self.min + self.offset
    }

    /// Bounding box maximum, including extrusion and bevel
    pub fn max(&self) -> Vec3 {
        self.max + self.offset
    }

    /// Bounding box extent
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether nothing was drawn
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Translate so the bounding box is centered on the origin
    pub fn center(&mut self) {
        if self.is_empty() {
            return;
        }
        self.offset = -(self.min + self.max) * 0.5;
    }

    /// Point of a contour with the centering offset applied
    pub fn world_point(&self, contour: usize, index: usize) -> Option<Vec3> {
        let p = self.contours.get(contour)?.get(index)?;
        Some(p.extend(0.0) + self.offset)
    }
}

/// Lay out `text` with `face`
///
/// Glyphs advance by `ha * size / resolution`. A newline returns to x = 0 and
/// moves down one line height. Characters without a glyph use `?`, or are
/// skipped if the face has none.
pub fn layout_text(face: &Typeface, text: &str, style: &TextStyle) -> TextBlock {
    let scale = if face.resolution > 0.0 {
        style.size / face.resolution
    } else {
        0.0
    };
    let line_height = face.line_height() * scale;
    let segments = style.curve_segments.max(1);

    let mut contours: Vec<Vec<Vec2>> = Vec::new();
    let mut cursor = Vec2::ZERO;
    let mut lines = 1;
    let mut skipped = 0;

    for ch in text.chars() {
        if ch == '\n' {
            cursor = Vec2::new(0.0, cursor.y - line_height);
            lines += 1;
            continue;
        }
        let Some(glyph) = face.glyph_or_fallback(ch) else {
            tracing::debug!("No glyph for {:?}", ch);
            skipped += 1;
            continue;
        };

        let place = |p: Vec2| p * scale + cursor;
        let mut pen = Vec2::ZERO;
        for command in &glyph.outline {
            match *command {
                OutlineCommand::MoveTo(p) => {
                    pen = place(p);
                    contours.push(vec![pen]);
                }
                OutlineCommand::LineTo(p) => {
                    pen = place(p);
                    push_point(&mut contours, pen);
                }
                OutlineCommand::QuadTo(c, p) => {
                    let (start, c, end) = (pen, place(c), place(p));
                    for i in 1..=segments {
                        let t = i as f32 / segments as f32;
                        let u = 1.0 - t;
                        push_point(&mut contours, start * u * u + c * 2.0 * u * t + end * t * t);
                    }
                    pen = end;
                }
                OutlineCommand::CubicTo(c1, c2, p) => {
                    let (start, c1, c2, end) = (pen, place(c1), place(c2), place(p));
                    for i in 1..=segments {
                        let t = i as f32 / segments as f32;
                        let u = 1.0 - t;
                        push_point(
                            &mut contours,
                            start * u * u * u
                                + c1 * 3.0 * u * u * t
                                + c2 * 3.0 * u * t * t
                                + end * t * t * t,
                        );
                    }
                    pen = end;
                }
            }
        }
        cursor.x += glyph.advance * scale;
    }

    let (mut min, mut max) = (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY));
    for point in contours.iter().flatten() {
        min = min.min(*point);
        max = max.max(*point);
    }

    let (min, max) = if contours.is_empty() {
        (Vec3::ZERO, Vec3::ZERO)
    } else if style.bevel_enabled {
        let grow = style.bevel_size + style.bevel_offset;
        (
            (min - Vec2::splat(grow)).extend(-style.bevel_thickness),
            (max + Vec2::splat(grow)).extend(style.depth + style.bevel_thickness),
        )
    } else {
        (min.extend(0.0), max.extend(style.depth))
    };

    TextBlock {
        contours,
        lines,
        skipped,
        offset: Vec3::ZERO,
        min,
        max,
    }
}

fn push_point(contours: &mut Vec<Vec<Vec2>>, point: Vec2) {
    match contours.last_mut() {
        Some(contour) => contour.push(point),
        None => contours.push(vec![point]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE: &str = r#"{
        "familyName": "Test Sans",
        "resolution": 1000,
        "boundingBox": {"xMin": 0, "yMin": -200, "xMax": 600, "yMax": 800},
        "underlineThickness": 50,
        "glyphs": {
            "A": {"ha": 600, "x_min": 0, "x_max": 600, "o": "m 0 0 l 600 0 l 600 700 l 0 700"},
            "O": {"ha": 700, "x_min": 0, "x_max": 700, "o": "m 0 350 q 350 700 0 700 q 700 350 700 700"},
            "?": {"ha": 500, "x_min": 0, "x_max": 500, "o": "m 0 0 l 500 0 l 500 500"},
            " ": {"ha": 300}
        }
    }"#;

    fn style(size: f32) -> TextStyle {
        TextStyle {
            size,
            depth: 0.2,
            curve_segments: 4,
            bevel_enabled: false,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_offset: 0.0,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_parse_typeface() {
        let face = Typeface::from_json(FACE).unwrap();
        assert_eq!(face.family_name.as_deref(), Some("Test Sans"));
        assert_eq!(face.glyph_count(), 4);
        assert_eq!(face.line_height(), 1050.0);

        let o = face.glyph('O').unwrap();
        assert_eq!(
            o.outline[1],
            OutlineCommand::QuadTo(Vec2::new(0.0, 700.0), Vec2::new(350.0, 700.0))
        );
        assert!(face.glyph(' ').unwrap().outline.is_empty());
    }

    #[test]
    fn test_advance_and_newline() {
        let face = Typeface::from_json(FACE).unwrap();
        let block = layout_text(&face, "AA\nA", &style(1.0));
        assert_eq!(block.contours.len(), 3);
        assert_eq!(block.lines, 2);

        // second glyph starts one advance to the right
        assert!(approx(block.contours[1][0].x, 0.6));
        // third glyph is back at x = 0, one line down
        assert!(approx(block.contours[2][0].x, 0.0));
        assert!(approx(block.contours[2][0].y, -1.05));

        assert!(approx(block.size().x, 1.2));
        assert!(approx(block.size().z, 0.2));
    }

    #[test]
    fn test_unknown_glyph_falls_back() {
        let face = Typeface::from_json(FACE).unwrap();
        let block = layout_text(&face, "Z", &style(1.0));
        assert_eq!(block.contours.len(), 1);
        assert_eq!(block.skipped, 0);
        assert!(approx(block.size().x, 0.5));

        let without_fallback = FACE.replace(r#""?": {"ha": 500, "x_min": 0, "x_max": 500, "o": "m 0 0 l 500 0 l 500 500"},"#, "");
        let face = Typeface::from_json(&without_fallback).unwrap();
        let block = layout_text(&face, "ZA", &style(1.0));
        assert_eq!(block.skipped, 1);
        assert_eq!(block.contours.len(), 1);
        assert!(approx(block.contours[0][0].x, 0.0));
    }

    #[test]
    fn test_curves_are_flattened() {
        let face = Typeface::from_json(FACE).unwrap();
        let block = layout_text(&face, "O", &style(1.0));
        // move + two quads of four segments each
        assert_eq!(block.contours[0].len(), 9);
        let last = *block.contours[0].last().unwrap();
        assert!(approx(last.x, 0.7) && approx(last.y, 0.35));
    }

    #[test]
    fn test_centering_with_bevel() {
        let face = Typeface::from_json(FACE).unwrap();
        let mut s = style(2.0);
        s.bevel_enabled = true;
        let mut block = layout_text(&face, "A", &s);

        assert!(approx(block.size().x, 1.2 + 0.04));
        assert!(approx(block.size().z, 0.2 + 0.06));

        block.center();
        let center = (block.min() + block.max()) * 0.5;
        assert!(center.length() < 1e-4);
        let first = block.world_point(0, 0).unwrap();
        assert!(approx(first.x, -0.6));
    }

    #[test]
    fn test_space_only_text_is_empty() {
        let face = Typeface::from_json(FACE).unwrap();
        let mut block = layout_text(&face, "  ", &style(1.0));
        assert!(block.is_empty());
        block.center();
        assert_eq!(block.min(), Vec3::ZERO);
    }
}
