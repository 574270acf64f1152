// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline panel.
//!
//! Features:
//! - Transport controls and timecode
//! - Time ruler with drag-to-scrub
//! - One row per animated channel, keyframes shaped by interpolation
//! - Playhead and playback range
//! - Zoom navigation

use crate::binding::PropertyKey;
use crate::keyframe::InterpolationMode;
use crate::sequencer::Sequencer;
use crate::track::KeyframeTrack;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

const ROW_HEIGHT: f32 = 24.0;
const ROW_HEADER_WIDTH: f32 = 180.0;
const RULER_HEIGHT: f32 = 28.0;
const KEYFRAME_SIZE: f32 = 9.0;
const PLAYHEAD_WIDTH: f32 = 2.0;
const MIN_ZOOM: f32 = 20.0;
const MAX_ZOOM: f32 = 500.0;

const PLAYHEAD_COLOR: Color32 = Color32::from_rgb(255, 100, 100);
const RANGE_COLOR: Color32 = Color32::from_rgba_premultiplied(60, 90, 140, 40);

/// Timeline view state
#[derive(Debug, Clone)]
pub struct TimelineState {
    /// Horizontal zoom level (pixels per second)
    pub zoom: f32,
    /// Scroll offset (in seconds)
    pub scroll_offset: f32,
    /// Vertical scroll offset (in pixels)
    pub vertical_scroll: f32,
    /// Snap scrubbing to the sequence frame grid
    pub snap_enabled: bool,
    /// Auto-scroll to follow playhead
    pub auto_scroll: bool,
    /// Selected channel row
    pub selected: Option<(PropertyKey, String)>,
    dragging_playhead: bool,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineState {
    /// Create a new timeline state
    pub fn new() -> Self {
        Self {
            zoom: 100.0,
            scroll_offset: 0.0,
            vertical_scroll: 0.0,
            snap_enabled: true,
            auto_scroll: true,
            selected: None,
            dragging_playhead: false,
        }
    }

    /// Convert time to x position, relative to the panel's left edge
    pub fn time_to_x(&self, time: f32) -> f32 {
        (time - self.scroll_offset) * self.zoom + ROW_HEADER_WIDTH
    }

    /// Convert x position to time
    pub fn x_to_time(&self, x: f32) -> f32 {
        (x - ROW_HEADER_WIDTH) / self.zoom + self.scroll_offset
    }

    /// Multiply the zoom, within limits
    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Render the full timeline
    pub fn ui(&mut self, ui: &mut egui::Ui, sequencer: &mut Sequencer) {
        self.render_toolbar(ui, sequencer);
        ui.separator();

        let area = ui.available_rect_before_wrap();
        let ruler_rect = Rect::from_min_size(area.min, Vec2::new(area.width(), RULER_HEIGHT));
        let rows_rect = Rect::from_min_max(Pos2::new(area.min.x, ruler_rect.max.y), area.max);

        self.render_ruler(ui, ruler_rect, sequencer);
        self.render_rows(ui, rows_rect, sequencer);

        if self.auto_scroll && sequencer.is_playing() {
            let visible = (area.width() - ROW_HEADER_WIDTH).max(1.0) / self.zoom;
            let time = sequencer.position();
            if time > self.scroll_offset + visible * 0.9 || time < self.scroll_offset {
                self.scroll_offset = (time - visible * 0.1).max(0.0);
            }
        }

        ui.allocate_rect(area, Sense::hover());
    }

    /// Transport controls, timecode and zoom
    fn render_toolbar(&mut self, ui: &mut egui::Ui, sequencer: &mut Sequencer) {
        ui.horizontal(|ui| {
            let label = if sequencer.is_playing() { "Pause" } else { "Play" };
            if ui.button(label).on_hover_text("Play/Pause").clicked() {
                if sequencer.is_playing() {
                    sequencer.pause();
                } else if !sequencer.resume() {
                    if let Err(e) = sequencer.play(Default::default()) {
                        tracing::warn!("Cannot play `{}`: {}", sequencer.sequence().name, e);
                    }
                }
            }
            if ui.button("Stop").clicked() {
                sequencer.stop();
            }

            ui.separator();
            let sequence = sequencer.sequence();
            ui.monospace(format_timecode(sequencer.position(), sequence.subunits_per_unit));

            ui.separator();
            ui.checkbox(&mut self.snap_enabled, "Snap");

            ui.separator();
            ui.label("Zoom:");
            if ui.button("-").clicked() {
                self.zoom_by(0.8);
            }
            ui.add(
                egui::DragValue::new(&mut self.zoom)
                    .range(MIN_ZOOM..=MAX_ZOOM)
                    .speed(1.0),
            );
            if ui.button("+").clicked() {
                self.zoom_by(1.25);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let sequence = sequencer.sequence();
                ui.label(format!(
                    "{} | {} properties | Length: {:.2}s",
                    sequence.name,
                    sequence.property_count(),
                    sequence.length()
                ));
            });
        });
    }

    /// Time ruler, range highlight and scrubbing
    fn render_ruler(&mut self, ui: &mut egui::Ui, rect: Rect, sequencer: &mut Sequencer) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(40));

        let range = sequencer.playback().range();
        let range_rect = Rect::from_min_max(
            Pos2::new(rect.min.x + self.time_to_x(range.start).max(ROW_HEADER_WIDTH), rect.min.y),
            Pos2::new(rect.min.x + self.time_to_x(range.end).max(ROW_HEADER_WIDTH), rect.max.y),
        );
        painter.rect_filled(range_rect, 0.0, RANGE_COLOR);

        let visible_end = self.x_to_time(rect.width());
        let tick_interval = tick_interval(self.zoom);

        let mut index = (self.scroll_offset / tick_interval).floor() as i64;
        loop {
            let time = index as f32 * tick_interval;
            if time > visible_end {
                break;
            }
            let x = rect.min.x + self.time_to_x(time);
            if x >= rect.min.x + ROW_HEADER_WIDTH {
                // Every fifth tick is labelled
                let is_major = index % 5 == 0;
                let (height, color) = if is_major {
                    (12.0, Color32::from_gray(180))
                } else {
                    (6.0, Color32::from_gray(100))
                };
                painter.line_segment(
                    [Pos2::new(x, rect.max.y - height), Pos2::new(x, rect.max.y)],
                    Stroke::new(1.0, color),
                );
                if is_major {
                    painter.text(
                        Pos2::new(x + 2.0, rect.min.y + 4.0),
                        egui::Align2::LEFT_TOP,
                        format!("{time:.1}s"),
                        egui::FontId::monospace(10.0),
                        Color32::from_gray(180),
                    );
                }
            }
            index += 1;
        }

        let playhead_x = rect.min.x + self.time_to_x(sequencer.position());
        if playhead_x >= rect.min.x + ROW_HEADER_WIDTH && playhead_x <= rect.max.x {
            painter.add(egui::Shape::convex_polygon(
                vec![
                    Pos2::new(playhead_x, rect.max.y - 8.0),
                    Pos2::new(playhead_x - 6.0, rect.max.y),
                    Pos2::new(playhead_x + 6.0, rect.max.y),
                ],
                PLAYHEAD_COLOR,
                Stroke::NONE,
            ));
        }

        let response = ui.interact(rect, ui.id().with("timeline_ruler"), Sense::click_and_drag());
        if response.drag_started() || response.clicked() {
            self.dragging_playhead = true;
        }
        if self.dragging_playhead {
            if let Some(pos) = response.interact_pointer_pos() {
                let mut time = self.x_to_time(pos.x - rect.min.x).max(0.0);
                if self.snap_enabled {
                    time = sequencer.sequence().snap_to_frame(time);
                }
                sequencer.seek(time);
            }
        }
        if response.drag_stopped() || response.clicked() {
            self.dragging_playhead = false;
        }
    }

    /// Channel rows with keyframes and the playhead line
    fn render_rows(&mut self, ui: &mut egui::Ui, rect: Rect, sequencer: &mut Sequencer) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(30));
        painter.rect_filled(
            Rect::from_min_size(rect.min, Vec2::new(ROW_HEADER_WIDTH, rect.height())),
            0.0,
            Color32::from_gray(35),
        );

        let rows: Vec<(PropertyKey, String)> = sequencer
            .sequence()
            .properties()
            .flat_map(|p| p.channels().map(|t| (p.key.clone(), t.channel.clone())))
            .collect();

        let mut y = rect.min.y - self.vertical_scroll;
        let mut mute_toggle = None;
        for (index, (key, channel)) in rows.iter().enumerate() {
            if y > rect.max.y {
                break;
            }
            if y + ROW_HEIGHT > rect.min.y {
                let row_rect = Rect::from_min_size(
                    Pos2::new(rect.min.x, y),
                    Vec2::new(rect.width(), ROW_HEIGHT),
                );
                let Some(track) = sequencer
                    .sequence()
                    .property(key)
                    .and_then(|p| p.channel(channel))
                else {
                    continue;
                };
                let selected = self
                    .selected
                    .as_ref()
                    .is_some_and(|(k, c)| k == key && c == channel);
                self.render_row(&painter, row_rect, key, track, selected, index);

                let header = Rect::from_min_size(row_rect.min, Vec2::new(ROW_HEADER_WIDTH, ROW_HEIGHT));
                let response = ui.interact(header, ui.id().with(("timeline_row", index)), Sense::click());
                if response.clicked() {
                    self.selected = Some((key.clone(), channel.clone()));
                }
                if response.double_clicked() {
                    mute_toggle = Some((key.clone(), channel.clone(), !track.muted));
                }
            }
            y += ROW_HEIGHT;
        }

        if let Some((key, channel, muted)) = mute_toggle {
            sequencer.set_channel_muted(&key, &channel, muted);
        }

        let playhead_x = rect.min.x + self.time_to_x(sequencer.position());
        if playhead_x >= rect.min.x + ROW_HEADER_WIDTH && playhead_x <= rect.max.x {
            painter.line_segment(
                [Pos2::new(playhead_x, rect.min.y), Pos2::new(playhead_x, rect.max.y)],
                Stroke::new(PLAYHEAD_WIDTH, PLAYHEAD_COLOR),
            );
        }
    }

    fn render_row(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        key: &PropertyKey,
        track: &KeyframeTrack,
        selected: bool,
        index: usize,
    ) {
        let background = if selected {
            Color32::from_rgb(50, 60, 80)
        } else if index % 2 == 0 {
            Color32::from_gray(32)
        } else {
            Color32::from_gray(36)
        };
        painter.rect_filled(rect, 0.0, background);

        let text_color = if track.muted {
            Color32::from_gray(100)
        } else {
            Color32::from_gray(200)
        };
        painter.text(
            Pos2::new(rect.min.x + 6.0, rect.center().y),
            egui::Align2::LEFT_CENTER,
            format!("{key}.{}", track.channel),
            egui::FontId::proportional(12.0),
            text_color,
        );

        let center_y = rect.center().y;
        for kf in track.keyframes() {
            let x = rect.min.x + self.time_to_x(kf.time);
            if x < rect.min.x + ROW_HEADER_WIDTH || x > rect.max.x {
                continue;
            }
            let center = Pos2::new(x, center_y);
            let half = KEYFRAME_SIZE / 2.0;
            let color = keyframe_color(kf.interpolation, track.muted);
            match kf.interpolation {
                InterpolationMode::Step => {
                    painter.rect_filled(
                        Rect::from_center_size(center, Vec2::splat(KEYFRAME_SIZE)),
                        0.0,
                        color,
                    );
                }
                InterpolationMode::Linear => {
                    painter.add(egui::Shape::convex_polygon(
                        vec![
                            Pos2::new(x, center_y - half),
                            Pos2::new(x + half, center_y),
                            Pos2::new(x, center_y + half),
                            Pos2::new(x - half, center_y),
                        ],
                        color,
                        Stroke::new(1.0, Color32::BLACK),
                    ));
                }
                InterpolationMode::Curve => {
                    painter.circle_filled(center, half, color);
                }
            }
        }
    }
}

/// Ruler tick spacing for a zoom level
fn tick_interval(zoom: f32) -> f32 {
    if zoom > 200.0 {
        0.1
    } else if zoom > 100.0 {
        0.2
    } else if zoom > 50.0 {
        0.5
    } else {
        1.0
    }
}

fn keyframe_color(mode: InterpolationMode, muted: bool) -> Color32 {
    if muted {
        return Color32::from_gray(90);
    }
    match mode {
        InterpolationMode::Step => Color32::from_rgb(255, 200, 100),
        InterpolationMode::Linear => Color32::from_rgb(100, 150, 255),
        InterpolationMode::Curve => Color32::from_rgb(150, 255, 100),
    }
}

/// `mm:ss:ff` timecode
pub fn format_timecode(time: f32, subunits_per_unit: u32) -> String {
    let time = time.max(0.0);
    let minutes = (time / 60.0) as u32;
    let seconds = (time % 60.0) as u32;
    let frames = ((time % 1.0) * subunits_per_unit as f32) as u32;
    format!("{minutes:02}:{seconds:02}:{frames:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::AnimatedProperty;
    use crate::keyframe::Keyframe;
    use crate::sequence::Sequence;

    fn sequencer() -> Sequencer {
        let mut seq = Sequence::new("Timeline", 4.0).unwrap();
        let mut prop = AnimatedProperty::new(PropertyKey::new("Camera", "position"));
        prop.add_channel(
            KeyframeTrack::new(
                "x",
                vec![
                    Keyframe::new(0.0, 0.0).with_interpolation(InterpolationMode::Step),
                    Keyframe::new(1.0, 1.0),
                    Keyframe::new(2.0, 2.0).with_interpolation(InterpolationMode::Curve),
                    Keyframe::new(3.0, 0.0),
                ],
            )
            .unwrap(),
        )
        .unwrap();
        seq.add_property(prop).unwrap();
        Sequencer::new(seq)
    }

    #[test]
    fn test_time_x_conversion() {
        let mut state = TimelineState::new();
        state.scroll_offset = 1.0;
        let x = state.time_to_x(2.5);
        assert_eq!(x, 150.0 + ROW_HEADER_WIDTH);
        assert!((state.x_to_time(x) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_limits() {
        let mut state = TimelineState::new();
        for _ in 0..50 {
            state.zoom_by(1.25);
        }
        assert_eq!(state.zoom, MAX_ZOOM);
        for _ in 0..50 {
            state.zoom_by(0.8);
        }
        assert_eq!(state.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_timecode() {
        assert_eq!(format_timecode(0.0, 30), "00:00:00");
        assert_eq!(format_timecode(61.5, 30), "01:01:15");
    }

    #[test]
    fn test_panel_renders_headless() {
        let ctx = egui::Context::default();
        let mut state = TimelineState::new();
        let mut sequencer = sequencer();
        let _completion = sequencer.play(Default::default()).unwrap();
        sequencer.tick(0.5);

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                state.ui(ui, &mut sequencer);
            });
        });
        // Rendering alone never moves playback
        assert_eq!(sequencer.position(), 0.5);
        assert!(sequencer.is_playing());
    }
}
