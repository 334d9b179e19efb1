//! Paints the widget with an egui painter.

use std::collections::HashMap;

use eframe::egui::{
    self, pos2, vec2, Color32, CornerRadius, Painter, Pos2, Rect, Shape, Stroke, TextureHandle,
    TextureOptions, Vec2,
};

use crate::{
    assets::Icon,
    button::Particle,
    color::with_alpha,
    config::ShadowConfig,
    expand::BarCell,
    playback::PlayState,
    tween::rotate,
    widget::AudioWidget,
};

const ARC_SEGMENTS: usize = 64;
const SHADOW_LAYERS: usize = 3;
const FULL_UV: Rect = Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0));

/// Keeps GPU textures for icon images and the album cover between frames.
#[derive(Default)]
pub struct WidgetPainter {
    icons: HashMap<Icon, TextureHandle>,
    album: Option<(u64, TextureHandle)>,
}

impl WidgetPainter {
    pub fn paint(&mut self, ctx: &egui::Context, painter: &Painter, widget: &AudioWidget) {
        self.sync_textures(ctx, widget);

        if widget.trash().is_drawn() {
            paint_trash(painter, widget);
        }
        if widget.bar().is_visible() {
            self.paint_bar(painter, widget);
        }
        if widget.button().is_visible() {
            self.paint_button(painter, widget);
        }
    }

    fn sync_textures(&mut self, ctx: &egui::Context, widget: &AudioWidget) {
        if self.icons.is_empty() && !widget.icons().is_empty() {
            for icon in Icon::ALL {
                if let Some(image) = widget.icons().get(icon) {
                    let texture = ctx.load_texture(
                        format!("audio_widget.icon.{}", icon.key()),
                        image.clone(),
                        TextureOptions::LINEAR,
                    );
                    self.icons.insert(icon, texture);
                }
            }
        }

        let (cover, revision) = widget.album_cover();
        let stale = self
            .album
            .as_ref()
            .map_or(true, |(current, _)| *current != revision);
        if stale {
            self.album = cover.map(|image| {
                let texture = ctx.load_texture(
                    "audio_widget.album",
                    (**image).clone(),
                    TextureOptions::LINEAR,
                );
                (revision, texture)
            });
        }
    }

    fn paint_icon(&self, painter: &Painter, icon: Icon, rect: Rect, color: Color32) {
        if color.a() == 0 || rect.width() <= 0.0 {
            return;
        }
        if let Some(texture) = self.icons.get(&icon) {
            let tint = with_alpha(Color32::WHITE, color.a());
            painter.image(texture.id(), rect, FULL_UV, tint);
        } else {
            paint_glyph(painter, icon, rect, color);
        }
    }

    fn paint_button(&self, painter: &Painter, widget: &AudioWidget) {
        let config = widget.config();
        let button = widget.button();
        let center = button.center();
        let radius = button.radius() * button.scale();

        paint_shadow(painter, config.appearance.shadow, config.colors.shadow, |painter, offset, grow, color| {
            painter.circle_filled(center + offset, radius + grow, color);
        });
        painter.circle_filled(center, radius, button.color());
        paint_particles(painter, button.origin(), &button.particles());

        let sweep = button.progress_sweep();
        if sweep > 0.0 {
            let width = config.appearance.progress_stroke_width;
            let points = arc_points(center, radius - width / 2.0, -90.0, sweep * 360.0);
            painter.add(Shape::line(points, Stroke::new(width, config.colors.progress)));
        }

        let icon_rect = Rect::from_center_size(center, Vec2::splat(radius * 2.0))
            .shrink(config.appearance.button_padding * button.scale());
        let (play_alpha, pause_alpha) = button.icon_alphas();
        self.paint_icon(painter, Icon::Play, icon_rect, with_alpha(Color32::WHITE, play_alpha));
        self.paint_icon(painter, Icon::Pause, icon_rect, with_alpha(Color32::WHITE, pause_alpha));
    }

    fn paint_bar(&self, painter: &Painter, widget: &AudioWidget) {
        let config = widget.config();
        let bar = widget.bar();
        let origin = bar.origin().to_vec2();
        let frame = bar.current();
        let plate = frame.plate.translate(origin);
        let rounding = CornerRadius::same(
            (plate.height() / 2.0).clamp(0.0, u8::MAX as f32).round() as u8,
        );

        paint_shadow(painter, config.appearance.shadow, config.colors.shadow, |painter, offset, grow, color| {
            painter.rect_filled(plate.translate(offset).expand(grow), rounding, color);
        });
        painter.rect_filled(plate, rounding, frame.color);
        paint_particles(painter, bar.origin(), &bar.particles());

        let ink = config.colors.dark;
        if frame.elements > 0.0 {
            let alpha = (frame.elements * 255.0).round().clamp(0.0, 255.0) as u8;
            for cell in [BarCell::Playlist, BarCell::Previous, BarCell::Next, BarCell::Album] {
                let slot = bar.cell_rect(cell.index()).translate(origin);
                let rect = Rect::from_center_size(slot.center(), slot.size() * frame.elements);
                if cell == BarCell::Album {
                    if let Some((_, texture)) = self.album.as_ref() {
                        let tint = with_alpha(Color32::WHITE, alpha);
                        painter.image(texture.id(), rect, FULL_UV, tint);
                        continue;
                    }
                }
                self.paint_icon(painter, cell_icon(cell), rect, with_alpha(ink, alpha));
            }
        }

        let slot = bar.cell_rect(BarCell::PlayPause.index());
        let rect = Rect::from_center_size(frame.play_center + origin, slot.size());
        let icon = if widget.playback().state() == PlayState::Playing {
            Icon::Pause
        } else {
            Icon::Play
        };
        self.paint_icon(painter, icon, rect, ink);
    }
}

fn cell_icon(cell: BarCell) -> Icon {
    match cell {
        BarCell::Playlist => Icon::Playlist,
        BarCell::Previous => Icon::Previous,
        BarCell::PlayPause => Icon::Play,
        BarCell::Next => Icon::Next,
        BarCell::Album => Icon::Album,
    }
}

fn paint_trash(painter: &Painter, widget: &AudioWidget) {
    let config = widget.config();
    let trash = widget.trash();
    let rect = trash.rect(widget.screen());
    let center = rect.center();
    let radius = rect.width() / 2.0;

    painter.circle_filled(center, radius, with_alpha(config.colors.dark, 200));
    let stroke = Stroke::new(config.appearance.cross_stroke_width, trash.cross_color());
    let arm = radius / 2.0;
    for angle in [45.0, 135.0] {
        let a = rotate(center - vec2(arm, 0.0), center, angle);
        let b = rotate(center + vec2(arm, 0.0), center, angle);
        painter.line_segment([a, b], stroke);
    }
}

fn paint_particles(painter: &Painter, origin: Pos2, particles: &[Particle]) {
    for particle in particles {
        painter.circle_filled(origin + particle.center.to_vec2(), particle.radius, particle.color);
    }
}

/// Soft drop shadow built from a few translucent layers.
fn paint_shadow(
    painter: &Painter,
    shadow: ShadowConfig,
    color: Color32,
    draw: impl Fn(&Painter, Vec2, f32, Color32),
) {
    if color.a() == 0 {
        return;
    }
    let layer_alpha = (color.a() as usize / SHADOW_LAYERS).max(1) as u8;
    for layer in 0..SHADOW_LAYERS {
        let grow = shadow.radius * (layer + 1) as f32 / SHADOW_LAYERS as f32 / 2.0;
        draw(painter, shadow.offset, grow, with_alpha(color, layer_alpha));
    }
}

/// Points along a clockwise arc starting at `start` degrees (0 = +x, -90 = top).
fn arc_points(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<Pos2> {
    let segments = ((ARC_SEGMENTS as f32 * sweep.abs() / 360.0).ceil() as usize).max(2);
    (0..=segments)
        .map(|i| {
            let angle = (start + sweep * i as f32 / segments as f32).to_radians();
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn paint_glyph(painter: &Painter, icon: Icon, rect: Rect, color: Color32) {
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let w = rect.width();
    let h = rect.height();
    let cy = rect.center().y;
    let stroke = Stroke::new((w.min(h) * 0.12).max(1.0), color);
    match icon {
        Icon::Play => {
            let points = vec![pos2(l + w * 0.2, t), pos2(r - w * 0.05, cy), pos2(l + w * 0.2, b)];
            painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
        }
        Icon::Pause => {
            let bar = w * 0.28;
            let left = Rect::from_min_max(pos2(l + w * 0.12, t), pos2(l + w * 0.12 + bar, b));
            let right = Rect::from_min_max(pos2(r - w * 0.12 - bar, t), pos2(r - w * 0.12, b));
            painter.rect_filled(left, CornerRadius::same(1), color);
            painter.rect_filled(right, CornerRadius::same(1), color);
        }
        Icon::Previous | Icon::Next => {
            let tip = |x: f32| pos2(x, cy);
            let (edge, apex, bar_x) = if icon == Icon::Next {
                (l + w * 0.15, r - w * 0.25, r - w * 0.15)
            } else {
                (r - w * 0.15, l + w * 0.25, l + w * 0.15)
            };
            let points = vec![pos2(edge, t + h * 0.1), tip(apex), pos2(edge, b - h * 0.1)];
            painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
            painter.line_segment([pos2(bar_x, t + h * 0.1), pos2(bar_x, b - h * 0.1)], stroke);
        }
        Icon::Playlist => {
            for row in 0..3 {
                let y = t + h * (0.2 + 0.3 * row as f32);
                painter.line_segment([pos2(l, y), pos2(r, y)], stroke);
            }
        }
        Icon::Album => {
            let center = rect.center();
            let radius = w.min(h) / 2.0;
            painter.circle_stroke(center, radius - stroke.width / 2.0, stroke);
            painter.circle_filled(center, radius * 0.2, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_starts_at_top_and_sweeps_clockwise() {
        let center = pos2(0.0, 0.0);
        let points = arc_points(center, 10.0, -90.0, 90.0);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!((first - pos2(0.0, -10.0)).length() < 1e-3);
        assert!((last - pos2(10.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn full_sweep_uses_all_segments() {
        let points = arc_points(Pos2::ZERO, 5.0, -90.0, 360.0);
        assert_eq!(points.len(), ARC_SEGMENTS + 1);
    }
}
