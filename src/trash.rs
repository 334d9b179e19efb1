//! Drop target that removes the widget when the button is released over it.

use std::time::Duration;

use eframe::egui::{pos2, Color32, Pos2, Rect, Vec2};

use crate::{config::Config, tween::Tween};

const SLIDE_DURATION: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub struct RemoveWidgetView {
    radius: f32,
    y: f32,
    slide: Tween,
    visible: bool,
    overlapped: bool,
    default_color: Color32,
    overlapped_color: Color32,
}

impl RemoveWidgetView {
    pub fn new(config: &Config) -> Self {
        Self {
            radius: config.appearance.radius,
            y: f32::MAX,
            slide: Tween::default(),
            visible: false,
            overlapped: false,
            default_color: config.colors.cross_default,
            overlapped_color: config.colors.cross_overlapped,
        }
    }

    fn x(&self, screen: Vec2) -> f32 {
        screen.x / 2.0 - self.radius
    }

    fn hidden_y(&self, screen: Vec2) -> f32 {
        screen.y + self.radius
    }

    fn visible_y(&self, screen: Vec2) -> f32 {
        screen.y - 2.0 * self.radius
    }

    /// Slides up from below the screen edge.
    pub fn show(&mut self, now: Duration, screen: Vec2) {
        if self.visible {
            return;
        }
        self.visible = true;
        let from = self.hidden_y(screen);
        self.y = from;
        self.slide.start(now, from, self.visible_y(screen), SLIDE_DURATION);
    }

    /// Slides back down. The view stays drawn until it is out of sight.
    pub fn hide(&mut self, now: Duration, screen: Vec2) {
        if !self.visible {
            return;
        }
        self.visible = false;
        self.overlapped = false;
        self.slide
            .start(now, self.y, self.hidden_y(screen), SLIDE_DURATION);
    }

    pub fn tick(&mut self, now: Duration) {
        if let Some(y) = self.slide.advance(now) {
            self.y = y;
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.visible || self.slide.is_running()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn rect(&self, screen: Vec2) -> Rect {
        Rect::from_min_size(pos2(self.x(screen), self.y), Vec2::splat(2.0 * self.radius))
    }

    /// Updates the highlight for a button centered at `point`. Returns `true`
    /// when the overlap state changed.
    pub fn track(&mut self, point: Pos2, screen: Vec2) -> bool {
        let overlapped = self.visible && self.rect(screen).contains(point);
        let changed = overlapped != self.overlapped;
        self.overlapped = overlapped;
        changed
    }

    pub fn is_overlapped(&self) -> bool {
        self.overlapped
    }

    pub fn cross_color(&self) -> Color32 {
        if self.overlapped {
            self.overlapped_color
        } else {
            self.default_color
        }
    }
}
