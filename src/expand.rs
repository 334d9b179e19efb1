//! Expanded control bar with its expand and collapse timelines.

use std::time::Duration;

use eframe::egui::{pos2, vec2, Color32, Pos2, Rect, Vec2};
use rand::Rng;

use crate::{
    button::Particle,
    clock::TimeInterval,
    color::{with_alpha, ColorChanger},
    config::Config,
    gesture::{clamp_content, BoundsChecker, TouchTarget},
    physics::StickyBounds,
    playback::{Initiator, PlaybackState},
    tween::{lerp, Window, EXPAND_BURST_ALPHA},
};

const CELL_COUNT: usize = 5;
const BUBBLE_COUNT: usize = 30;
const BUBBLE_COLUMNS: usize = 15;

const EXPAND_FRAMES: f32 = 34.0;
const COLLAPSE_FRAMES: f32 = 12.0;

/// Side the bar grows towards from the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarState {
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarCell {
    Playlist,
    Previous,
    PlayPause,
    Next,
    Album,
}

impl BarCell {
    pub const ALL: [BarCell; CELL_COUNT] = [
        BarCell::Playlist,
        BarCell::Previous,
        BarCell::PlayPause,
        BarCell::Next,
        BarCell::Album,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Animation completion reported by [`ExpandCollapseWidget::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarEvent {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, Copy)]
struct BarBubble {
    x: f32,
    speed: f32,
    radius: f32,
}

/// Everything needed to draw the bar at one instant, in view-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarFrame {
    pub color: Color32,
    pub plate: Rect,
    pub play_center: Pos2,
    /// Opacity and scale of the secondary icons, `0..=1`.
    pub elements: f32,
    /// Progress of the bubble burst while it runs.
    pub bubbles: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
struct ExpandTimeline {
    color: Window,
    size: Window,
    slide: Window,
    elements: Window,
    bubbles: Window,
}

#[derive(Debug, Clone, Copy)]
struct CollapseTimeline {
    elements: Window,
    slide: Window,
    size: Window,
}

pub struct ExpandCollapseWidget {
    radius: f32,
    width: f32,
    padding: f32,
    origin: Pos2,
    state: BarState,
    direction: ExpandDirection,
    interval: TimeInterval,
    colors: ColorChanger,
    expanded_color: Color32,
    bubble_color: Color32,
    bubble_sizes: (f32, f32),
    bubbles: Vec<BarBubble>,
    expand_duration: Duration,
    collapse_duration: Duration,
    expand: ExpandTimeline,
    collapse: CollapseTimeline,
    frame: BarFrame,
}

impl std::fmt::Debug for ExpandCollapseWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpandCollapseWidget")
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("direction", &self.direction)
            .finish()
    }
}

impl ExpandCollapseWidget {
    pub fn new(config: &Config) -> Self {
        let appearance = &config.appearance;
        let speed = config.animation.frame_speed;
        let radius = appearance.radius;
        let width = appearance.widget_width;
        let padding = appearance.button_padding;

        let mut widget = Self {
            radius,
            width,
            padding,
            origin: Pos2::ZERO,
            state: BarState::Collapsed,
            direction: ExpandDirection::Right,
            interval: TimeInterval::default(),
            colors: ColorChanger::default(),
            expanded_color: config.colors.expanded,
            bubble_color: config.colors.light,
            bubble_sizes: (
                appearance.bubbles_min_size,
                appearance.expanded_bubbles_max_size,
            ),
            bubbles: Vec::new(),
            expand_duration: config.animation.frames(EXPAND_FRAMES),
            collapse_duration: config.animation.frames(COLLAPSE_FRAMES),
            expand: ExpandTimeline {
                color: Window::frames(0.0, 9.0, speed),
                size: Window::frames(0.0, 12.0, speed),
                slide: Window::frames(10.0, 18.0, speed),
                elements: Window::frames(20.0, 27.0, speed),
                bubbles: Window::frames(18.0, 32.0, speed),
            },
            collapse: CollapseTimeline {
                elements: Window::frames(0.0, 3.0, speed),
                slide: Window::frames(3.0, 12.0, speed),
                size: Window::frames(2.0, 12.0, speed),
            },
            frame: BarFrame {
                color: config.colors.expanded,
                plate: Rect::NOTHING,
                play_center: Pos2::ZERO,
                elements: 0.0,
                bubbles: None,
            },
        };
        widget.frame = widget.expanded_frame();
        widget
    }

    pub fn state(&self) -> BarState {
        self.state
    }

    pub fn direction(&self) -> ExpandDirection {
        self.direction
    }

    pub fn is_expanded(&self) -> bool {
        self.state == BarState::Expanded
    }

    /// Drawn whenever it is not fully collapsed.
    pub fn is_visible(&self) -> bool {
        self.state != BarState::Collapsed
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.radius * 4.0)
    }

    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn current(&self) -> BarFrame {
        self.frame
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let step = self.width / CELL_COUNT as f32;
        let r = self.radius;
        Rect::from_min_max(
            pos2(index as f32 * step + self.padding, r + self.padding),
            pos2((index + 1) as f32 * step - self.padding, 3.0 * r - self.padding),
        )
    }

    fn outer_cell(&self) -> BarCell {
        match self.direction {
            ExpandDirection::Left => BarCell::Album,
            ExpandDirection::Right => BarCell::Playlist,
        }
    }

    /// Drops back to collapsed without animating.
    pub fn reset(&mut self) {
        self.state = BarState::Collapsed;
        self.interval.reset();
        self.frame = self.expanded_frame();
    }

    /// Starts expanding with a fresh set of burst bubbles. Returns `false`
    /// when already expanded or animating.
    pub fn expand<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        direction: ExpandDirection,
        button_color: Color32,
        rng: &mut R,
    ) -> bool {
        if self.state != BarState::Collapsed {
            tracing::trace!(state = ?self.state, "expand ignored");
            return false;
        }
        self.bubbles = self.seed_bubbles(rng);
        self.direction = direction;
        self.state = BarState::Expanding;
        self.colors = ColorChanger::new(button_color, self.expanded_color);
        self.bubble_color = button_color;
        self.interval.reset();
        self.interval.step(now);
        self.frame = self.expand_frame(0.0);
        tracing::debug!(?direction, "expanding");
        true
    }

    /// Starts collapsing. Returns `false` unless fully expanded.
    pub fn collapse(&mut self, now: Duration, button_color: Color32) -> bool {
        if self.state != BarState::Expanded {
            tracing::trace!(state = ?self.state, "collapse ignored");
            return false;
        }
        self.state = BarState::Collapsing;
        self.colors = ColorChanger::new(self.expanded_color, button_color);
        self.interval.reset();
        self.interval.step(now);
        self.frame = self.collapse_frame(0.0);
        tracing::debug!(direction = ?self.direction, "collapsing");
        true
    }

    fn seed_bubbles<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<BarBubble> {
        let (min_size, max_size) = self.bubble_sizes;
        let step = self.width / BUBBLE_COLUMNS as f32;
        (0..BUBBLE_COUNT)
            .map(|i| {
                let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
                BarBubble {
                    x: self.padding
                        + (i % BUBBLE_COLUMNS) as f32 * step
                        + step * rng.gen::<f32>() * sign,
                    speed: 0.3 + 0.7 * rng.gen::<f32>(),
                    radius: lerp(min_size, max_size, rng.gen::<f32>()) / 2.0,
                }
            })
            .collect()
    }

    pub fn tick(&mut self, now: Duration) -> Option<BarEvent> {
        let total = match self.state {
            BarState::Expanding => self.expand_duration,
            BarState::Collapsing => self.collapse_duration,
            BarState::Collapsed | BarState::Expanded => return None,
        };
        self.interval.step(now);
        let elapsed = self.interval.millis();
        let finished = self.interval.duration() >= total;

        match self.state {
            BarState::Expanding if finished => {
                self.state = BarState::Expanded;
                self.frame = self.expanded_frame();
                Some(BarEvent::Expanded)
            }
            BarState::Collapsing if finished => {
                self.state = BarState::Collapsed;
                self.frame = self.collapse_frame(self.collapse.size.end);
                Some(BarEvent::Collapsed)
            }
            BarState::Expanding => {
                self.frame = self.expand_frame(elapsed);
                None
            }
            _ => {
                self.frame = self.collapse_frame(elapsed);
                None
            }
        }
    }

    /// Plate of the given width, anchored to the edge the button sits on.
    fn plate(&self, width: f32) -> Rect {
        let r = self.radius;
        match self.direction {
            ExpandDirection::Left => {
                Rect::from_min_max(pos2(self.width - width, r), pos2(self.width, 3.0 * r))
            }
            ExpandDirection::Right => Rect::from_min_max(pos2(0.0, r), pos2(width, 3.0 * r)),
        }
    }

    fn slide_center(&self, t: f32) -> Pos2 {
        let from = self.cell_rect(self.outer_cell().index()).center();
        let to = self.cell_rect(BarCell::PlayPause.index()).center();
        pos2(lerp(from.x, to.x, t), lerp(from.y, to.y, t))
    }

    fn expanded_frame(&self) -> BarFrame {
        BarFrame {
            color: self.expanded_color,
            plate: self.plate(self.width),
            play_center: self.slide_center(1.0),
            elements: 1.0,
            bubbles: None,
        }
    }

    fn expand_frame(&self, elapsed: f32) -> BarFrame {
        let timeline = self.expand;
        let size = timeline.size.progress(elapsed);
        BarFrame {
            color: self.colors.next_color(timeline.color.progress(elapsed)),
            plate: self.plate(lerp(2.0 * self.radius, self.width, size)),
            play_center: self.slide_center(timeline.slide.progress(elapsed)),
            elements: timeline.elements.progress(elapsed),
            bubbles: timeline.bubbles.sample(elapsed),
        }
    }

    fn collapse_frame(&self, elapsed: f32) -> BarFrame {
        let timeline = self.collapse;
        let size = timeline.size.progress(elapsed);
        BarFrame {
            color: self.colors.next_color(size),
            plate: self.plate(lerp(self.width, 2.0 * self.radius, size)),
            play_center: self.slide_center(1.0 - timeline.slide.progress(elapsed)),
            elements: 1.0 - timeline.elements.progress(elapsed),
            bubbles: None,
        }
    }

    /// Bubble burst particles in view-local coordinates.
    pub fn particles(&self) -> Vec<Particle> {
        let Some(t) = self.frame.bubbles else {
            return Vec::new();
        };
        let alpha = EXPAND_BURST_ALPHA.sample(t).round().clamp(0.0, 255.0) as u8;
        if alpha == 0 {
            return Vec::new();
        }
        let color = with_alpha(self.bubble_color, alpha);
        let cy = self.radius * 2.0;
        self.bubbles
            .iter()
            .enumerate()
            .map(|(i, bubble)| {
                let y = if i < BUBBLE_COLUMNS {
                    cy * (1.0 - bubble.speed * t)
                } else {
                    cy * (1.0 + bubble.speed * t)
                };
                Particle {
                    center: pos2(bubble.x, y),
                    radius: bubble.radius,
                    color,
                }
            })
            .collect()
    }

    /// Maps a view-local point to a control cell. Padding between cells hits nothing.
    pub fn hit_cell(&self, local: Pos2) -> Option<BarCell> {
        BarCell::ALL
            .into_iter()
            .find(|cell| self.cell_rect(cell.index()).contains(local))
    }

    /// Handles a click on the expanded bar. The play/pause cell toggles playback.
    pub fn on_click(&mut self, local: Pos2, playback: &mut PlaybackState) -> Option<BarCell> {
        if self.state != BarState::Expanded {
            return None;
        }
        let Some(cell) = self.hit_cell(local) else {
            tracing::warn!(x = local.x, y = local.y, "click outside of any bar cell");
            return None;
        };
        if cell == BarCell::PlayPause {
            playback.toggle(Initiator::ExpandedBar);
        }
        tracing::debug!(?cell, "bar cell clicked");
        Some(cell)
    }
}

impl BoundsChecker for ExpandCollapseWidget {
    fn check_bounds(&self, origin: Pos2, screen: Vec2) -> Pos2 {
        clamp_content(
            origin,
            vec2(0.0, self.radius),
            vec2(self.width, 2.0 * self.radius),
            screen,
        )
    }

    fn sticky_bounds(&self, screen: Vec2) -> StickyBounds {
        let r = self.radius;
        StickyBounds {
            left: 0.0,
            right: screen.x - self.width,
            top: -r,
            bottom: screen.y - 3.0 * r,
        }
    }
}

impl TouchTarget for ExpandCollapseWidget {
    fn frame(&self) -> Rect {
        Rect::from_min_size(self.origin, self.size())
    }

    fn set_origin(&mut self, origin: Pos2) {
        self.origin = origin;
    }

    fn is_animation_in_progress(&self) -> bool {
        matches!(self.state, BarState::Expanding | BarState::Collapsing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlayState;
    use rand::{rngs::StdRng, SeedableRng};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn bar() -> ExpandCollapseWidget {
        ExpandCollapseWidget::new(&Config::default())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn run(bar: &mut ExpandCollapseWidget, from: u64, to: u64) -> Vec<BarEvent> {
        let mut events = Vec::new();
        let mut now = from;
        while now < to {
            now = (now + 16).min(to);
            events.extend(bar.tick(ms(now)));
        }
        events
    }

    #[test]
    fn expand_twice_runs_one_animation() {
        let mut bar = bar();
        assert!(bar.expand(ms(0), ExpandDirection::Right, Color32::RED, &mut rng()));
        assert!(!bar.expand(ms(100), ExpandDirection::Left, Color32::RED, &mut rng()));
        assert_eq!(bar.direction(), ExpandDirection::Right);
        assert!(bar.is_animation_in_progress());

        let events = run(&mut bar, 0, 2_380);
        assert_eq!(events, vec![BarEvent::Expanded]);
        assert!(bar.is_expanded());
        assert!(!bar.expand(ms(2_400), ExpandDirection::Right, Color32::RED, &mut rng()));
    }

    #[test]
    fn collapse_while_collapsed_is_silent() {
        let mut bar = bar();
        assert!(!bar.collapse(ms(0), Color32::RED));
        assert_eq!(bar.tick(ms(1_000)), None);
        assert_eq!(bar.state(), BarState::Collapsed);
    }

    #[test]
    fn plate_grows_away_from_the_fixed_edge() {
        let mut left = bar();
        left.expand(ms(0), ExpandDirection::Left, Color32::RED, &mut rng());
        left.tick(ms(420));
        let plate = left.current().plate;
        assert_eq!(plate.max.x, 380.0);
        assert!((plate.width() - (72.0 + (380.0 - 72.0) * 0.5)).abs() < 0.5);

        let mut right = bar();
        right.expand(ms(0), ExpandDirection::Right, Color32::RED, &mut rng());
        right.tick(ms(420));
        assert_eq!(right.current().plate.min.x, 0.0);
    }

    #[test]
    fn expand_phases_follow_the_timeline() {
        let mut bar = bar();
        bar.expand(ms(0), ExpandDirection::Right, Color32::RED, &mut rng());
        let start = bar.cell_rect(BarCell::Playlist.index()).center();
        let slot = bar.cell_rect(BarCell::PlayPause.index()).center();

        bar.tick(ms(600));
        assert_eq!(bar.current().play_center, start);
        assert_eq!(bar.current().elements, 0.0);
        assert!(bar.particles().is_empty());

        bar.tick(ms(1_500));
        assert_eq!(bar.current().play_center, slot);
        assert!(bar.current().elements > 0.0 && bar.current().elements < 1.0);
        assert_eq!(bar.particles().len(), BUBBLE_COUNT);

        run(&mut bar, 1_500, 2_380);
        assert_eq!(bar.current().elements, 1.0);
        assert!(bar.particles().is_empty());
    }

    #[test]
    fn burst_halves_move_apart() {
        let mut bar = bar();
        bar.expand(ms(0), ExpandDirection::Left, Color32::RED, &mut rng());
        bar.tick(ms(1_750));
        let particles = bar.particles();
        let cy = 72.0;
        assert!(particles[..BUBBLE_COLUMNS].iter().all(|p| p.center.y < cy));
        assert!(particles[BUBBLE_COLUMNS..].iter().all(|p| p.center.y > cy));
    }

    #[test]
    fn every_expand_seeds_new_bubbles() {
        let mut bar = bar();
        let mut rng = StdRng::seed_from_u64(21);
        let sample = |bar: &ExpandCollapseWidget| -> Vec<(f32, f32)> {
            bar.particles()
                .iter()
                .map(|p| (p.center.x, p.radius))
                .collect()
        };

        bar.expand(ms(0), ExpandDirection::Right, Color32::RED, &mut rng);
        bar.tick(ms(1_500));
        let first = sample(&bar);
        run(&mut bar, 1_500, 2_380);
        bar.collapse(ms(2_400), Color32::RED);
        run(&mut bar, 2_400, 3_300);
        assert_eq!(bar.state(), BarState::Collapsed);

        bar.expand(ms(4_000), ExpandDirection::Right, Color32::RED, &mut rng);
        bar.tick(ms(5_500));
        let second = sample(&bar);
        assert_eq!(first.len(), BUBBLE_COUNT);
        assert_eq!(second.len(), BUBBLE_COUNT);
        assert_ne!(first, second);
    }

    #[test]
    fn collapse_reverses_and_reports_completion() {
        let mut bar = bar();
        bar.expand(ms(0), ExpandDirection::Left, Color32::RED, &mut rng());
        run(&mut bar, 0, 2_380);
        assert!(bar.collapse(ms(3_000), Color32::RED));
        assert!(!bar.collapse(ms(3_010), Color32::RED));

        bar.tick(ms(3_250));
        assert_eq!(bar.current().elements, 0.0);
        let events = run(&mut bar, 3_250, 3_840);
        assert_eq!(events, vec![BarEvent::Collapsed]);
        assert!(!bar.is_visible());
        assert_eq!(bar.current().plate.width(), 72.0);
        assert_eq!(
            bar.current().play_center,
            bar.cell_rect(BarCell::Album.index()).center()
        );
    }

    #[test]
    fn clicks_map_to_cells() {
        let mut bar = bar();
        let mut playback = PlaybackState::new();
        assert_eq!(bar.on_click(pos2(190.0, 72.0), &mut playback), None);

        bar.expand(ms(0), ExpandDirection::Right, Color32::RED, &mut rng());
        run(&mut bar, 0, 2_380);
        assert_eq!(bar.on_click(pos2(38.0, 72.0), &mut playback), Some(BarCell::Playlist));
        assert_eq!(bar.on_click(pos2(342.0, 72.0), &mut playback), Some(BarCell::Album));
        assert_eq!(bar.on_click(pos2(190.0, 5.0), &mut playback), None);
        // Padding between the playlist and previous cells.
        assert_eq!(bar.on_click(pos2(76.0, 72.0), &mut playback), None);
        assert_eq!(bar.on_click(pos2(10.0, 72.0), &mut playback), None);
        assert_eq!(bar.on_click(pos2(190.0, 72.0), &mut playback), Some(BarCell::PlayPause));
        assert_eq!(playback.state(), PlayState::Playing);
    }
}
