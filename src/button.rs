//! The floating play/pause button: circle, icon crossfade, bubble burst,
//! press feedback and progress ring.

use std::{cell::RefCell, rc::Rc, time::Duration};

use eframe::egui::{pos2, vec2, Color32, Pos2, Rect, Vec2};
use rand::Rng;

use crate::{
    clock::TimeInterval,
    color::ColorChanger,
    config::Config,
    gesture::{clamp_content, BoundsChecker, TouchTarget},
    physics::StickyBounds,
    playback::{Initiator, PlayState, PlaybackListener, PlaybackState},
    tween::{lerp, rotate, Tween, Window, BURST_ALPHA},
};

const BUBBLE_COUNT: usize = 20;
const BUBBLE_ANGLE_STEP: f32 = 360.0 / BUBBLE_COUNT as f32;
const BURST_FRAMES: f32 = 12.0;
const PROGRESS_FRAMES: f32 = 8.0;
const PRESSED_SCALE: f32 = 0.9;
const PRESS_DURATION: Duration = Duration::from_millis(100);

/// A single drawable particle in view-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub center: Pos2,
    pub radius: f32,
    pub color: Color32,
}

#[derive(Debug, Clone, Copy)]
struct Bubble {
    speed: f32,
    radius: f32,
}

#[derive(Debug)]
struct Burst {
    interval: TimeInterval,
    bubbles: Vec<Bubble>,
    start_angle: f32,
    colors: ColorChanger,
    bubble_color: Color32,
    to_playing: bool,
}

/// Static look of the button, kept in sync with playback by listening to it.
#[derive(Debug)]
pub struct ButtonFace {
    dark: Color32,
    light: Color32,
    playing: bool,
    color: Color32,
    play_alpha: f32,
    pause_alpha: f32,
    percentage: f32,
}

impl ButtonFace {
    fn new(dark: Color32, light: Color32) -> Self {
        let mut face = Self {
            dark,
            light,
            playing: false,
            color: dark,
            play_alpha: 255.0,
            pause_alpha: 0.0,
            percentage: 0.0,
        };
        face.commit();
        face
    }

    fn commit(&mut self) {
        if self.playing {
            self.color = self.light;
            self.play_alpha = 0.0;
            self.pause_alpha = 255.0;
        } else {
            self.color = self.dark;
            self.play_alpha = 255.0;
            self.pause_alpha = 0.0;
        }
    }
}

impl PlaybackListener for ButtonFace {
    fn on_state_changed(&mut self, _old: PlayState, new: PlayState, initiator: Initiator) {
        self.playing = new == PlayState::Playing;
        // Our own toggles are committed by the burst.
        if initiator != Initiator::PlayButton {
            self.commit();
        }
    }

    fn on_progress_changed(&mut self, _position: u32, _duration: u32, percentage: f32) {
        self.percentage = percentage;
    }
}

pub struct PlayPauseButton {
    face: Rc<RefCell<ButtonFace>>,
    origin: Pos2,
    radius: f32,
    bubble_sizes: (f32, f32),
    burst_duration: Duration,
    color_window: Window,
    progress_duration: Duration,
    burst: Option<Burst>,
    scale: f32,
    press: Tween,
    progress_enabled: bool,
    ring: Tween,
    ring_value: f32,
    visible: bool,
}

impl std::fmt::Debug for PlayPauseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayPauseButton")
            .field("origin", &self.origin)
            .field("visible", &self.visible)
            .field("bursting", &self.burst.is_some())
            .finish()
    }
}

impl PlayPauseButton {
    /// Creates the button and subscribes its face to `playback`.
    pub fn new(config: &Config, playback: &mut PlaybackState) -> Self {
        let appearance = &config.appearance;
        let face = Rc::new(RefCell::new(ButtonFace::new(
            config.colors.dark,
            config.colors.light,
        )));
        {
            let mut initial = face.borrow_mut();
            initial.playing = playback.state() == PlayState::Playing;
            initial.percentage = playback.percentage();
            initial.commit();
        }
        playback.add_listener(face.clone());

        let burst_duration = config.animation.frames(BURST_FRAMES);
        let burst_ms = burst_duration.as_secs_f32() * 1000.0;
        let window_len = burst_ms / 4.0;
        let window_start = (burst_ms - window_len) / 2.0;

        Self {
            face,
            origin: Pos2::ZERO,
            radius: appearance.radius,
            bubble_sizes: (appearance.bubbles_min_size, appearance.bubbles_max_size),
            burst_duration,
            color_window: Window::new(window_start, window_start + window_len),
            progress_duration: config.animation.frames(PROGRESS_FRAMES),
            burst: None,
            scale: 1.0,
            press: Tween::default(),
            progress_enabled: true,
            ring: Tween::default(),
            ring_value: 0.0,
            visible: false,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// View size; the circle sits in the middle with one radius of margin.
    pub fn size(&self) -> Vec2 {
        Vec2::splat(self.radius * 4.0)
    }

    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn center(&self) -> Pos2 {
        self.origin + Vec2::splat(self.radius * 2.0)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether a screen point hits the drawn circle.
    pub fn hit(&self, point: Pos2) -> bool {
        self.visible && (point - self.center()).length() <= self.radius
    }

    /// Toggles playback and starts the bubble burst. Ignored while a burst runs.
    pub fn on_click<R: Rng + ?Sized>(
        &mut self,
        playback: &mut PlaybackState,
        now: Duration,
        rng: &mut R,
    ) -> Option<PlayState> {
        if self.burst.is_some() {
            return None;
        }
        let state = playback.toggle(Initiator::PlayButton);
        let to_playing = state == PlayState::Playing;

        let face = self.face.borrow();
        let (from, to) = if to_playing {
            (face.dark, face.light)
        } else {
            (face.light, face.dark)
        };
        drop(face);

        let (min_size, max_size) = self.bubble_sizes;
        let bubbles = (0..BUBBLE_COUNT)
            .map(|_| Bubble {
                speed: 0.5 + 0.5 * rng.gen::<f32>(),
                radius: lerp(min_size, max_size, rng.gen::<f32>()) / 2.0,
            })
            .collect();

        let mut interval = TimeInterval::default();
        interval.step(now);
        self.burst = Some(Burst {
            interval,
            bubbles,
            start_angle: 360.0 * rng.gen::<f32>(),
            colors: ColorChanger::new(from, to),
            bubble_color: to,
            to_playing,
        });
        tracing::debug!(?state, "play/pause burst started");
        Some(state)
    }

    pub fn on_touch_down(&mut self, now: Duration) {
        self.press.start(now, self.scale, PRESSED_SCALE, PRESS_DURATION);
    }

    pub fn on_touch_up(&mut self, now: Duration) {
        self.press.start(now, self.scale, 1.0, PRESS_DURATION);
    }

    /// Animates the progress ring in or out.
    pub fn set_progress_enabled(&mut self, enabled: bool, now: Duration) {
        if self.progress_enabled == enabled {
            return;
        }
        let from = self.progress_sweep();
        self.progress_enabled = enabled;
        let to = if enabled {
            self.face.borrow().percentage
        } else {
            0.0
        };
        self.ring_value = from;
        self.ring.start(now, from, to, self.progress_duration);
    }

    pub fn progress_duration(&self) -> Duration {
        self.progress_duration
    }

    pub fn tick(&mut self, now: Duration) {
        if let Some(scale) = self.press.advance(now) {
            self.scale = scale;
        }
        if let Some(value) = self.ring.advance(now) {
            self.ring_value = value;
        }

        let Some(burst) = self.burst.as_mut() else {
            return;
        };
        burst.interval.step(now);
        let mut face = self.face.borrow_mut();
        if burst.interval.duration() >= self.burst_duration {
            // Playback may have changed under the burst; show where it is now.
            face.commit();
            drop(face);
            self.burst = None;
            tracing::trace!("play/pause burst finished");
            return;
        }

        let t = self.color_window.progress(burst.interval.millis());
        face.color = burst.colors.next_color(t);
        let (shown, hidden) = (255.0 * t, 255.0 * (1.0 - t));
        if burst.to_playing {
            face.pause_alpha = shown;
            face.play_alpha = hidden;
        } else {
            face.play_alpha = shown;
            face.pause_alpha = hidden;
        }
    }

    pub fn is_bursting(&self) -> bool {
        self.burst.is_some()
    }

    pub fn color(&self) -> Color32 {
        self.face.borrow().color
    }

    /// Opacity of the play and pause glyphs.
    pub fn icon_alphas(&self) -> (u8, u8) {
        let face = self.face.borrow();
        (
            face.play_alpha.round().clamp(0.0, 255.0) as u8,
            face.pause_alpha.round().clamp(0.0, 255.0) as u8,
        )
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Fraction of the ring to draw, `0..=1`.
    pub fn progress_sweep(&self) -> f32 {
        if self.ring.is_running() {
            self.ring_value
        } else if self.progress_enabled {
            self.face.borrow().percentage
        } else {
            0.0
        }
    }

    /// Burst particles in view-local coordinates.
    pub fn particles(&self) -> Vec<Particle> {
        let Some(burst) = self.burst.as_ref() else {
            return Vec::new();
        };
        let fraction = (burst.interval.duration().as_secs_f32()
            / self.burst_duration.as_secs_f32())
        .clamp(0.0, 1.0);
        let alpha = BURST_ALPHA.sample(fraction).round().clamp(0.0, 255.0) as u8;
        if alpha == 0 {
            return Vec::new();
        }
        let [r, g, b, _] = burst.bubble_color.to_srgba_unmultiplied();
        let color = Color32::from_rgba_unmultiplied(r, g, b, alpha);
        let center = pos2(self.radius * 2.0, self.radius * 2.0);
        burst
            .bubbles
            .iter()
            .enumerate()
            .map(|(i, bubble)| {
                let travel = center.y * bubble.speed * fraction;
                let point = pos2(center.x, center.y - travel);
                Particle {
                    center: rotate(
                        point,
                        center,
                        burst.start_angle + BUBBLE_ANGLE_STEP * i as f32,
                    ),
                    radius: bubble.radius,
                    color,
                }
            })
            .collect()
    }
}

impl BoundsChecker for PlayPauseButton {
    fn check_bounds(&self, origin: Pos2, screen: Vec2) -> Pos2 {
        let r = self.radius;
        clamp_content(origin, vec2(r, r), vec2(2.0 * r, 2.0 * r), screen)
    }

    fn sticky_bounds(&self, screen: Vec2) -> StickyBounds {
        let r = self.radius;
        StickyBounds {
            left: -r,
            right: screen.x - 3.0 * r,
            top: -r,
            bottom: screen.y - 3.0 * r,
        }
    }
}

impl TouchTarget for PlayPauseButton {
    fn frame(&self) -> Rect {
        Rect::from_min_size(self.origin, self.size())
    }

    fn set_origin(&mut self, origin: Pos2) {
        self.origin = origin;
    }

    fn is_animation_in_progress(&self) -> bool {
        self.burst.is_some()
    }
}
