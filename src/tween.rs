//! Time-window and interpolation helpers shared by every animated shape.

use std::time::Duration;

use eframe::egui::{pos2, Pos2};

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Position of `value` inside `[min, max]`, clamped to `[0, 1]`.
pub fn normalize(value: f32, min: f32, max: f32) -> f32 {
    if max - min <= f32::EPSILON {
        return if value >= max { 1.0 } else { 0.0 };
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Exponential smoothing: `factor` is the weight of the new sample.
pub fn smooth(previous: f32, sample: f32, factor: f32) -> f32 {
    factor * sample + (1.0 - factor) * previous
}

/// Rotates `point` around `center` by `degrees` (clockwise in screen space).
pub fn rotate(point: Pos2, center: Pos2, degrees: f32) -> Pos2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    pos2(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Phase window on an animation timeline, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f32,
    pub end: f32,
}

impl Window {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Window expressed in frame-speed units.
    pub fn frames(start: f32, end: f32, frame_speed: f32) -> Self {
        Self::new(start * frame_speed, end * frame_speed)
    }

    pub fn contains(&self, elapsed: f32) -> bool {
        elapsed >= self.start && elapsed <= self.end
    }

    pub fn progress(&self, elapsed: f32) -> f32 {
        normalize(elapsed, self.start, self.end)
    }

    /// Progress when the window is active, `None` otherwise.
    pub fn sample(&self, elapsed: f32) -> Option<f32> {
        self.contains(elapsed).then(|| self.progress(elapsed))
    }

    pub fn len(&self) -> f32 {
        self.end - self.start
    }
}

/// Piecewise-linear curve through `(t, value)` breakpoints sorted by `t`.
#[derive(Debug, Clone, Copy)]
pub struct Keyframes(pub &'static [(f32, f32)]);

impl Keyframes {
    pub fn sample(&self, t: f32) -> f32 {
        let points = self.0;
        let Some(&(first_t, first_value)) = points.first() else {
            return 0.0;
        };
        if t <= first_t {
            return first_value;
        }
        for pair in points.windows(2) {
            let (a_t, a_value) = pair[0];
            let (b_t, b_value) = pair[1];
            if t >= a_t && t <= b_t {
                return lerp(a_value, b_value, normalize(t, a_t, b_t));
            }
        }
        points.last().map(|&(_, value)| value).unwrap_or(first_value)
    }
}

/// Particle opacity over a click burst.
pub const BURST_ALPHA: Keyframes =
    Keyframes(&[(0.0, 0.0), (0.3, 0.0), (0.5, 255.0), (0.7, 225.0), (1.0, 0.0)]);

/// Particle opacity over the expand burst.
pub const EXPAND_BURST_ALPHA: Keyframes =
    Keyframes(&[(0.0, 0.0), (0.33, 255.0), (0.66, 255.0), (1.0, 0.0)]);

/// Linear value animation between two numbers over a fixed duration.
#[derive(Debug, Clone, Default)]
pub struct Tween {
    from: f32,
    to: f32,
    started_at: Duration,
    duration: Duration,
    running: bool,
}

impl Tween {
    pub fn start(&mut self, now: Duration, from: f32, to: f32, duration: Duration) {
        self.from = from;
        self.to = to;
        self.started_at = now;
        self.duration = duration;
        self.running = true;
    }

    pub fn fraction(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Current value; stops the tween once its duration has elapsed.
    pub fn advance(&mut self, now: Duration) -> Option<f32> {
        if !self.running {
            return None;
        }
        let fraction = self.fraction(now);
        if fraction >= 1.0 {
            self.running = false;
            return Some(self.to);
        }
        Some(lerp(self.from, self.to, fraction))
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn target(&self) -> f32 {
        self.to
    }
}
