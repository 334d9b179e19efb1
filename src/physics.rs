//! Post-release motion: fling translation followed by sticky-edge settling.

use std::time::Duration;

use eframe::egui::{vec2, Pos2, Rect, Vec2};

use crate::tween::{lerp, smooth};

const VELOCITY_SMOOTHING: f32 = 0.2;

/// Smoothed pointer velocity in pixels per second.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    last: Option<(Pos2, Duration)>,
    velocity: Vec2,
}

impl VelocityTracker {
    pub fn sample(&mut self, position: Pos2, at: Duration) {
        if let Some((last_position, last_at)) = self.last {
            let dt = at.saturating_sub(last_at).as_secs_f32();
            let instant = if dt > 0.0 {
                (position - last_position) / dt
            } else {
                Vec2::ZERO
            };
            self.velocity = vec2(
                smooth(self.velocity.x, instant.x, VELOCITY_SMOOTHING),
                smooth(self.velocity.y, instant.y, VELOCITY_SMOOTHING),
            );
        }
        self.last = Some((position, at));
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.velocity = Vec2::ZERO;
    }
}

/// Translates a view for a fixed duration with velocity falling linearly to zero.
#[derive(Debug, Clone, Default)]
pub struct VelocityAnimator {
    initial: Vec2,
    started_at: Duration,
    previous: Duration,
    duration: Duration,
    running: bool,
}

impl VelocityAnimator {
    pub fn start(&mut self, now: Duration, velocity: Vec2, duration: Duration) {
        if self.running {
            return;
        }
        self.initial = velocity;
        self.started_at = now;
        self.previous = now;
        self.duration = duration;
        self.running = true;
    }

    /// Displacement since the previous frame, and whether the fling just ended.
    pub fn advance(&mut self, now: Duration) -> Option<(Vec2, bool)> {
        if !self.running {
            return None;
        }
        let elapsed = now.saturating_sub(self.started_at);
        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        let end = self.started_at + self.duration;
        let dt = now.min(end).saturating_sub(self.previous).as_secs_f32();
        self.previous = now.min(end);

        let velocity = self.initial * (1.0 - fraction);
        let finished = fraction >= 1.0;
        if finished {
            self.running = false;
        }
        Some((velocity * dt, finished))
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_animating(&self) -> bool {
        self.running
    }
}

/// Origin limits a view may rest at, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickyBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Resting origin for a view: nearest horizontal edge, vertical position clamped.
/// A view centered exactly on the middle of the screen goes right.
pub fn sticky_target(frame: Rect, bounds: StickyBounds, screen: Vec2, edge_offset: Vec2) -> Pos2 {
    let x = if frame.center().x < screen.x / 2.0 {
        bounds.left + edge_offset.x
    } else {
        bounds.right - edge_offset.x
    };

    let top = bounds.top + edge_offset.y;
    let bottom = bounds.bottom - edge_offset.y;
    let y = if top > bottom {
        tracing::warn!(top, bottom, "screen too short for sticky bounds; pinning to top");
        top
    } else {
        frame.min.y.clamp(top, bottom)
    };
    Pos2::new(x, y)
}

#[derive(Debug, Clone, Default)]
pub struct StickyEdgeAnimator {
    from: Pos2,
    to: Pos2,
    started_at: Duration,
    duration: Duration,
    running: bool,
}

impl StickyEdgeAnimator {
    pub fn start(&mut self, now: Duration, from: Pos2, to: Pos2, duration: Duration) {
        self.from = from;
        self.to = to;
        self.started_at = now;
        self.duration = duration;
        self.running = true;
    }

    /// Origin for this frame. The last frame lands exactly on the target.
    pub fn advance(&mut self, now: Duration) -> Option<Pos2> {
        if !self.running {
            return None;
        }
        let elapsed = now.saturating_sub(self.started_at);
        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        if fraction >= 1.0 {
            self.running = false;
            return Some(self.to);
        }
        Some(Pos2::new(
            lerp(self.from.x, self.to.x, fraction),
            lerp(self.from.y, self.to.y, fraction),
        ))
    }

    pub fn target(&self) -> Pos2 {
        self.to
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_animating(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    const BOUNDS: StickyBounds = StickyBounds {
        left: -10.0,
        right: 960.0,
        top: 0.0,
        bottom: 1_500.0,
    };

    fn frame_centered_at(cx: f32, y: f32) -> Rect {
        Rect::from_center_size(pos2(cx, y + 20.0), vec2(40.0, 40.0))
    }

    #[test]
    fn sticky_picks_nearest_edge() {
        let screen = vec2(1_000.0, 1_600.0);
        let left = sticky_target(frame_centered_at(100.0, 300.0), BOUNDS, screen, Vec2::ZERO);
        assert_eq!(left, pos2(-10.0, 300.0));
        let right = sticky_target(frame_centered_at(900.0, 300.0), BOUNDS, screen, Vec2::ZERO);
        assert_eq!(right.x, 960.0);
        let middle = sticky_target(frame_centered_at(500.0, 300.0), BOUNDS, screen, Vec2::ZERO);
        assert_eq!(middle.x, 960.0);
    }

    #[test]
    fn sticky_clamps_vertical_position() {
        let screen = vec2(1_000.0, 1_600.0);
        let target = sticky_target(frame_centered_at(100.0, 1_580.0), BOUNDS, screen, vec2(0.0, 20.0));
        assert_eq!(target.y, 1_480.0);
        let target = sticky_target(frame_centered_at(100.0, -50.0), BOUNDS, screen, Vec2::ZERO);
        assert_eq!(target.y, 0.0);
    }

    #[test]
    fn fling_decays_linearly_over_duration() {
        let mut fling = VelocityAnimator::default();
        fling.start(ms(0), vec2(1_000.0, 0.0), ms(500));
        let mut travelled = 0.0;
        let mut now = 0;
        loop {
            now += 10;
            let (delta, finished) = fling.advance(ms(now)).unwrap();
            travelled += delta.x;
            if finished {
                break;
            }
        }
        assert_eq!(now, 500);
        assert!(!fling.is_animating());
        // Area under a linear ramp from 1000 px/s to 0 over 0.5 s is 250 px;
        // sampling at the end of each step undershoots slightly.
        assert!(travelled > 230.0 && travelled < 250.0, "{travelled}");
    }

    #[test]
    fn fling_ignores_restart_while_running() {
        let mut fling = VelocityAnimator::default();
        fling.start(ms(0), vec2(500.0, 0.0), ms(500));
        fling.start(ms(100), vec2(-500.0, 0.0), ms(500));
        let (delta, _) = fling.advance(ms(100)).unwrap();
        assert!(delta.x > 0.0);
    }

    #[test]
    fn sticky_animation_lands_on_target() {
        let mut sticky = StickyEdgeAnimator::default();
        sticky.start(ms(0), pos2(100.0, 100.0), pos2(0.0, 100.0), ms(200));
        let halfway = sticky.advance(ms(100)).unwrap();
        assert!((halfway.x - 50.0).abs() < 1e-3);
        assert_eq!(sticky.advance(ms(250)), Some(pos2(0.0, 100.0)));
        assert!(!sticky.is_animating());
    }

    #[test]
    fn tracker_smooths_samples() {
        let mut tracker = VelocityTracker::default();
        tracker.sample(pos2(0.0, 0.0), ms(0));
        assert_eq!(tracker.velocity(), Vec2::ZERO);
        tracker.sample(pos2(10.0, 0.0), ms(10));
        assert!((tracker.velocity().x - 200.0).abs() < 1e-2);
        tracker.reset();
        assert_eq!(tracker.velocity(), Vec2::ZERO);
    }
}
