//! Touch interpretation for a single draggable view.
//!
//! Raw pointer events come in with screen coordinates and timestamps. The
//! interpreter classifies them into clicks, long clicks, drags and outside
//! touches, moves the view while dragging, and runs the fling and sticky-edge
//! animations after release. Discrete results are returned to the caller
//! instead of being dispatched through callbacks, so the owner decides what a
//! click means.

use std::time::Duration;

use eframe::egui::{Pos2, Rect, Vec2};

use crate::{
    config::GestureConfig,
    physics::{sticky_target, StickyBounds, StickyEdgeAnimator, VelocityAnimator, VelocityTracker},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
    /// A touch that landed outside the view.
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    /// Screen coordinates.
    pub position: Pos2,
    pub at: Duration,
}

impl TouchEvent {
    pub fn new(action: TouchAction, position: Pos2, at: Duration) -> Self {
        Self {
            action,
            position,
            at,
        }
    }

    pub fn down(position: Pos2, at: Duration) -> Self {
        Self::new(TouchAction::Down, position, at)
    }

    pub fn moved(position: Pos2, at: Duration) -> Self {
        Self::new(TouchAction::Move, position, at)
    }

    pub fn up(position: Pos2, at: Duration) -> Self {
        Self::new(TouchAction::Up, position, at)
    }

    pub fn outside(position: Pos2, at: Duration) -> Self {
        Self::new(TouchAction::Outside, position, at)
    }
}

/// Classified gesture. Positions are local to the view at touch-down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Touched(Pos2),
    Click(Pos2),
    LongClick(Pos2),
    /// Applied displacement of the view origin.
    Moved(Vec2),
    Released(Pos2),
    TouchOutside,
}

/// Keeps a view's visible content on screen and defines where it may rest.
pub trait BoundsChecker {
    fn check_bounds(&self, origin: Pos2, screen: Vec2) -> Pos2;

    fn sticky_bounds(&self, screen: Vec2) -> StickyBounds;
}

/// A view the interpreter can move around.
pub trait TouchTarget: BoundsChecker {
    fn frame(&self) -> Rect;

    fn set_origin(&mut self, origin: Pos2);

    fn is_animation_in_progress(&self) -> bool {
        false
    }
}

/// Clamps `origin` so that the content rectangle, offset `inset` into the view,
/// stays inside the screen.
pub fn clamp_content(origin: Pos2, inset: Vec2, content: Vec2, screen: Vec2) -> Pos2 {
    let mut left = origin.x + inset.x;
    let mut top = origin.y + inset.y;
    if left + content.x > screen.x {
        left = screen.x - content.x;
    }
    if top + content.y > screen.y {
        top = screen.y - content.y;
    }
    if left < 0.0 || top < 0.0 {
        tracing::warn!(
            screen_width = screen.x,
            screen_height = screen.y,
            "can't place view in a valid position; screen is too small"
        );
    }
    Pos2::new(left.max(0.0) - inset.x, top.max(0.0) - inset.y)
}

#[derive(Debug, Clone)]
struct GestureSession {
    down_at: Duration,
    start: Pos2,
    start_origin: Pos2,
    local: Pos2,
    moved_far_enough: bool,
}

#[derive(Debug)]
pub struct GestureInterpreter {
    config: GestureConfig,
    session: Option<GestureSession>,
    tracker: VelocityTracker,
    fling: VelocityAnimator,
    sticky: StickyEdgeAnimator,
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: None,
            tracker: VelocityTracker::default(),
            fling: VelocityAnimator::default(),
            sticky: StickyEdgeAnimator::default(),
        }
    }

    pub fn is_settling(&self) -> bool {
        self.fling.is_animating() || self.sticky.is_animating()
    }

    pub fn is_touching(&self) -> bool {
        self.session.is_some()
    }

    pub fn handle<T: TouchTarget + ?Sized>(
        &mut self,
        event: TouchEvent,
        target: &mut T,
        screen: Vec2,
    ) -> Vec<Gesture> {
        if target.is_animation_in_progress() {
            return Vec::new();
        }
        match event.action {
            TouchAction::Down => self.on_down(event, target),
            TouchAction::Move => self.on_move(event, target, screen),
            TouchAction::Up => self.on_up(event, target, screen),
            TouchAction::Cancel => {
                let Some(session) = self.session.take() else {
                    return Vec::new();
                };
                self.tracker.reset();
                self.settle(event.at, target, screen);
                vec![Gesture::Released(session.local)]
            }
            TouchAction::Outside => vec![Gesture::TouchOutside],
        }
    }

    fn on_down<T: TouchTarget + ?Sized>(&mut self, event: TouchEvent, target: &T) -> Vec<Gesture> {
        if self.is_settling() {
            return Vec::new();
        }
        let frame = target.frame();
        let local = (event.position - frame.min).to_pos2();
        self.tracker.reset();
        self.tracker.sample(event.position, event.at);
        self.session = Some(GestureSession {
            down_at: event.at,
            start: event.position,
            start_origin: frame.min,
            local,
            moved_far_enough: false,
        });
        vec![Gesture::Touched(local)]
    }

    fn on_move<T: TouchTarget + ?Sized>(
        &mut self,
        event: TouchEvent,
        target: &mut T,
        screen: Vec2,
    ) -> Vec<Gesture> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        self.tracker.sample(event.position, event.at);

        let diff = event.position - session.start;
        if diff.length() >= self.config.movement_threshold {
            session.moved_far_enough = true;
        }

        let previous = target.frame().min;
        let origin = target.check_bounds(session.start_origin + diff, screen);
        target.set_origin(origin);
        vec![Gesture::Moved(origin - previous)]
    }

    fn on_up<T: TouchTarget + ?Sized>(
        &mut self,
        event: TouchEvent,
        target: &mut T,
        screen: Vec2,
    ) -> Vec<Gesture> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        let elapsed = event.at.saturating_sub(session.down_at);

        let mut gestures = Vec::new();
        if elapsed <= self.config.click_threshold && !session.moved_far_enough {
            gestures.push(Gesture::Click(session.local));
        }
        gestures.push(Gesture::Released(session.local));

        let velocity = self.tracker.velocity();
        self.tracker.reset();
        if session.moved_far_enough && velocity.length() > self.config.fling_velocity_threshold
        {
            tracing::trace!(?velocity, "fling");
            self.sticky.cancel();
            self.fling.start(event.at, velocity, self.config.fling_duration);
        } else {
            self.settle(event.at, target, screen);
        }
        gestures
    }

    /// Advances the long-click deadline and post-release motion.
    pub fn tick<T: TouchTarget + ?Sized>(
        &mut self,
        now: Duration,
        target: &mut T,
        screen: Vec2,
    ) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        let long_click = self.session.as_ref().filter(|session| {
            !session.moved_far_enough && now >= session.down_at + self.config.long_click_threshold
        });
        if let Some(local) = long_click.map(|session| session.local) {
            // A long click ends the session: the view stops following the
            // pointer and the later touch-up has nothing left to release.
            self.session = None;
            self.tracker.reset();
            gestures.push(Gesture::LongClick(local));
            gestures.push(Gesture::Released(local));
            self.settle(now, target, screen);
        }

        if let Some((delta, finished)) = self.fling.advance(now) {
            let previous = target.frame().min;
            let origin = target.check_bounds(previous + delta, screen);
            target.set_origin(origin);
            gestures.push(Gesture::Moved(origin - previous));
            if finished {
                self.settle(now, target, screen);
            }
        }

        if let Some(origin) = self.sticky.advance(now) {
            let previous = target.frame().min;
            target.set_origin(origin);
            if origin != previous {
                gestures.push(Gesture::Moved(origin - previous));
            }
        }

        gestures
    }

    /// Starts snapping the target to its nearest resting edge.
    pub fn settle<T: TouchTarget + ?Sized>(&mut self, now: Duration, target: &T, screen: Vec2) {
        let frame = target.frame();
        let to = sticky_target(
            frame,
            target.sticky_bounds(screen),
            screen,
            self.config.edge_offset,
        );
        self.fling.cancel();
        self.sticky
            .start(now, frame.min, to, self.config.sticky_duration);
    }

    /// Drops the session and any motion in progress.
    pub fn reset(&mut self) {
        self.session = None;
        self.tracker.reset();
        self.fling.cancel();
        self.sticky.cancel();
    }
}
