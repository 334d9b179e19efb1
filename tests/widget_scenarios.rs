use std::{cell::RefCell, rc::Rc, time::Duration};

use audio_widget::{
    AudioWidget, Config, ControlsListener, ExpandDirection, ManualClock, PlayState, TouchEvent,
    WidgetListener, WidgetState,
};
use eframe::egui::{pos2, vec2, Pos2};
use rand::{rngs::StdRng, SeedableRng};

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    fn push(&self, entry: &str) {
        self.0.borrow_mut().push(entry.to_string());
    }

    fn seen(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl ControlsListener for Recorder {
    fn on_playlist_clicked(&mut self) {
        self.push("playlist");
    }

    fn on_previous_clicked(&mut self) {
        self.push("previous");
    }

    fn on_play_pause_clicked(&mut self) {
        self.push("play_pause");
    }

    fn on_next_clicked(&mut self) {
        self.push("next");
    }

    fn on_album_clicked(&mut self) {
        self.push("album");
    }
}

impl WidgetListener for Recorder {
    fn on_state_changed(&mut self, state: WidgetState) {
        self.push(&format!("{state:?}"));
    }
}

struct Harness {
    widget: AudioWidget,
    clock: ManualClock,
    now: u64,
    controls: Recorder,
    states: Recorder,
}

impl Harness {
    fn new() -> Self {
        let clock = ManualClock::new();
        let mut widget = AudioWidget::with_clock(
            Config::default(),
            vec2(1_000.0, 1_600.0),
            Box::new(clock.clone()),
            StdRng::seed_from_u64(42),
        )
        .expect("default config is valid");
        let controls = Recorder::default();
        let states = Recorder::default();
        {
            let mut controller = widget.controller();
            controller.set_controls_listener(Some(Box::new(controls.clone())));
            controller.set_widget_listener(Some(Box::new(states.clone())));
        }
        Self {
            widget,
            clock,
            now: 0,
            controls,
            states,
        }
    }

    fn at(&self) -> Duration {
        Duration::from_millis(self.now)
    }

    fn advance(&mut self, by: u64) {
        let target = self.now + by;
        while self.now < target {
            self.now = (self.now + 16).min(target);
            self.clock.set(self.at());
            self.widget.tick();
        }
    }

    fn down(&mut self, position: Pos2) {
        self.widget.dispatch(TouchEvent::down(position, self.at()));
    }

    fn drag(&mut self, position: Pos2) {
        self.widget.dispatch(TouchEvent::moved(position, self.at()));
    }

    fn up(&mut self, position: Pos2) {
        self.widget.dispatch(TouchEvent::up(position, self.at()));
    }

    fn tap(&mut self, position: Pos2) {
        self.down(position);
        self.advance(50);
        self.up(position);
    }

    /// Long-presses the button and waits for the bar to finish expanding.
    fn expand(&mut self) {
        let center = self.widget.button().center();
        self.down(center);
        self.advance(450);
        self.up(center);
        self.advance(3_000);
    }
}

#[test]
fn tapping_the_button_starts_playback_with_one_burst() {
    let mut h = Harness::new();
    h.widget.show(100.0, 100.0);
    assert!(h.widget.is_shown());

    h.down(pos2(172.0, 172.0));
    h.advance(100);
    h.up(pos2(172.0, 172.0));
    assert_eq!(h.widget.playback().state(), PlayState::Playing);
    assert!(h.widget.is_animation_in_progress());

    h.advance(1_000);
    assert!(!h.widget.is_animation_in_progress());
    assert_eq!(h.widget.button().color(), h.widget.config().colors.light);
    assert_eq!(h.controls.seen(), vec!["play_pause"]);
}

#[test]
fn long_press_expands_and_outside_touch_collapses() {
    let mut h = Harness::new();
    h.widget.show(100.0, 300.0);
    h.expand();

    assert_eq!(h.states.seen(), vec!["Expanded"]);
    assert_eq!(h.widget.playback().state(), PlayState::Stopped);
    assert!(!h.widget.button().is_visible());
    assert!(!h.widget.trash().is_drawn());
    assert_eq!(h.widget.bar().direction(), ExpandDirection::Right);
    // The button settled against the left edge first.
    assert_eq!(h.widget.bar().origin(), pos2(0.0, 300.0));
    assert_eq!(h.widget.button().progress_sweep(), 0.0);

    h.down(pos2(900.0, 1_200.0));
    h.up(pos2(900.0, 1_200.0));
    h.advance(900);
    assert_eq!(h.states.seen(), vec!["Expanded", "Collapsed"]);
    assert!(h.widget.button().is_visible());
    assert!(!h.widget.bar().is_visible());
}

#[test]
fn button_on_the_right_half_expands_left() {
    let mut h = Harness::new();
    h.widget.show(800.0, 300.0);
    h.expand();
    assert_eq!(h.widget.bar().direction(), ExpandDirection::Left);
    assert_eq!(h.widget.bar().origin(), pos2(892.0 - 272.0, 300.0));
}

#[test]
fn bar_cells_reach_the_host() {
    let mut h = Harness::new();
    h.widget.show(100.0, 300.0);
    h.expand();
    let origin = h.widget.bar().origin().to_vec2();

    h.tap(pos2(266.0, 72.0) + origin);
    h.advance(300);
    h.tap(pos2(114.0, 72.0) + origin);
    h.advance(300);
    h.tap(pos2(190.0, 72.0) + origin);
    h.advance(300);

    assert_eq!(h.controls.seen(), vec!["next", "previous", "play_pause"]);
    assert_eq!(h.widget.playback().state(), PlayState::Playing);
    assert!(!h.widget.button().is_bursting());
    assert_eq!(h.widget.button().color(), h.widget.config().colors.light);
}

#[test]
fn holding_past_the_expand_delay_still_releases_the_button() {
    let mut h = Harness::new();
    h.widget.show(100.0, 300.0);
    let center = h.widget.button().center();
    h.down(center);
    h.advance(1_500);
    assert!(!h.widget.button().is_visible());
    h.up(center);

    h.advance(2_500);
    assert_eq!(h.states.seen(), vec!["Expanded"]);
    h.down(pos2(900.0, 1_200.0));
    h.up(pos2(900.0, 1_200.0));
    h.advance(2_000);

    assert_eq!(h.states.seen(), vec!["Expanded", "Collapsed"]);
    assert!(h.widget.button().is_visible());
    assert_eq!(h.widget.button().scale(), 1.0);
    assert!(!h.widget.trash().is_drawn());
    assert!(!h.widget.needs_repaint());
}

#[test]
fn host_pause_during_a_burst_wins() {
    let mut h = Harness::new();
    h.widget.show(100.0, 100.0);
    h.tap(pos2(172.0, 172.0));
    assert_eq!(h.widget.playback().state(), PlayState::Playing);
    assert!(h.widget.button().is_bursting());

    h.advance(150);
    h.widget.controller().pause();
    h.advance(1_800);

    assert!(!h.widget.button().is_bursting());
    assert_eq!(h.widget.playback().state(), PlayState::Paused);
    assert_eq!(h.widget.button().icon_alphas(), (255, 0));
    assert_eq!(h.widget.button().color(), h.widget.config().colors.dark);
}

#[test]
fn new_touch_down_supersedes_the_pending_trash_reveal() {
    let mut h = Harness::new();
    h.widget.show(400.0, 600.0);
    let center = h.widget.button().center();
    h.down(center);
    h.advance(300);
    // The first touch-up never arrived.
    h.down(center);
    h.advance(150);
    assert!(!h.widget.trash().is_drawn());

    h.up(center);
    h.advance(600);
    assert!(!h.widget.trash().is_drawn());
    assert!(h.states.seen().is_empty());
}

#[test]
fn outside_touch_while_collapsed_is_silent() {
    let mut h = Harness::new();
    h.widget.show(100.0, 300.0);
    h.down(pos2(900.0, 1_200.0));
    h.up(pos2(900.0, 1_200.0));
    h.advance(500);
    assert!(h.states.seen().is_empty());
    assert!(h.controls.seen().is_empty());
}

fn settle_from(center_x: f32) -> f32 {
    let mut h = Harness::new();
    h.widget.show(center_x - 72.0, 700.0);
    let grab = pos2(center_x, 772.0);
    h.down(grab);
    h.advance(50);
    h.drag(grab + vec2(0.0, 30.0));
    h.advance(250);
    h.up(grab + vec2(0.0, 30.0));
    h.advance(400);
    assert!(h.controls.seen().is_empty());
    assert_eq!(h.widget.button().origin().y, 730.0);
    h.widget.button().origin().x
}

#[test]
fn released_button_sticks_to_nearest_edge() {
    assert_eq!(settle_from(100.0), -36.0);
    assert_eq!(settle_from(900.0), 892.0);
    assert_eq!(settle_from(500.0), 892.0);
}

#[test]
fn dropping_on_the_trash_removes_the_widget() {
    let mut h = Harness::new();
    h.widget.show(400.0, 600.0);
    h.down(pos2(472.0, 672.0));
    h.advance(50);
    h.drag(pos2(472.0, 700.0));
    h.advance(550);
    assert!(h.widget.trash().is_visible());

    h.drag(pos2(500.0, 1_560.0));
    assert!(h.widget.trash().is_overlapped());
    assert_eq!(
        h.widget.trash().cross_color(),
        h.widget.config().colors.cross_overlapped
    );

    h.up(pos2(500.0, 1_560.0));
    assert!(!h.widget.is_shown());
    assert_eq!(h.states.seen(), vec!["Removed"]);
    h.advance(300);
    assert!(!h.widget.trash().is_drawn());
}

#[test]
fn releasing_away_from_the_trash_keeps_the_widget() {
    let mut h = Harness::new();
    h.widget.show(400.0, 600.0);
    h.down(pos2(472.0, 672.0));
    h.advance(50);
    h.drag(pos2(472.0, 700.0));
    h.advance(550);
    h.up(pos2(472.0, 700.0));
    assert!(h.widget.is_shown());
    assert!(h.states.seen().is_empty());
    h.advance(300);
    assert!(!h.widget.trash().is_drawn());
}

#[test]
fn controller_drives_playback_and_notifies_host() {
    let mut h = Harness::new();
    let states = Rc::new(RefCell::new(Vec::new()));
    {
        let states = states.clone();
        let mut controller = h.widget.controller();
        controller.set_playback_listener(Some(Box::new(move |state: PlayState| {
            states.borrow_mut().push(state)
        })));
        controller.set_duration(10_000);
        controller.set_position(-5);
        assert_eq!(controller.position(), 0);
        controller.set_position(20_000);
        assert_eq!(controller.position(), 10_000);

        controller.start();
        controller.start();
        controller.pause();
        controller.stop();
        assert_eq!(controller.position(), 0);
        assert_eq!(controller.state(), PlayState::Stopped);
        assert_eq!(controller.duration(), 10_000);

        controller.album_cover_bytes(b"not an image");
    }
    assert_eq!(
        *states.borrow(),
        vec![PlayState::Playing, PlayState::Paused, PlayState::Stopped]
    );
    let (cover, revision) = h.widget.album_cover();
    assert!(cover.is_none());
    assert_eq!(revision, 1);
}
