//! The widget as the host sees it: a floating button that expands into a
//! control bar, plus the drop target that removes it.

use std::{cell::RefCell, rc::Rc, sync::Arc, time::Duration};

use eframe::egui::{ColorImage, Pos2, Vec2};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    assets::{self, IconSet},
    button::PlayPauseButton,
    clock::{Clock, SystemClock, TimerId, Timers},
    config::Config,
    error::Result,
    expand::{BarCell, BarEvent, ExpandCollapseWidget, ExpandDirection},
    gesture::{Gesture, GestureInterpreter, TouchAction, TouchEvent, TouchTarget},
    playback::{Initiator, PlayState, PlaybackListener, PlaybackState},
    trash::RemoveWidgetView,
};

/// Which of the two touchable views an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Button,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Collapsed,
    Expanded,
    /// The button was dropped on the trash target and the widget hid itself.
    Removed,
}

/// Receives clicks on the widget controls.
pub trait ControlsListener {
    fn on_playlist_clicked(&mut self) {}

    fn on_previous_clicked(&mut self) {}

    fn on_play_pause_clicked(&mut self) {}

    fn on_next_clicked(&mut self) {}

    fn on_album_clicked(&mut self) {}
}

pub trait WidgetListener {
    fn on_state_changed(&mut self, _state: WidgetState) {}

    /// Center of the floating button in screen coordinates.
    fn on_position_changed(&mut self, _cx: f32, _cy: f32) {}
}

pub type PlaybackCallback = Box<dyn FnMut(PlayState)>;

#[derive(Default)]
struct HostPlayback {
    callback: Option<PlaybackCallback>,
}

impl PlaybackListener for HostPlayback {
    fn on_state_changed(&mut self, _old: PlayState, new: PlayState, _initiator: Initiator) {
        if let Some(callback) = self.callback.as_mut() {
            callback(new);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetTask {
    RevealTrash,
    ShowExpanded,
}

pub struct AudioWidget {
    config: Config,
    icons: IconSet,
    clock: Box<dyn Clock>,
    screen: Vec2,
    rng: StdRng,
    playback: PlaybackState,
    button: PlayPauseButton,
    bar: ExpandCollapseWidget,
    trash: RemoveWidgetView,
    button_gestures: GestureInterpreter,
    bar_gestures: GestureInterpreter,
    timers: Timers<WidgetTask>,
    trash_timer: Option<TimerId>,
    active: Option<Surface>,
    shown: bool,
    released: bool,
    album_cover: Option<Arc<ColorImage>>,
    album_revision: u64,
    controls: Option<Box<dyn ControlsListener>>,
    listener: Option<Box<dyn WidgetListener>>,
    host_playback: Rc<RefCell<HostPlayback>>,
}

impl std::fmt::Debug for AudioWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioWidget")
            .field("shown", &self.shown)
            .field("screen", &self.screen)
            .field("playback", &self.playback)
            .field("button", &self.button)
            .field("bar", &self.bar)
            .finish()
    }
}

impl AudioWidget {
    pub fn new(config: Config, screen: Vec2) -> Result<Self> {
        Self::with_clock(config, screen, Box::new(SystemClock::new()), StdRng::from_entropy())
    }

    /// Builds the widget with an explicit time source and particle randomness.
    pub fn with_clock(
        config: Config,
        screen: Vec2,
        clock: Box<dyn Clock>,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let icons = IconSet::load(&config.icons)?;

        let mut playback = PlaybackState::new();
        let button = PlayPauseButton::new(&config, &mut playback);
        let host_playback = Rc::new(RefCell::new(HostPlayback::default()));
        playback.add_listener(host_playback.clone());
        let bar = ExpandCollapseWidget::new(&config);
        let trash = RemoveWidgetView::new(&config);

        Ok(Self {
            button_gestures: GestureInterpreter::new(config.gesture.clone()),
            bar_gestures: GestureInterpreter::new(config.gesture.clone()),
            config,
            icons,
            clock,
            screen,
            rng,
            playback,
            button,
            bar,
            trash,
            timers: Timers::default(),
            trash_timer: None,
            active: None,
            shown: false,
            released: true,
            album_cover: None,
            album_revision: 0,
            controls: None,
            listener: None,
            host_playback,
        })
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn icons(&self) -> &IconSet {
        &self.icons
    }

    pub fn screen(&self) -> Vec2 {
        self.screen
    }

    pub fn set_screen(&mut self, screen: Vec2) {
        self.screen = screen;
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn button(&self) -> &PlayPauseButton {
        &self.button
    }

    pub fn bar(&self) -> &ExpandCollapseWidget {
        &self.bar
    }

    pub fn trash(&self) -> &RemoveWidgetView {
        &self.trash
    }

    /// Current album cover and a counter bumped on every change.
    pub fn album_cover(&self) -> (Option<&Arc<ColorImage>>, u64) {
        (self.album_cover.as_ref(), self.album_revision)
    }

    pub fn controller(&mut self) -> Controller<'_> {
        Controller { widget: self }
    }

    /// Places the floating button with its top-left corner at `(x, y)`.
    pub fn show(&mut self, x: f32, y: f32) {
        if self.shown {
            return;
        }
        self.shown = true;
        self.released = true;
        self.button.set_origin(Pos2::new(x, y));
        self.button.set_visible(true);
        tracing::debug!(x, y, "widget shown");
    }

    pub fn hide(&mut self) {
        if !self.shown {
            return;
        }
        self.shown = false;
        self.released = true;
        let now = self.clock.now();
        self.timers.clear();
        self.trash_timer = None;
        self.active = None;
        self.button_gestures.reset();
        self.bar_gestures.reset();
        self.button.set_visible(false);
        self.bar.reset();
        self.trash.hide(now, self.screen);
        tracing::debug!("widget hidden");
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// True while the button burst or an expand/collapse runs.
    pub fn is_animation_in_progress(&self) -> bool {
        self.button.is_animation_in_progress() || self.bar.is_animation_in_progress()
    }

    /// True while anything on screen still changes without input.
    pub fn needs_repaint(&self) -> bool {
        self.is_animation_in_progress()
            || self.button_gestures.is_settling()
            || self.bar_gestures.is_settling()
            || self.button_gestures.is_touching()
            || self.trash.is_drawn()
            || !self.timers.is_empty()
    }

    /// Routes a screen-level pointer event to the view under it. Moves and
    /// releases follow the view that received the touch-down.
    pub fn dispatch(&mut self, event: TouchEvent) {
        match event.action {
            TouchAction::Down => {
                if self.bar.is_visible() && self.bar.frame().contains(event.position) {
                    self.active = Some(Surface::Bar);
                    self.handle_touch(Surface::Bar, event);
                } else if self.button.is_visible() && self.button.frame().contains(event.position) {
                    self.active = Some(Surface::Button);
                    self.handle_touch(Surface::Button, event);
                } else if self.bar.is_visible() {
                    self.handle_touch(
                        Surface::Bar,
                        TouchEvent::outside(event.position, event.at),
                    );
                }
            }
            TouchAction::Move => {
                if let Some(surface) = self.active {
                    self.handle_touch(surface, event);
                }
            }
            TouchAction::Up | TouchAction::Cancel => {
                if let Some(surface) = self.active.take() {
                    self.handle_touch(surface, event);
                }
            }
            TouchAction::Outside => {
                if self.bar.is_visible() {
                    self.handle_touch(Surface::Bar, event);
                }
            }
        }
    }

    pub fn handle_touch(&mut self, surface: Surface, event: TouchEvent) {
        if !self.shown {
            return;
        }
        match surface {
            Surface::Button => {
                if !self.button.is_visible() {
                    return;
                }
                let gestures = self
                    .button_gestures
                    .handle(event, &mut self.button, self.screen);
                self.on_button_gestures(event.at, gestures);
            }
            Surface::Bar => {
                if !self.bar.is_visible() {
                    return;
                }
                let gestures = self.bar_gestures.handle(event, &mut self.bar, self.screen);
                self.on_bar_gestures(event.at, gestures);
            }
        }
    }

    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.tick_at(now);
    }

    pub fn tick_at(&mut self, now: Duration) {
        self.button.tick(now);
        self.trash.tick(now);

        // Gestures first: a long click due at the same instant as the trash
        // reveal suppresses it.
        let gestures = self.button_gestures.tick(now, &mut self.button, self.screen);
        self.on_button_gestures(now, gestures);
        let gestures = self.bar_gestures.tick(now, &mut self.bar, self.screen);
        self.on_bar_gestures(now, gestures);

        for task in self.timers.take_due(now) {
            self.run_task(task, now);
        }

        match self.bar.tick(now) {
            Some(BarEvent::Expanded) => {
                tracing::debug!("widget expanded");
                self.notify_state(WidgetState::Expanded);
            }
            Some(BarEvent::Collapsed) => {
                tracing::debug!("widget collapsed");
                self.button.set_visible(self.shown);
                self.button.set_progress_enabled(true, now);
                self.notify_state(WidgetState::Collapsed);
            }
            None => {}
        }
    }

    fn run_task(&mut self, task: WidgetTask, now: Duration) {
        match task {
            WidgetTask::RevealTrash => {
                self.trash_timer = None;
                if self.shown && !self.released {
                    self.trash.show(now, self.screen);
                }
            }
            WidgetTask::ShowExpanded => {
                if self.shown {
                    self.show_expanded(now);
                }
            }
        }
    }

    fn show_expanded(&mut self, now: Duration) {
        let r = self.button.radius();
        let width = self.config.appearance.widget_width;
        let origin = self.button.origin();
        let direction = if origin.x + 2.0 * r > self.screen.x / 2.0 {
            ExpandDirection::Left
        } else {
            ExpandDirection::Right
        };
        let x = match direction {
            ExpandDirection::Left => origin.x - (width - 3.0 * r),
            ExpandDirection::Right => origin.x + r,
        };
        self.bar.set_origin(Pos2::new(x, origin.y));
        if self
            .bar
            .expand(now, direction, self.button.color(), &mut self.rng)
        {
            self.button.set_visible(false);
        }
    }

    fn on_button_gestures(&mut self, now: Duration, gestures: Vec<Gesture>) {
        for gesture in gestures {
            match gesture {
                Gesture::Touched(_) => {
                    self.released = false;
                    if let Some(id) = self.trash_timer.take() {
                        self.timers.cancel(id);
                    }
                    let at = now + self.config.gesture.long_click_threshold;
                    self.trash_timer = Some(self.timers.schedule(at, WidgetTask::RevealTrash));
                    self.button.on_touch_down(now);
                }
                Gesture::Click(_) => {
                    let toggled = self.button.on_click(&mut self.playback, now, &mut self.rng);
                    if toggled.is_some() {
                        if let Some(controls) = self.controls.as_mut() {
                            controls.on_play_pause_clicked();
                        }
                    }
                }
                Gesture::LongClick(_) => {
                    self.released = true;
                    self.button.set_progress_enabled(false, now);
                    let at = now + self.button.progress_duration();
                    self.timers.schedule(at, WidgetTask::ShowExpanded);
                }
                Gesture::Moved(_) => {
                    self.trash.track(self.button.center(), self.screen);
                    self.notify_position();
                }
                Gesture::Released(_) => {
                    self.button.on_touch_up(now);
                    self.released = true;
                    if let Some(id) = self.trash_timer.take() {
                        self.timers.cancel(id);
                    }
                    let remove = self.trash.is_overlapped();
                    self.trash.hide(now, self.screen);
                    if remove {
                        tracing::info!("widget dropped on trash target");
                        self.hide();
                        self.notify_state(WidgetState::Removed);
                        return;
                    }
                }
                Gesture::TouchOutside => {}
            }
        }
    }

    fn on_bar_gestures(&mut self, now: Duration, gestures: Vec<Gesture>) {
        for gesture in gestures {
            match gesture {
                Gesture::Click(local) => {
                    if let Some(cell) = self.bar.on_click(local, &mut self.playback) {
                        self.notify_cell(cell);
                    }
                }
                Gesture::TouchOutside => {
                    self.bar.collapse(now, self.button.color());
                }
                Gesture::Moved(_) => self.sync_button_to_bar(),
                Gesture::Touched(_) | Gesture::LongClick(_) | Gesture::Released(_) => {}
            }
        }
    }

    fn sync_button_to_bar(&mut self) {
        let r = self.button.radius();
        let width = self.config.appearance.widget_width;
        let bar = self.bar.origin();
        let x = match self.bar.direction() {
            ExpandDirection::Right => bar.x - r,
            ExpandDirection::Left => bar.x + width - 3.0 * r,
        };
        self.button.set_origin(Pos2::new(x, bar.y));
        self.notify_position();
    }

    fn notify_cell(&mut self, cell: BarCell) {
        let Some(controls) = self.controls.as_mut() else {
            return;
        };
        match cell {
            BarCell::Playlist => controls.on_playlist_clicked(),
            BarCell::Previous => controls.on_previous_clicked(),
            BarCell::PlayPause => controls.on_play_pause_clicked(),
            BarCell::Next => controls.on_next_clicked(),
            BarCell::Album => controls.on_album_clicked(),
        }
    }

    fn notify_state(&mut self, state: WidgetState) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_state_changed(state);
        }
    }

    fn notify_position(&mut self) {
        if !self.shown {
            return;
        }
        let center = self.button.center();
        if let Some(listener) = self.listener.as_mut() {
            listener.on_position_changed(center.x, center.y);
        }
    }
}

/// Host-facing handle for playback control and listener registration.
pub struct Controller<'a> {
    widget: &'a mut AudioWidget,
}

impl Controller<'_> {
    pub fn start(&mut self) {
        self.widget.playback.start(Initiator::Controller);
    }

    pub fn pause(&mut self) {
        self.widget.playback.pause(Initiator::Controller);
    }

    pub fn stop(&mut self) {
        self.widget.playback.stop(Initiator::Controller);
    }

    pub fn state(&self) -> PlayState {
        self.widget.playback.state()
    }

    pub fn duration(&self) -> u32 {
        self.widget.playback.duration()
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.widget.playback.set_duration(duration);
    }

    pub fn position(&self) -> u32 {
        self.widget.playback.position()
    }

    pub fn set_position(&mut self, position: i64) {
        self.widget.playback.set_position(position);
    }

    pub fn set_controls_listener(&mut self, listener: Option<Box<dyn ControlsListener>>) {
        self.widget.controls = listener;
    }

    pub fn set_widget_listener(&mut self, listener: Option<Box<dyn WidgetListener>>) {
        self.widget.listener = listener;
    }

    pub fn set_playback_listener(&mut self, callback: Option<PlaybackCallback>) {
        self.widget.host_playback.borrow_mut().callback = callback;
    }

    pub fn album_cover(&mut self, image: Option<ColorImage>) {
        self.widget.album_cover = image.map(Arc::new);
        self.widget.album_revision += 1;
    }

    /// Decodes an encoded image and uses it as the album cover. An image that
    /// can't be decoded clears the cover.
    pub fn album_cover_bytes(&mut self, bytes: &[u8]) {
        let image = assets::decode_album_cover(bytes);
        if image.is_none() {
            tracing::warn!(len = bytes.len(), "album cover could not be decoded");
        }
        self.album_cover(image);
    }
}
