use std::{cell::RefCell, rc::Rc, time::Duration};

use anyhow::Context as _;
use audio_widget::{
    AudioWidget, Config, ControlsListener, PlayState, TouchAction, TouchEvent, WidgetListener,
    WidgetPainter, WidgetState,
};
use eframe::egui::{
    self, Color32, ColorImage, Id, LayerId, Order, PointerButton, ViewportBuilder, ViewportCommand,
};
use tracing_subscriber::EnvFilter;

const TICKER_INTERVAL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    PlayPause,
    Previous,
    Next,
    Playlist,
    Album,
    Removed,
}

/// Collects widget callbacks so the app can act on them after the widget call returns.
#[derive(Clone, Default)]
struct Inbox(Rc<RefCell<Vec<Command>>>);

impl Inbox {
    fn push(&self, command: Command) {
        self.0.borrow_mut().push(command);
    }

    fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl ControlsListener for Inbox {
    fn on_playlist_clicked(&mut self) {
        self.push(Command::Playlist);
    }

    fn on_previous_clicked(&mut self) {
        self.push(Command::Previous);
    }

    fn on_play_pause_clicked(&mut self) {
        self.push(Command::PlayPause);
    }

    fn on_next_clicked(&mut self) {
        self.push(Command::Next);
    }

    fn on_album_clicked(&mut self) {
        self.push(Command::Album);
    }
}

impl WidgetListener for Inbox {
    fn on_state_changed(&mut self, state: WidgetState) {
        tracing::debug!(?state, "widget state changed");
        if state == WidgetState::Removed {
            self.push(Command::Removed);
        }
    }

    fn on_position_changed(&mut self, cx: f32, cy: f32) {
        tracing::trace!(cx, cy, "widget moved");
    }
}

#[derive(Debug, Clone)]
struct Track {
    title: &'static str,
    artist: &'static str,
    duration_ms: u32,
    tint: [u8; 3],
}

fn demo_playlist() -> Vec<Track> {
    vec![
        Track {
            title: "Night Drive",
            artist: "Lowlands",
            duration_ms: 18_000,
            tint: [0x5e, 0x2b, 0x7e],
        },
        Track {
            title: "Paper Boats",
            artist: "Harbor Lights",
            duration_ms: 24_000,
            tint: [0x1e, 0x88, 0xe5],
        },
        Track {
            title: "Saffron",
            artist: "The Quiet Hours",
            duration_ms: 15_000,
            tint: [0xf5, 0xb7, 0x00],
        },
    ]
}

/// Simple two-tone cover so the album cell has something to show.
fn cover_for(track: &Track) -> ColorImage {
    const SIZE: usize = 64;
    let [r, g, b] = track.tint;
    let mut pixels = Vec::with_capacity(SIZE * SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let shade = ((x + y) as f32 / (2 * SIZE) as f32 * 0.6 + 0.4).min(1.0);
            pixels.push(Color32::from_rgb(
                (r as f32 * shade) as u8,
                (g as f32 * shade) as u8,
                (b as f32 * shade) as u8,
            ));
        }
    }
    ColorImage::new([SIZE, SIZE], pixels)
}

/// Plays through the playlist in memory, standing in for a media player.
struct MusicService {
    tracks: Vec<Track>,
    current: usize,
    position: u32,
    last_tick: Option<Duration>,
    started: bool,
}

impl MusicService {
    fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            current: 0,
            position: 0,
            last_tick: None,
            started: false,
        }
    }

    fn track(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    fn load_current(&mut self, widget: &mut AudioWidget) {
        self.position = 0;
        let mut controller = widget.controller();
        let Some(track) = self.tracks.get(self.current) else {
            controller.stop();
            return;
        };
        tracing::info!(title = track.title, artist = track.artist, "now playing");
        controller.set_duration(track.duration_ms);
        controller.set_position(0);
        controller.album_cover(Some(cover_for(track)));
    }

    fn play(&mut self, widget: &mut AudioWidget) {
        if self.tracks.is_empty() {
            widget.controller().stop();
            return;
        }
        if !self.started {
            self.started = true;
            self.load_current(widget);
            widget.show(0.0, 0.0);
        }
        widget.controller().start();
    }

    fn skip(&mut self, widget: &mut AudioWidget, forward: bool) {
        let count = self.tracks.len();
        if count == 0 {
            widget.controller().stop();
            return;
        }
        self.current = if forward {
            (self.current + 1) % count
        } else {
            (self.current + count - 1) % count
        };
        self.load_current(widget);
        widget.controller().start();
    }

    /// Advances the position once per ticker interval while playing.
    fn tick(&mut self, widget: &mut AudioWidget, now: Duration) {
        if widget.playback().state() != PlayState::Playing {
            self.last_tick = None;
            return;
        }
        let last = *self.last_tick.get_or_insert(now);
        if now.saturating_sub(last) < TICKER_INTERVAL {
            return;
        }
        self.last_tick = Some(now);
        self.position = widget.playback().position() + TICKER_INTERVAL.as_millis() as u32;
        let finished = self
            .track()
            .map_or(true, |track| self.position >= track.duration_ms);
        if finished {
            self.skip(widget, true);
        } else {
            widget.controller().set_position(self.position as i64);
        }
    }
}

struct App {
    widget: AudioWidget,
    painter: WidgetPainter,
    service: MusicService,
    inbox: Inbox,
    pointer_down: bool,
    closing: bool,
}

impl App {
    fn new(config: Config) -> anyhow::Result<Self> {
        let mut widget = AudioWidget::new(config, egui::vec2(1_280.0, 800.0))
            .context("Failed to build the audio widget")?;
        let inbox = Inbox::default();
        {
            let mut controller = widget.controller();
            controller.set_controls_listener(Some(Box::new(inbox.clone())));
            controller.set_widget_listener(Some(Box::new(inbox.clone())));
            controller.set_playback_listener(Some(Box::new(|state: PlayState| {
                tracing::info!(?state, "playback state changed");
            })));
        }
        let mut service = MusicService::new(demo_playlist());
        service.play(&mut widget);

        Ok(Self {
            widget,
            painter: WidgetPainter::default(),
            service,
            inbox,
            pointer_down: false,
            closing: false,
        })
    }

    fn forward_pointer(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        let now = self.widget.now();
        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    self.pointer_down = pressed;
                    let touch = if pressed {
                        TouchEvent::down(pos, now)
                    } else {
                        TouchEvent::up(pos, now)
                    };
                    self.widget.dispatch(touch);
                }
                egui::Event::PointerMoved(pos) if self.pointer_down => {
                    self.widget.dispatch(TouchEvent::moved(pos, now));
                }
                egui::Event::PointerGone if self.pointer_down => {
                    self.pointer_down = false;
                    let pos = ctx.input(|i| i.pointer.latest_pos()).unwrap_or_default();
                    self.widget
                        .dispatch(TouchEvent::new(TouchAction::Cancel, pos, now));
                }
                _ => {}
            }
        }
    }

    fn handle_commands(&mut self, ctx: &egui::Context) {
        for command in self.inbox.drain() {
            match command {
                Command::PlayPause => {
                    tracing::debug!(state = ?self.widget.playback().state(), "play/pause toggled");
                }
                Command::Previous => self.service.skip(&mut self.widget, false),
                Command::Next => self.service.skip(&mut self.widget, true),
                Command::Playlist => tracing::info!("playlist requested"),
                Command::Album => {
                    if let Some(track) = self.service.track() {
                        tracing::info!(title = track.title, artist = track.artist, "album requested");
                    }
                }
                Command::Removed => {
                    tracing::info!("widget removed; stopping playback");
                    self.widget.controller().stop();
                    self.closing = true;
                    ctx.send_viewport_cmd(ViewportCommand::Close);
                }
            }
        }
    }

    fn desired_repaint_interval(&self) -> Duration {
        if self.widget.needs_repaint() {
            self.widget.config().animation.tick_interval
        } else if self.widget.playback().state() == PlayState::Playing {
            Duration::from_millis(250)
        } else {
            Duration::from_millis(500)
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.widget.set_screen(ctx.screen_rect().size());
        self.forward_pointer(ctx);
        self.widget.tick();
        self.handle_commands(ctx);
        if self.closing {
            return;
        }
        let now = self.widget.now();
        self.service.tick(&mut self.widget, now);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::from_rgb(0x20, 0x20, 0x24)))
            .show(ctx, |ui| {
                if let Some(track) = self.service.track() {
                    ui.label(format!("{} - {}", track.artist, track.title));
                }
                ui.label("Long-press the button to expand it; drag it onto the cross to remove it.");
            });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("audio_widget")));
        self.painter.paint(ctx, &painter, &self.widget);

        ctx.request_repaint_after(self.desired_repaint_interval());
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("audio_widget=info,audio_widget_demo=info")),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let app = App::new(config)?;

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Audio Widget")
            .with_inner_size([1_280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Audio Widget",
        native_options,
        Box::new(
            move |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(app)) },
        ),
    )
    .map_err(|e| anyhow::anyhow!("eframe exited with an error: {e}"))?;

    Ok(())
}
