use anyhow::Context;
use eframe::egui::{vec2, Color32, Vec2};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    color::parse_color,
    error::{Result, WidgetError},
};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gesture: GestureConfig,
    pub animation: AnimationConfig,
    pub appearance: AppearanceConfig,
    pub colors: ColorConfig,
    pub icons: IconPaths,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("audiowidget.toml"));
            candidates.push(current_dir.join("config").join("audiowidget.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("audiowidget.toml"));
                candidates.push(dir.join("config").join("audiowidget.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml_str(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        if let Some(dir) = path.parent() {
            config.icons.resolve_relative_to(dir);
        }
        tracing::info!(path = %path.display(), "loaded widget configuration");
        Ok(config)
    }

    pub fn from_toml_str(data: &str) -> anyhow::Result<Self> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(Config::try_from(doc)?)
    }

    pub fn validate(&self) -> Result<()> {
        let gesture = &self.gesture;
        if gesture.click_threshold > gesture.long_click_threshold {
            return Err(WidgetError::InvalidConfig(format!(
                "click threshold ({:?}) exceeds long-click threshold ({:?})",
                gesture.click_threshold, gesture.long_click_threshold
            )));
        }
        if gesture.movement_threshold < 0.0 {
            return Err(WidgetError::InvalidConfig(
                "movement threshold must not be negative".to_string(),
            ));
        }
        if self.animation.frame_speed <= 0.0 {
            return Err(WidgetError::InvalidConfig(
                "frame speed must be positive".to_string(),
            ));
        }

        let appearance = &self.appearance;
        if appearance.radius <= 0.0 {
            return Err(WidgetError::InvalidConfig(
                "radius must be positive".to_string(),
            ));
        }
        if appearance.widget_width < appearance.radius * 2.0 {
            return Err(WidgetError::InvalidConfig(format!(
                "widget width {} is narrower than the button diameter {}",
                appearance.widget_width,
                appearance.radius * 2.0
            )));
        }
        if appearance.bubbles_min_size > appearance.bubbles_max_size
            || appearance.bubbles_min_size > appearance.expanded_bubbles_max_size
        {
            return Err(WidgetError::InvalidConfig(
                "bubble min size exceeds max size".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GestureConfig {
    pub click_threshold: Duration,
    pub long_click_threshold: Duration,
    pub movement_threshold: f32,
    /// Pixels per second.
    pub fling_velocity_threshold: f32,
    pub fling_duration: Duration,
    pub sticky_duration: Duration,
    pub edge_offset: Vec2,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_threshold: Duration::from_millis(200),
            long_click_threshold: Duration::from_millis(400),
            movement_threshold: 10.0,
            fling_velocity_threshold: 600.0,
            fling_duration: Duration::from_millis(500),
            sticky_duration: Duration::from_millis(200),
            edge_offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationConfig {
    /// Base duration in milliseconds scaling every animation phase.
    pub frame_speed: f32,
    pub tick_interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_speed: 70.0,
            tick_interval: Duration::from_millis(16),
        }
    }
}

impl AnimationConfig {
    pub fn frames(&self, units: f32) -> Duration {
        Duration::from_micros((units * self.frame_speed * 1000.0).round().max(0.0) as u64)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShadowConfig {
    pub radius: f32,
    pub offset: Vec2,
}

#[derive(Debug, Clone)]
pub struct AppearanceConfig {
    pub radius: f32,
    pub widget_width: f32,
    pub button_padding: f32,
    pub progress_stroke_width: f32,
    pub cross_stroke_width: f32,
    pub bubbles_min_size: f32,
    pub bubbles_max_size: f32,
    pub expanded_bubbles_max_size: f32,
    pub shadow: ShadowConfig,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            radius: 36.0,
            widget_width: 380.0,
            button_padding: 18.0,
            progress_stroke_width: 4.0,
            cross_stroke_width: 4.0,
            bubbles_min_size: 10.0,
            bubbles_max_size: 20.0,
            expanded_bubbles_max_size: 25.0,
            shadow: ShadowConfig {
                radius: 8.0,
                offset: vec2(2.0, 2.0),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorConfig {
    /// Button color while paused or stopped.
    pub dark: Color32,
    /// Button color while playing.
    pub light: Color32,
    pub progress: Color32,
    pub expanded: Color32,
    pub shadow: Color32,
    pub cross_default: Color32,
    pub cross_overlapped: Color32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            dark: Color32::from_rgb(0x5e, 0x2b, 0x7e),
            light: Color32::from_rgb(0xf5, 0xb7, 0x00),
            progress: Color32::WHITE,
            expanded: Color32::from_rgb(0xf5, 0xf5, 0xf5),
            shadow: Color32::from_rgba_unmultiplied(0, 0, 0, 80),
            cross_default: Color32::from_rgb(0xf5, 0xf5, 0xf5),
            cross_overlapped: Color32::from_rgb(0xe5, 0x39, 0x35),
        }
    }
}

/// Optional image files replacing the built-in vector icons.
#[derive(Debug, Clone, Default)]
pub struct IconPaths {
    pub play: Option<PathBuf>,
    pub pause: Option<PathBuf>,
    pub prev: Option<PathBuf>,
    pub next: Option<PathBuf>,
    pub playlist: Option<PathBuf>,
    pub album: Option<PathBuf>,
}

impl IconPaths {
    pub fn entries(&self) -> [(&'static str, Option<&Path>); 6] {
        [
            ("play", self.play.as_deref()),
            ("pause", self.pause.as_deref()),
            ("prev", self.prev.as_deref()),
            ("next", self.next.as_deref()),
            ("playlist", self.playlist.as_deref()),
            ("album", self.album.as_deref()),
        ]
    }

    fn resolve_relative_to(&mut self, dir: &Path) {
        for path in [
            &mut self.play,
            &mut self.pause,
            &mut self.prev,
            &mut self.next,
            &mut self.playlist,
            &mut self.album,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    gesture: GestureSection,
    #[serde(default)]
    animation: AnimationSection,
    #[serde(default)]
    appearance: AppearanceSection,
    #[serde(default)]
    colors: ColorSection,
    #[serde(default)]
    icons: IconSection,
}

impl TryFrom<ConfigDocument> for Config {
    type Error = WidgetError;

    fn try_from(value: ConfigDocument) -> Result<Self> {
        let gesture_defaults = GestureConfig::default();
        let gesture = GestureConfig {
            click_threshold: value
                .gesture
                .click_threshold_ms
                .map(Duration::from_millis)
                .unwrap_or(gesture_defaults.click_threshold),
            long_click_threshold: value
                .gesture
                .long_click_threshold_ms
                .map(Duration::from_millis)
                .unwrap_or(gesture_defaults.long_click_threshold),
            movement_threshold: value
                .gesture
                .movement_threshold_px
                .unwrap_or(gesture_defaults.movement_threshold),
            fling_velocity_threshold: value
                .gesture
                .fling_velocity_threshold
                .unwrap_or(gesture_defaults.fling_velocity_threshold),
            fling_duration: value
                .gesture
                .fling_duration_ms
                .map(Duration::from_millis)
                .unwrap_or(gesture_defaults.fling_duration),
            sticky_duration: value
                .gesture
                .sticky_duration_ms
                .map(Duration::from_millis)
                .unwrap_or(gesture_defaults.sticky_duration),
            edge_offset: vec2(
                value.gesture.edge_offset_x.unwrap_or(0.0),
                value.gesture.edge_offset_y.unwrap_or(0.0),
            ),
        };

        let animation_defaults = AnimationConfig::default();
        let animation = AnimationConfig {
            frame_speed: value
                .animation
                .frame_speed_ms
                .unwrap_or(animation_defaults.frame_speed),
            tick_interval: value
                .animation
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(animation_defaults.tick_interval),
        };

        let defaults = AppearanceConfig::default();
        let section = value.appearance;
        let appearance = AppearanceConfig {
            radius: section.radius.unwrap_or(defaults.radius),
            widget_width: section.widget_width.unwrap_or(defaults.widget_width),
            button_padding: section.button_padding.unwrap_or(defaults.button_padding),
            progress_stroke_width: section
                .progress_stroke_width
                .unwrap_or(defaults.progress_stroke_width),
            cross_stroke_width: section
                .cross_stroke_width
                .unwrap_or(defaults.cross_stroke_width),
            bubbles_min_size: section.bubbles_min_size.unwrap_or(defaults.bubbles_min_size),
            bubbles_max_size: section.bubbles_max_size.unwrap_or(defaults.bubbles_max_size),
            expanded_bubbles_max_size: section
                .expanded_bubbles_max_size
                .unwrap_or(defaults.expanded_bubbles_max_size),
            shadow: ShadowConfig {
                radius: section.shadow_radius.unwrap_or(defaults.shadow.radius),
                offset: vec2(
                    section.shadow_dx.unwrap_or(defaults.shadow.offset.x),
                    section.shadow_dy.unwrap_or(defaults.shadow.offset.y),
                ),
            },
        };

        let defaults = ColorConfig::default();
        let section = value.colors;
        let colors = ColorConfig {
            dark: color_or(section.dark, "dark", defaults.dark)?,
            light: color_or(section.light, "light", defaults.light)?,
            progress: color_or(section.progress, "progress", defaults.progress)?,
            expanded: color_or(section.expanded, "expanded", defaults.expanded)?,
            shadow: color_or(section.shadow, "shadow", defaults.shadow)?,
            cross_default: color_or(section.cross_default, "cross_default", defaults.cross_default)?,
            cross_overlapped: color_or(
                section.cross_overlapped,
                "cross_overlapped",
                defaults.cross_overlapped,
            )?,
        };

        let icons = IconPaths {
            play: value.icons.play,
            pause: value.icons.pause,
            prev: value.icons.prev,
            next: value.icons.next,
            playlist: value.icons.playlist,
            album: value.icons.album,
        };

        let config = Config {
            gesture,
            animation,
            appearance,
            colors,
            icons,
        };
        config.validate()?;
        Ok(config)
    }
}

fn color_or(value: Option<String>, key: &'static str, fallback: Color32) -> Result<Color32> {
    match value {
        Some(raw) => parse_color(&raw).map_err(|err| WidgetError::InvalidColor {
            key,
            reason: err.to_string(),
        }),
        None => Ok(fallback),
    }
}

#[derive(Debug, Default, Deserialize)]
struct GestureSection {
    click_threshold_ms: Option<u64>,
    long_click_threshold_ms: Option<u64>,
    movement_threshold_px: Option<f32>,
    fling_velocity_threshold: Option<f32>,
    fling_duration_ms: Option<u64>,
    sticky_duration_ms: Option<u64>,
    edge_offset_x: Option<f32>,
    edge_offset_y: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct AnimationSection {
    frame_speed_ms: Option<f32>,
    tick_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AppearanceSection {
    radius: Option<f32>,
    widget_width: Option<f32>,
    button_padding: Option<f32>,
    progress_stroke_width: Option<f32>,
    cross_stroke_width: Option<f32>,
    bubbles_min_size: Option<f32>,
    bubbles_max_size: Option<f32>,
    expanded_bubbles_max_size: Option<f32>,
    shadow_radius: Option<f32>,
    shadow_dx: Option<f32>,
    shadow_dy: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct ColorSection {
    dark: Option<String>,
    light: Option<String>,
    progress: Option<String>,
    expanded: Option<String>,
    shadow: Option<String>,
    cross_default: Option<String>,
    cross_overlapped: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IconSection {
    play: Option<PathBuf>,
    pause: Option<PathBuf>,
    prev: Option<PathBuf>,
    next: Option<PathBuf>,
    playlist: Option<PathBuf>,
    album: Option<PathBuf>,
}
