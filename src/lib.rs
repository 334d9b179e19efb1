//! Floating audio-player overlay: a draggable play/pause button that snaps to
//! screen edges, bursts bubbles on toggle, and expands into a five-control bar
//! on long press.
//!
//! The engine is single-threaded and driven by [`AudioWidget::tick`] from the
//! host's frame loop. Pointer input goes through [`AudioWidget::dispatch`] and
//! playback is controlled through [`AudioWidget::controller`].

pub mod assets;
pub mod button;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod expand;
pub mod gesture;
pub mod physics;
pub mod playback;
pub mod render;
pub mod trash;
pub mod tween;
pub mod widget;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Result, WidgetError};
pub use expand::{BarCell, ExpandDirection};
pub use gesture::{TouchAction, TouchEvent};
pub use playback::{Initiator, PlayState, PlaybackListener, PlaybackState};
pub use render::WidgetPainter;
pub use widget::{AudioWidget, Controller, ControlsListener, Surface, WidgetListener, WidgetState};
