//! Shared playback state with an insertion-ordered listener registry.

use std::{cell::RefCell, rc::Rc};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Component that caused a state transition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Initiator {
    PlayButton,
    ExpandedBar,
    /// The host, through the controller.
    Controller,
}

pub trait PlaybackListener {
    fn on_state_changed(&mut self, _old: PlayState, _new: PlayState, _initiator: Initiator) {}

    fn on_progress_changed(&mut self, _position: u32, _duration: u32, _percentage: f32) {}
}

/// Adapter turning a closure into a state-change listener.
pub struct StateChangeFn<F>(pub F);

impl<F> PlaybackListener for StateChangeFn<F>
where
    F: FnMut(PlayState, PlayState, Initiator),
{
    fn on_state_changed(&mut self, old: PlayState, new: PlayState, initiator: Initiator) {
        (self.0)(old, new, initiator)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ListenerId(u64);

pub type SharedListener = Rc<RefCell<dyn PlaybackListener>>;

#[derive(Default)]
pub struct PlaybackState {
    state: PlayState,
    position: u32,
    duration: u32,
    next_listener: u64,
    listeners: Vec<(ListenerId, SharedListener)>,
}

impl std::fmt::Debug for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackState")
            .field("state", &self.state)
            .field("position", &self.position)
            .field("duration", &self.duration)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: SharedListener) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(entry, _)| *entry != id);
        before != self.listeners.len()
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn percentage(&self) -> f32 {
        if self.duration == 0 {
            0.0
        } else {
            self.position as f32 / self.duration as f32
        }
    }

    /// Negative positions clamp to 0, positions past a known duration clamp to it.
    /// With an unknown (zero) duration the position is kept and percentage stays 0.
    pub fn set_position(&mut self, position: i64) -> &mut Self {
        let mut clamped = position.max(0);
        if self.duration > 0 {
            clamped = clamped.min(self.duration as i64);
        }
        if clamped != position {
            tracing::debug!(position, clamped, "playback position out of range");
        }
        self.position = clamped.min(u32::MAX as i64) as u32;
        self.notify_progress();
        self
    }

    /// Does not notify; the next position update reports the new percentage.
    pub fn set_duration(&mut self, duration: u32) -> &mut Self {
        self.duration = duration;
        if duration > 0 && self.position > duration {
            self.position = duration;
        }
        self
    }

    pub fn start(&mut self, initiator: Initiator) {
        self.transition(PlayState::Playing, initiator);
    }

    pub fn pause(&mut self, initiator: Initiator) {
        self.transition(PlayState::Paused, initiator);
    }

    pub fn stop(&mut self, initiator: Initiator) {
        if self.transition(PlayState::Stopped, initiator) {
            self.set_position(0);
        }
    }

    /// Playing becomes paused, anything else starts playing.
    pub fn toggle(&mut self, initiator: Initiator) -> PlayState {
        if self.state == PlayState::Playing {
            self.pause(initiator);
        } else {
            self.start(initiator);
        }
        self.state
    }

    fn transition(&mut self, state: PlayState, initiator: Initiator) -> bool {
        if self.state == state {
            return false;
        }
        let old = self.state;
        self.state = state;
        tracing::debug!(?old, new = ?state, ?initiator, "playback state changed");
        for (_, listener) in &self.listeners {
            listener.borrow_mut().on_state_changed(old, state, initiator);
        }
        true
    }

    fn notify_progress(&self) {
        let percentage = self.percentage();
        for (_, listener) in &self.listeners {
            listener
                .borrow_mut()
                .on_progress_changed(self.position, self.duration, percentage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        transitions: Vec<(PlayState, PlayState, Initiator)>,
        progress: Vec<(u32, u32, f32)>,
    }

    impl PlaybackListener for Recorder {
        fn on_state_changed(&mut self, old: PlayState, new: PlayState, initiator: Initiator) {
            self.transitions.push((old, new, initiator));
        }

        fn on_progress_changed(&mut self, position: u32, duration: u32, percentage: f32) {
            self.progress.push((position, duration, percentage));
        }
    }

    fn recorded() -> (PlaybackState, Rc<RefCell<Recorder>>) {
        let mut state = PlaybackState::new();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        state.add_listener(recorder.clone());
        (state, recorder)
    }

    #[test]
    fn repeated_start_notifies_once() {
        let (mut state, recorder) = recorded();
        state.start(Initiator::Controller);
        state.start(Initiator::Controller);
        assert_eq!(
            recorder.borrow().transitions,
            vec![(PlayState::Stopped, PlayState::Playing, Initiator::Controller)]
        );
    }

    #[test]
    fn transitions_follow_legal_paths() {
        let (mut state, recorder) = recorded();
        state.pause(Initiator::PlayButton);
        state.pause(Initiator::PlayButton);
        state.start(Initiator::ExpandedBar);
        state.stop(Initiator::Controller);
        state.stop(Initiator::Controller);

        let seen: Vec<_> = recorder
            .borrow()
            .transitions
            .iter()
            .map(|(old, new, _)| (*old, *new))
            .collect();
        assert_eq!(
            seen,
            vec![
                (PlayState::Stopped, PlayState::Paused),
                (PlayState::Paused, PlayState::Playing),
                (PlayState::Playing, PlayState::Stopped),
            ]
        );
        for (old, new) in seen {
            assert_ne!(old, new);
        }
    }

    #[test]
    fn stop_resets_position() {
        let (mut state, recorder) = recorded();
        state.set_duration(10_000);
        state.start(Initiator::Controller);
        state.set_position(4_000);
        state.stop(Initiator::Controller);
        assert_eq!(state.position(), 0);
        assert_eq!(recorder.borrow().progress.last(), Some(&(0, 10_000, 0.0)));
    }

    #[test]
    fn percentage_tracks_position() {
        let (mut state, recorder) = recorded();
        state.set_duration(8_000);
        state.set_position(2_000);
        assert!((state.percentage() - 0.25).abs() < f32::EPSILON);
        let (_, _, reported) = recorder.borrow().progress[0];
        assert!((reported - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_duration_reports_zero_percentage() {
        let (mut state, recorder) = recorded();
        state.set_position(1_500);
        assert_eq!(state.percentage(), 0.0);
        assert_eq!(state.position(), 1_500);
        assert!(!recorder.borrow().progress[0].2.is_nan());
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let (mut state, _) = recorded();
        state.set_duration(1_000);
        state.set_position(-20);
        assert_eq!(state.position(), 0);
        state.set_position(5_000);
        assert_eq!(state.position(), 1_000);
        assert_eq!(state.percentage(), 1.0);
    }

    #[test]
    fn listeners_run_in_registration_order_and_can_be_removed() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut state = PlaybackState::new();
        let mut ids = Vec::new();
        for tag in 0..3 {
            let order = order.clone();
            ids.push(state.add_listener(Rc::new(RefCell::new(StateChangeFn(
                move |_: PlayState, _: PlayState, _: Initiator| order.borrow_mut().push(tag),
            )))));
        }
        state.start(Initiator::Controller);
        assert!(state.remove_listener(ids[1]));
        state.pause(Initiator::Controller);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 0, 2]);
    }
}
