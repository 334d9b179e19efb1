use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Monotonic time source. All engine timestamps are offsets from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time, so a test can keep one handle
/// and give another to the widget.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Elapsed-time accumulator sampled once per frame.
///
/// The first `step` after a reset only records the starting point.
#[derive(Debug, Clone, Default)]
pub struct TimeInterval {
    previous: Option<Duration>,
    dt: Duration,
    duration: Duration,
}

impl TimeInterval {
    pub fn step(&mut self, now: Duration) {
        self.dt = match self.previous {
            Some(previous) => now.saturating_sub(previous),
            None => Duration::ZERO,
        };
        self.previous = Some(now);
        self.duration += self.dt;
    }

    pub fn dt(&self) -> Duration {
        self.dt
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Accumulated time in milliseconds, the unit animation windows are expressed in.
    pub fn millis(&self) -> f32 {
        self.duration.as_secs_f32() * 1000.0
    }

    pub fn is_started(&self) -> bool {
        self.previous.is_some()
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.dt = Duration::ZERO;
        self.duration = Duration::ZERO;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Cancellable delayed tasks, polled from the driving loop.
#[derive(Debug)]
pub struct Timers<T> {
    next_id: u64,
    entries: Vec<(TimerId, Duration, T)>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn schedule(&mut self, at: Duration, task: T) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.entries.push((id, at, task));
        id
    }

    /// Returns `true` when the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _, _)| *entry != id);
        before != self.entries.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|(entry, _, _)| *entry == id)
    }

    /// Removes and returns every task whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].1 <= now {
                due.push(self.entries.remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|(id, at, _)| (*at, id.0));
        due.into_iter().map(|(_, _, task)| task).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
