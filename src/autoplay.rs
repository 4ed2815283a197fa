//! Autoplay controller: ping-pong playback across the regime order.
//!
//! State transitions are a pure reducer over [`AutoplayEvent`]s, in the
//! same shape as an event-sourced engine: `(state, event) -> transition`.
//! The wall-clock side lives in [`AutoplayTimer`], an owned interval that
//! the session arms and disarms as the state asks for it.

use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

use crate::catalog::{RegimeId, REGIME_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Per-view autoplay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoplayState {
    pub current: RegimeId,
    pub previous: RegimeId,
    pub is_auto_playing: bool,
    pub direction: Direction,
}

impl Default for AutoplayState {
    fn default() -> Self {
        Self {
            current: RegimeId::MIDDLE,
            previous: RegimeId::MIDDLE,
            is_auto_playing: true,
            direction: Direction::Forward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayEvent {
    Tick,
    ManualJump(RegimeId),
    Pause,
    Resume,
    Toggle,
    SetReducedMotion(bool),
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: AutoplayState,
    pub after: AutoplayState,
    /// Direction reversed at an end of the order
    pub flipped: bool,
    /// Tick arrived while paused or under reduced motion
    pub suppressed: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    pub fn moved(&self) -> bool {
        self.before.current != self.after.current
    }
}

/// One ping-pong step. Reverses at either end instead of wrapping, and
/// lands one step back from the end so the extreme is not repeated.
pub fn ping_pong_step(current: RegimeId, direction: Direction) -> (RegimeId, Direction, bool) {
    let index = current.index();
    let (next, direction, flipped) = match direction {
        Direction::Forward if index + 1 == REGIME_COUNT => {
            (REGIME_COUNT - 2, Direction::Backward, true)
        }
        Direction::Forward => (index + 1, Direction::Forward, false),
        Direction::Backward if index == 0 => (1, Direction::Forward, true),
        Direction::Backward => (index - 1, Direction::Backward, false),
    };
    // next is always within 0..REGIME_COUNT
    let next = RegimeId::from_index(next).unwrap_or(current);
    (next, direction, flipped)
}

#[derive(Debug, Clone, Default)]
pub struct AutoplayController {
    state: AutoplayState,
    reduced_motion: bool,
}

impl AutoplayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AutoplayState) -> Self {
        Self { state, reduced_motion: false }
    }

    pub fn state(&self) -> &AutoplayState {
        &self.state
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Whether the tick timer should be armed right now.
    pub fn should_tick(&self) -> bool {
        self.state.is_auto_playing && !self.reduced_motion
    }

    pub fn apply(&mut self, event: AutoplayEvent) -> Transition {
        let before = self.state;
        let mut flipped = false;
        let mut suppressed = false;

        match event {
            AutoplayEvent::Tick => {
                if self.should_tick() {
                    let (next, direction, did_flip) =
                        ping_pong_step(self.state.current, self.state.direction);
                    self.state.previous = self.state.current;
                    self.state.current = next;
                    self.state.direction = direction;
                    flipped = did_flip;
                } else {
                    suppressed = true;
                }
            }
            AutoplayEvent::ManualJump(target) => {
                self.state.is_auto_playing = false;
                if target != self.state.current {
                    self.state.previous = self.state.current;
                    self.state.current = target;
                }
                self.state.direction = Direction::Forward;
            }
            AutoplayEvent::Pause => self.state.is_auto_playing = false,
            AutoplayEvent::Resume => self.state.is_auto_playing = true,
            AutoplayEvent::Toggle => self.state.is_auto_playing = !self.state.is_auto_playing,
            AutoplayEvent::SetReducedMotion(on) => self.reduced_motion = on,
        }

        Transition {
            before,
            after: self.state,
            flipped,
            suppressed,
        }
    }
}

// =============================================================================
// Timer
// =============================================================================

/// Owned autoplay ticker. At most one interval exists per timer: starting
/// replaces the previous one, and dropping the timer releases it.
#[derive(Debug)]
pub struct AutoplayTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl AutoplayTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Arm the ticker; the first tick arrives one full period from now.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    /// Start or stop so that the timer runs exactly when `should_run`.
    /// A running timer is left alone so its phase is kept.
    pub fn sync(&mut self, should_run: bool) {
        match (should_run, self.is_running()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    /// Wait for the next tick. Never resolves while stopped.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => std::future::pending().await,
        }
    }
}
