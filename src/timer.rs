//! Pomodoro countdown timer.
//!
//! The timer is a plain state machine advanced one second at a time by
//! [`PomodoroTimer::tick`]; the caller owns the clock.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MINUTES: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Result of advancing the timer by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing changed.
    Stopped,
    Remaining(u32),
    /// The countdown reached zero on this tick. Reported once per session.
    Finished,
}

#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    minutes: u32,
    remaining: u32,
    state: TimerState,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES)
    }
}

impl PomodoroTimer {
    /// A zero length falls back to the default 25 minutes.
    pub fn new(minutes: u32) -> Self {
        let minutes = if minutes == 0 { DEFAULT_MINUTES } else { minutes };
        Self {
            minutes,
            remaining: minutes.saturating_mul(60),
            state: TimerState::Idle,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    /// Start a fresh session of `minutes`, or resume if paused.
    pub fn start(&mut self, minutes: u32) {
        if self.state != TimerState::Paused {
            *self = Self::new(minutes);
        }
        self.state = TimerState::Running;
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Stop and rewind to the full length of `minutes`.
    pub fn reset(&mut self, minutes: u32) {
        *self = Self::new(minutes);
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Stopped;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = TimerState::Idle;
            Tick::Finished
        } else {
            Tick::Remaining(self.remaining)
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    /// Tick once per second until the countdown finishes or `cancel` fires.
    /// `on_tick` sees every tick. Returns true when the session finished.
    pub async fn run(&mut self, cancel: &CancellationToken, mut on_tick: impl FnMut(&Self, Tick)) -> bool {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = ticker.tick() => {
                    let tick = self.tick();
                    on_tick(self, tick);
                    match tick {
                        Tick::Finished => return true,
                        Tick::Stopped => return false,
                        Tick::Remaining(_) => {}
                    }
                }
            }
        }
    }
}
