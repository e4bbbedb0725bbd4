//! Three independent periodic tick sources on one serialized timeline.
//!
//! The clock does not call back into the game. `advance` turns elapsed time into
//! a list of due [`Tick`]s, ordered by when they fell due, and each tick carries
//! the epoch it was scheduled under. `start` and `stop` bump the epoch, so a
//! tick produced before a stop can be recognised and dropped by whoever
//! dispatches it.

use std::time::Duration;

/// Catch-up cap per `advance` call (e.g. after the terminal was suspended).
pub const MAX_ADVANCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TickKind {
    Spawn,
    Motion,
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub kind: TickKind,
    pub epoch: Epoch,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    kind: TickKind,
    period: Duration,
    /// Time accumulated since this timer last fired.
    elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct Clock {
    timers: [Timer; 3],
    epoch: Epoch,
    running: bool,
}

impl Clock {
    pub fn new(spawn: Duration, motion: Duration, countdown: Duration) -> Self {
        debug_assert!(!spawn.is_zero() && !motion.is_zero() && !countdown.is_zero());
        let timer = |kind, period| Timer {
            kind,
            period,
            elapsed: Duration::ZERO,
        };
        Self {
            timers: [
                timer(TickKind::Spawn, spawn),
                timer(TickKind::Motion, motion),
                timer(TickKind::Countdown, countdown),
            ],
            epoch: Epoch(0),
            running: false,
        }
    }

    /// Begin a fresh schedule. Any tick from an earlier run becomes stale.
    pub fn start(&mut self) -> Epoch {
        self.epoch = Epoch(self.epoch.0 + 1);
        for t in &mut self.timers {
            t.elapsed = Duration::ZERO;
        }
        self.running = true;
        self.epoch
    }

    /// Halt all three sources. Ticks already handed out become stale.
    pub fn stop(&mut self) {
        if self.running {
            self.epoch = Epoch(self.epoch.0 + 1);
            self.running = false;
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// True if `tick` was produced under the current run.
    pub fn is_current(&self, tick: Tick) -> bool {
        self.running && tick.epoch == self.epoch
    }

    /// Advance time by `dt`, appending due ticks to `out` in due-time order.
    /// Ties go Spawn, Motion, Countdown.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Tick>) {
        if !self.running {
            return;
        }
        let dt = dt.min(MAX_ADVANCE);
        let start = out.len();
        // (due offset within dt, kind) pairs, sorted afterwards.
        let mut due: Vec<(Duration, TickKind)> = Vec::new();
        for t in &mut self.timers {
            let mut fired = Duration::ZERO;
            let mut remaining = t.elapsed + dt;
            while remaining >= t.period {
                remaining -= t.period;
                // How far into this `dt` the tick fell due.
                fired += t.period;
                let offset = fired.saturating_sub(t.elapsed);
                due.push((offset, t.kind));
            }
            t.elapsed = remaining;
        }
        due.sort();
        out.extend(due.into_iter().map(|(_, kind)| Tick {
            kind,
            epoch: self.epoch,
        }));
        debug_assert!(out[start..].iter().all(|t| t.epoch == self.epoch));
    }
}
