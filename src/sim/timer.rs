//! Countdown and blink primitives
//!
//! All deferred behavior in the sim is a tick-counted record owned by
//! whoever scheduled it, advanced once per frame by the host loop.
//! Cancellation is a plain reset, so a timer can never fire for a session
//! that was torn down.

use serde::{Deserialize, Serialize};

/// One-shot frame countdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Arm the countdown. `ticks` of zero expires on the next tick.
    pub fn start(&mut self, ticks: u32) {
        self.remaining = ticks;
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        !self.running
    }

    /// Advance one tick. Returns true exactly once: on the expiry tick.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            true
        } else {
            false
        }
    }
}

/// Cyclic on/off toggle that runs for a fixed number of ticks, flipping at
/// a fixed interval, then auto-stops (off)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blinker {
    ticks_left: u32,
    interval: u32,
    phase: u32,
    on: bool,
}

impl Blinker {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Start blinking: `total` ticks of lifetime, toggling every `interval`
    pub fn start(&mut self, total: u32, interval: u32) {
        self.ticks_left = total;
        self.interval = interval.max(1);
        self.phase = 0;
        self.on = true;
    }

    pub fn stop(&mut self) {
        self.ticks_left = 0;
        self.on = false;
    }

    pub fn is_active(&self) -> bool {
        self.ticks_left > 0
    }

    /// Highlight state for the host to render
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Advance one tick
    pub fn tick(&mut self) {
        if self.ticks_left == 0 {
            return;
        }
        self.ticks_left -= 1;
        self.phase += 1;
        if self.phase >= self.interval {
            self.phase = 0;
            self.on = !self.on;
        }
        if self.ticks_left == 0 {
            self.on = false;
        }
    }
}
