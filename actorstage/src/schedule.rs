//! Frame scheduling state.
//!
//! The stage does not own a timer; the host calls `tick` at its own cadence.
//! This clock only answers whether a tick should do work, and distinguishes
//! a deliberate stop from a halt forced by context loss so restoration knows
//! whether to resume.

#[derive(Debug, Default)]
pub struct FrameClock {
    running: bool,
    halted_by_loss: bool,
    now: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent. Starting clears a loss halt.
    pub fn start(&mut self) {
        self.running = true;
        self.halted_by_loss = false;
    }

    /// Idempotent. A deliberate stop also cancels any pending loss resume.
    pub fn stop(&mut self) {
        self.running = false;
        self.halted_by_loss = false;
    }

    /// Context loss while running. Remembered so `resume_after_restore` can
    /// pick the loop back up; a clock that was already stopped stays stopped.
    pub fn halt_for_loss(&mut self) {
        if self.running {
            self.running = false;
            self.halted_by_loss = true;
        }
    }

    pub fn resume_after_restore(&mut self) {
        if self.halted_by_loss {
            self.running = true;
            self.halted_by_loss = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn advance(&mut self, delta: f64) {
        self.now += delta;
    }

    pub fn now(&self) -> f64 {
        self.now
    }
}
