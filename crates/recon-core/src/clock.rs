//! Step clock for the simulator.
//!
//! Counts committed steps since the last reset. All arithmetic is checked;
//! the counter never wraps silently.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Step counter would overflow.
    #[error("step counter overflow: cannot advance beyond u64::MAX")]
    StepOverflow,
}

/// Number of steps committed since the start of the episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepClock {
    /// Committed steps (0 before the first step).
    step: u64,
}

impl StepClock {
    /// Create a clock at step 0.
    pub const fn new() -> Self {
        Self { step: 0 }
    }

    /// Create a clock at an explicit step (useful for tests and restores).
    pub const fn from_step(step: u64) -> Self {
        Self { step }
    }

    /// Return the number of committed steps.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Return the step number the next call to [`StepClock::advance`] will
    /// produce, without advancing.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::StepOverflow`] at `u64::MAX`.
    pub const fn peek_next(&self) -> Result<u64, ClockError> {
        match self.step.checked_add(1) {
            Some(next) => Ok(next),
            None => Err(ClockError::StepOverflow),
        }
    }

    /// Advance by one step. Returns the new step count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::StepOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.step = self.peek_next()?;
        Ok(self.step)
    }

    /// Return to step 0.
    pub const fn reset(&mut self) {
        self.step = 0;
    }
}
