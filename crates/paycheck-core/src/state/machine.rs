//! Print-job state machine and the engine's shared runtime state.

use std::fmt;
use std::time::Duration;

use crate::config::EmulatorConfig;
use crate::protocol::constants::NO_TEMPLATE_ID;
use crate::protocol::frame::FrameReassembler;
use crate::protocol::status::StatusVector;

/// Lifecycle of a print job.
///
/// A job walks `IdleTof -> BusyNotTof -> BusyValDone -> IdleNotTof -> IdleTof`
/// on one-shot timers; each transition edits the status vector the host polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintJobState {
    /// Idle at top of form; the only state that accepts a print command.
    IdleTof,
    /// Printing, validation number not yet laid down.
    BusyNotTof,
    /// Printing, validation number done.
    BusyValDone,
    /// Ticket finished, paper not yet back at top of form.
    IdleNotTof,
}

impl Default for PrintJobState {
    fn default() -> Self {
        Self::IdleTof
    }
}

impl fmt::Display for PrintJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintJobState::IdleTof => write!(f, "IDLE_TOF"),
            PrintJobState::BusyNotTof => write!(f, "BUSY_NOT_TOF"),
            PrintJobState::BusyValDone => write!(f, "BUSY_VAL_DONE"),
            PrintJobState::IdleNotTof => write!(f, "IDLE_NOT_TOF"),
        }
    }
}

impl PrintJobState {
    pub fn is_busy(&self) -> bool {
        matches!(self, PrintJobState::BusyNotTof | PrintJobState::BusyValDone)
    }
}

/// Identifies one armed one-shot timer.
///
/// A timer thread only acts if its token is still the pending one when it
/// wakes, so re-arming or `stop()` cancels it without joining the thread.
pub type TimerToken = u64;

/// All mutable engine state, guarded by the engine's single mutex.
#[derive(Debug)]
pub struct EngineState {
    /// Cleared by `stop()`; timers that fire afterwards must no-op.
    pub running: bool,
    /// The status flag register the host polls.
    pub status: StatusVector,
    /// Inbound frame reassembly.
    pub framer: FrameReassembler,
    /// Current print-job state.
    pub job: PrintJobState,
    /// Template of the in-flight job, captured at command acceptance.
    pub last_print_template_id: char,
    /// Pending print-job transition timer, if any.
    pub job_timer: Option<TimerToken>,
    /// Pending paper-in-chute timer, if any.
    pub chute_timer: Option<TimerToken>,
    next_timer_token: TimerToken,
}

impl EngineState {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            running: false,
            status: StatusVector::power_up(),
            framer: FrameReassembler::new(
                Duration::from_millis(config.reassembly_timeout_ms),
                config.min_message_size,
                config.max_message_size,
            ),
            job: PrintJobState::IdleTof,
            last_print_template_id: NO_TEMPLATE_ID,
            job_timer: None,
            chute_timer: None,
            next_timer_token: 0,
        }
    }

    /// Transition the print job to a new state.
    pub fn goto_state(&mut self, new_state: PrintJobState) {
        tracing::debug!(from = %self.job, to = %new_state, "Print job transition");
        self.job = new_state;
    }

    /// Allocate a token and mark it as the pending print-job timer,
    /// invalidating whatever was armed before.
    pub fn arm_job_timer(&mut self) -> TimerToken {
        let token = self.next_token();
        self.job_timer = Some(token);
        token
    }

    /// Allocate a token and mark it as the pending chute timer.
    pub fn arm_chute_timer(&mut self) -> TimerToken {
        let token = self.next_token();
        self.chute_timer = Some(token);
        token
    }

    /// True if `token` is still the pending print-job timer; consumes it.
    pub fn take_job_timer(&mut self, token: TimerToken) -> bool {
        if self.job_timer == Some(token) {
            self.job_timer = None;
            true
        } else {
            false
        }
    }

    /// True if `token` is still the pending chute timer; consumes it.
    pub fn take_chute_timer(&mut self, token: TimerToken) -> bool {
        if self.chute_timer == Some(token) {
            self.chute_timer = None;
            true
        } else {
            false
        }
    }

    /// Invalidate every pending one-shot timer.
    pub fn cancel_timers(&mut self) {
        self.job_timer = None;
        self.chute_timer = None;
    }

    fn next_token(&mut self) -> TimerToken {
        self.next_timer_token += 1;
        self.next_timer_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = EngineState::new(&EmulatorConfig::default());
        assert_eq!(state.job, PrintJobState::IdleTof);
        assert!(state.job_timer.is_none());
        assert!(state.chute_timer.is_none());
        assert!(!state.status.is_at_top_of_form());
    }

    #[test]
    fn test_timer_tokens_cancel_on_rearm() {
        let mut state = EngineState::new(&EmulatorConfig::default());
        let stale = state.arm_job_timer();
        let fresh = state.arm_job_timer();
        assert!(!state.take_job_timer(stale));
        assert!(state.take_job_timer(fresh));
        assert!(state.job_timer.is_none());
    }

    #[test]
    fn test_job_and_chute_timers_are_independent() {
        let mut state = EngineState::new(&EmulatorConfig::default());
        let job = state.arm_job_timer();
        let chute = state.arm_chute_timer();
        assert!(state.take_job_timer(job));
        assert!(state.take_chute_timer(chute));
    }
}
