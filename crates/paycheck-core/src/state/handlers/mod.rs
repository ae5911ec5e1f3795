//! Command handlers - dispatch logic for each recognized TCL command.
//!
//! Handlers run while the engine mutex is held, so they never touch the
//! transport or an observer directly. Everything with a side effect outside
//! the engine state is recorded into [`Effects`] and flushed by the engine
//! once the lock is released.

mod control;
mod print;

use std::time::Duration;

use crate::config::EmulatorConfig;
use crate::events::PrinterEvent;
use crate::protocol::command::TclCommand;
use crate::state::machine::{EngineState, TimerToken};

pub use control::{handle_clear_flags, handle_status_request};
pub use print::handle_print;

/// Which callback a one-shot timer drives when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Next print-job transition.
    Job,
    /// Paper is about to show in the chute.
    ChuteSet,
    /// Paper is about to be taken from the chute.
    ChuteClear,
}

/// A one-shot timer to arm. The token was allocated under the engine mutex;
/// the timer is dead if the token is no longer pending when it fires.
#[derive(Debug, Clone, Copy)]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub token: TimerToken,
    pub delay: Duration,
}

/// Side effects collected under the engine mutex.
#[derive(Debug, Default)]
pub struct Effects {
    /// Whole frames to hand to the transport, in order.
    pub outbound: Vec<Vec<u8>>,
    /// Observer events, in order.
    pub events: Vec<PrinterEvent>,
    /// One-shot timers to arm.
    pub timers: Vec<TimerRequest>,
}

/// Handler context containing the locked engine state.
pub struct HandlerContext<'a> {
    pub state: &'a mut EngineState,
    pub config: &'a EmulatorConfig,
    pub effects: &'a mut Effects,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn emit(&mut self, event: PrinterEvent) {
        self.effects.events.push(event);
    }
}

/// Dispatch one parsed command to its handler.
pub fn handle_command(command: TclCommand, ctx: &mut HandlerContext<'_>) {
    match command {
        // The plain and extended requests answer with the same frame; the
        // short form is kept for hosts that still poll with `^S|^`.
        TclCommand::StatusRequest | TclCommand::ExtendedStatusRequest => {
            handle_status_request(ctx);
        }
        TclCommand::ClearErrorFlags => handle_clear_flags(ctx),
        TclCommand::Print(print) => handle_print(print, ctx),
    }
}
