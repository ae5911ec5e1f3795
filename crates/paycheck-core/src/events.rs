//! Event system for UI and service decoupling.
//!
//! Lets a CLI, test harness, or supervisor watch the emulator without tight
//! coupling to the engine. The engine never calls an observer while holding
//! its state mutex.

use crate::protocol::frame::FramerError;
use crate::state::machine::PrintJobState;

/// Log level for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Events emitted by the emulator engine.
#[derive(Debug, Clone)]
pub enum PrinterEvent {
    /// Engine entered the running state.
    Started,
    /// Engine stopped; all timers cancelled.
    Stopped,
    /// A whole frame was reassembled from the inbound stream.
    FrameReceived { length: usize },
    /// Inbound bytes failed framing.
    ReceiveError { error: FramerError },
    /// A recognized frame failed command parsing, or the command itself is
    /// unknown. The host gets no NAK; flags are the only feedback channel.
    CommandError { message: String },
    /// A print job was accepted.
    PrintAccepted { template_id: char, copies: u16, field_count: usize },
    /// A print command was dropped by the acceptance guard.
    PrintRejected { template_id: char, state: PrintJobState },
    /// The print job moved to a new state.
    JobStateChanged { from: PrintJobState, to: PrintJobState },
    /// Paper entered (true) or left (false) the chute.
    PaperInChute { present: bool },
    /// An extended-status frame was handed to the transport.
    StatusEmitted { length: usize, on_demand: bool },
    /// The transport refused an outbound frame; it was dropped.
    TransportError { message: String },
    /// Log message.
    Log { level: LogLevel, message: String },
}

/// Observer trait for receiving emulator events.
///
/// Implement this in your UI or service layer to receive updates.
pub trait PrinterObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &PrinterEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl PrinterObserver for NullObserver {
    fn on_event(&self, _event: &PrinterEvent) {
        // Do nothing
    }
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl PrinterObserver for TracingObserver {
    fn on_event(&self, event: &PrinterEvent) {
        match event {
            PrinterEvent::Started => {
                tracing::info!("Emulator started");
            }
            PrinterEvent::Stopped => {
                tracing::info!("Emulator stopped");
            }
            PrinterEvent::FrameReceived { length } => {
                tracing::debug!(len = length, "Frame received");
            }
            PrinterEvent::ReceiveError { error } => {
                tracing::warn!(code = error.diagnostic_code(), "Receive error: {}", error);
            }
            PrinterEvent::CommandError { message } => {
                tracing::warn!("Command error: {}", message);
            }
            PrinterEvent::PrintAccepted { template_id, copies, field_count } => {
                tracing::info!(
                    template = %template_id,
                    copies = copies,
                    fields = field_count,
                    "Print job accepted"
                );
            }
            PrinterEvent::PrintRejected { template_id, state } => {
                tracing::warn!(template = %template_id, state = %state, "Print job rejected");
            }
            PrinterEvent::JobStateChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Job state changed");
            }
            PrinterEvent::PaperInChute { present } => {
                tracing::info!(present = present, "Paper in chute");
            }
            PrinterEvent::StatusEmitted { length, on_demand } => {
                tracing::trace!(len = length, on_demand = on_demand, "Status frame emitted");
            }
            PrinterEvent::TransportError { message } => {
                tracing::warn!("Transport error: {}", message);
            }
            PrinterEvent::Log { level, message } => match level {
                LogLevel::Trace => tracing::trace!("{}", message),
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }
}
