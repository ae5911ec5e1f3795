//! PayCheck-Core: Nanoptix PayCheck 4 printer emulation in Rust.
//!
//! This crate implements the printer's TCL command language closely enough
//! that an EGM host polling it over a USB CDC-ACM link cannot tell the
//! emulator from the real device: wire format, print-cycle timing, and
//! status-flag semantics included.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: Frame reassembly, command parsing, status-flag encoding
//! - **State**: Print-job state machine and command handlers
//! - **Engine**: Timers, periodic status broadcasting, lifecycle
//! - **Transport**: Serial device abstraction (serialport, mock)
//! - **Events**: Observer pattern for UI decoupling
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paycheck_core::{EmulatorConfig, PrinterEngine, SerialTransport};
//!
//! let config = EmulatorConfig::default();
//! let transport = Arc::new(SerialTransport::open("/dev/ttyGS0", 115_200).unwrap());
//! let engine = PrinterEngine::new(config, transport.clone());
//!
//! engine.start();
//! transport.pump(&engine).unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod events;
pub mod protocol;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use config::EmulatorConfig;
pub use engine::PrinterEngine;
pub use events::{LogLevel, NullObserver, PrinterEvent, PrinterObserver, TracingObserver};
pub use protocol::{
    CommandError, FrameReassembler, FramerError, PrintCommand, StatusVector, TclCommand,
};
pub use state::PrintJobState;
pub use transport::{MockTransport, SerialTransport, TransportError, TransportSink};
