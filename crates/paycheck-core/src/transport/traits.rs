//! Transport layer abstraction.
//!
//! The engine does not own the serial device. It holds only an outbound
//! sink; the transport pushes inbound chunks into the engine by calling
//! `PrinterEngine::deliver`, so there is no back-pointer from engine to
//! transport.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open device {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound sink the engine emits whole status frames into.
///
/// This trait enables:
/// - Production implementation over a CDC-ACM device node
/// - Mock implementation for unit testing
/// - In-memory pipes for integration tests
pub trait TransportSink: Send + Sync {
    /// Write one complete frame downstream.
    ///
    /// A failure drops the frame: the engine never retries, since the next
    /// periodic tick supersedes stale status anyway.
    fn send(&self, frame: &[u8]) -> Result<(), TransportError>;
}
