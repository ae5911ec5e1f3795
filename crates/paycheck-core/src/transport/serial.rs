//! Serial transport over the USB CDC-ACM device node.
//!
//! On the gadget side of the link the CDC-ACM endpoint shows up as a tty
//! (typically `/dev/ttyGS0`), so plain serial I/O is all the device needs.
//! The baud rate is nominal for a gadget tty but `serialport` requires one.

use std::io::{Read, Write};
use std::sync::Mutex;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, warn};

use super::traits::{TransportError, TransportSink};
use crate::engine::PrinterEngine;

/// How long a blocking read waits before checking the engine lifecycle.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Size of the inbound read buffer. Host writes are far smaller.
const READ_CHUNK: usize = 512;

pub struct SerialTransport {
    path: String,
    /// Writer handle, locked per outbound frame.
    port: Mutex<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the device node.
    pub fn open(path: &str, baud: u32) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        info!(path = %path, baud = baud, "Serial device opened");

        Ok(Self {
            path: path.to_string(),
            port: Mutex::new(port),
        })
    }

    /// Device node path this transport is bound to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Blocking read loop: delivers every inbound chunk to the engine until
    /// the engine stops or the device goes away.
    ///
    /// Chunks are handed over exactly as the tty returns them; the engine's
    /// reassembler owns all framing decisions.
    pub fn pump(&self, engine: &PrinterEngine) -> Result<(), TransportError> {
        let mut reader = self
            .port
            .lock()
            .unwrap()
            .try_clone()
            .map_err(|e| TransportError::ReadFailed(e.to_string()))?;

        let mut buf = [0u8; READ_CHUNK];
        while engine.is_running() {
            match reader.read(&mut buf) {
                Ok(0) => {
                    warn!(path = %self.path, "Serial device closed");
                    return Err(TransportError::Disconnected);
                }
                Ok(n) => {
                    debug!(len = n, "Inbound chunk");
                    engine.deliver(&buf[..n]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(path = %self.path, error = %e, "Serial read failed");
                    return Err(TransportError::Io(e));
                }
            }
        }

        Ok(())
    }
}

impl TransportSink for SerialTransport {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        let mut port = self.port.lock().unwrap();
        port.write_all(frame)
            .and_then(|_| port.flush())
            .map_err(|e| TransportError::WriteFailed(e.to_string()))
    }
}
