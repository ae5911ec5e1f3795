//! Mock transport for testing.

use std::sync::{Arc, Mutex};

use super::traits::{TransportError, TransportSink};

/// Mock transport for unit testing the engine without a device.
pub struct MockTransport {
    /// Captured outbound frames.
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Whether the device is "connected".
    connected: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Get all captured outbound frames.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Clear captured frames.
    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Simulate device disconnect.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    /// Simulate device reconnect.
    pub fn reconnect(&self) {
        *self.connected.lock().unwrap() = true;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportSink for MockTransport {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        if !*self.connected.lock().unwrap() {
            return Err(TransportError::Disconnected);
        }
        self.sent.lock().unwrap().push(frame.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_send_capture() {
        let mock = MockTransport::new();
        mock.send(b"*S|...|*").unwrap();
        mock.send(b"second").unwrap();

        let sent = mock.sent_frames();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], b"*S|...|*");
        assert_eq!(sent[1], b"second");

        mock.clear_sent();
        assert!(mock.sent_frames().is_empty());
    }

    #[test]
    fn test_mock_disconnect() {
        let mock = MockTransport::new();
        assert!(mock.send(b"ok").is_ok());

        mock.disconnect();
        assert!(mock.send(b"dropped").is_err());
        assert_eq!(mock.sent_frames().len(), 1);

        mock.reconnect();
        assert!(mock.send(b"back").is_ok());
    }
}
