//! Frame reassembly for the inbound byte stream.
//!
//! Hosts write TCL frames across a USB CDC-ACM endpoint in segments of
//! arbitrary size, so a frame may arrive split over several reads. The
//! reassembler buffers segments until the closing delimiter shows up, with a
//! strict inter-segment timeout drawing the line between "more of the same
//! frame" and "the previous frame never completed".

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::protocol::constants::FRAME_DELIMITER;

/// Recoverable receive-path errors. Every one of them clears the buffer and
/// returns the reassembler to `WaitingFirstSegment`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerError {
    #[error("frame shorter than the minimum message size")]
    Short,
    #[error("frame does not start with the opening delimiter")]
    MissingOpen,
    #[error("data found after the closing delimiter")]
    TrailingData,
    #[error("partial frame aged out before its next segment arrived")]
    ReassemblyTimeout,
    #[error("frame would exceed the maximum message size")]
    Overflow,
}

impl FramerError {
    /// Legacy diagnostic code, kept greppable against the vendor's docs.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            FramerError::Short => "RCV_SHORT_ERROR",
            FramerError::MissingOpen => "RCV_OPEN_ERROR",
            FramerError::TrailingData => "RCV_CLOSE_ERROR",
            FramerError::ReassemblyTimeout => "RCV_REASSEMBLY_TIMEOUT_ERROR",
            FramerError::Overflow => "RCV_OVERFLOW_ERROR",
        }
    }
}

/// Output of feeding a chunk of bytes to the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramerEvent {
    /// A whole `^...^` frame, delimiters included.
    Frame(Vec<u8>),
    /// A receive error; the stream keeps going.
    Error(FramerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReassemblyMode {
    /// No partial frame buffered.
    WaitingFirstSegment,
    /// A validated prefix is buffered, waiting for the closing delimiter.
    WaitingNextSegment,
}

/// Reassembles framed messages out of fragmented reads.
#[derive(Debug)]
pub struct FrameReassembler {
    buffer: Vec<u8>,
    mode: ReassemblyMode,
    reassembly_start: Option<Instant>,
    timeout: Duration,
    min_size: usize,
    max_size: usize,
}

impl FrameReassembler {
    pub fn new(timeout: Duration, min_size: usize, max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            mode: ReassemblyMode::WaitingFirstSegment,
            reassembly_start: None,
            timeout,
            min_size,
            max_size,
        }
    }

    /// Feed one inbound chunk, stamped with its arrival time.
    ///
    /// CR and LF bytes are dropped before any framing logic runs; some hosts
    /// terminate their writes with line endings even though the protocol is
    /// not line-oriented.
    pub fn push(&mut self, chunk: &[u8], now: Instant) -> Vec<FramerEvent> {
        let mut events = Vec::new();

        let filtered: Vec<u8> = chunk
            .iter()
            .copied()
            .filter(|&b| b != b'\r' && b != b'\n')
            .collect();
        if filtered.is_empty() {
            return events;
        }

        // A partial frame only survives while segments keep arriving within
        // the timeout; otherwise the new bytes are treated as a fresh frame.
        if self.mode == ReassemblyMode::WaitingNextSegment {
            let aged_out = self
                .reassembly_start
                .is_some_and(|start| now.duration_since(start) > self.timeout);
            if aged_out {
                events.push(FramerEvent::Error(FramerError::ReassemblyTimeout));
                self.reset();
            }
        }

        if self.buffer.len() + filtered.len() > self.max_size {
            events.push(FramerEvent::Error(FramerError::Overflow));
            self.reset();
            return events;
        }
        self.buffer.extend_from_slice(&filtered);

        match self.mode {
            ReassemblyMode::WaitingFirstSegment => {
                if self.buffer.len() < self.min_size {
                    events.push(FramerEvent::Error(FramerError::Short));
                    self.reset();
                } else if self.buffer[0] != FRAME_DELIMITER {
                    events.push(FramerEvent::Error(FramerError::MissingOpen));
                    self.reset();
                } else {
                    self.scan_for_close(now, &mut events);
                }
            }
            ReassemblyMode::WaitingNextSegment => {
                self.scan_for_close(now, &mut events);
            }
        }

        events
    }

    /// Look for the closing delimiter at index >= 1. Segmenting is allowed
    /// only before the closing delimiter: anything after it kills the frame.
    fn scan_for_close(&mut self, now: Instant, events: &mut Vec<FramerEvent>) {
        match self.buffer[1..].iter().position(|&b| b == FRAME_DELIMITER) {
            None => {
                self.mode = ReassemblyMode::WaitingNextSegment;
                self.reassembly_start = Some(now);
            }
            Some(pos) if pos + 1 == self.buffer.len() - 1 => {
                events.push(FramerEvent::Frame(std::mem::take(&mut self.buffer)));
                self.reset();
            }
            Some(_) => {
                events.push(FramerEvent::Error(FramerError::TrailingData));
                self.reset();
            }
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.mode = ReassemblyMode::WaitingFirstSegment;
        self.reassembly_start = None;
    }

    /// Bytes currently buffered. Never exceeds the configured maximum.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True while a partial frame is waiting for its next segment.
    pub fn is_mid_frame(&self) -> bool {
        self.mode == ReassemblyMode::WaitingNextSegment
    }
}
