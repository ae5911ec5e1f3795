//! Status vector and extended-status frame encoding.
//!
//! The printer exposes five flag bytes that the host reads raw out of the
//! extended-status frame. Bit 6 of each byte (the unmask bit) is always set,
//! which keeps a fully-clear byte from appearing on the wire as 0x00.

use crate::protocol::constants::{
    FIELD_SEPARATOR, NO_TEMPLATE_ID, STATUS_DELIMITER, UNMASK, flags1, flags3, flags5,
};

/// The shared status flag register.
///
/// Copied wholesale under the engine mutex when a status frame is built, so
/// a frame can never mix bytes from two different instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusVector {
    pub flags1: u8,
    pub flags2: u8,
    pub flags3: u8,
    pub flags4: u8,
    pub flags5: u8,
    /// Template of the most recently completed job; space until then.
    pub last_template_id: char,
    /// Template character advertised in status frames. Catches up with
    /// `last_template_id` when a job leaves the busy phase.
    pub report_template_id: char,
}

impl StatusVector {
    /// Power-up state: every byte carries only its unmask bit, except
    /// `flags5` which additionally reports ValidationDone and ResetPowerUp.
    /// Top-of-form is not claimed until the first complete print cycle.
    pub fn power_up() -> Self {
        Self {
            flags1: UNMASK,
            flags2: UNMASK,
            flags3: UNMASK,
            flags4: UNMASK,
            flags5: UNMASK | flags5::VALIDATION_DONE | flags5::RESET_POWER_UP,
            last_template_id: NO_TEMPLATE_ID,
            report_template_id: NO_TEMPLATE_ID,
        }
    }

    pub fn set_busy(&mut self, busy: bool) {
        if busy {
            self.flags1 |= flags1::BUSY;
        } else {
            self.flags1 &= !flags1::BUSY;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.flags1 & flags1::BUSY != 0
    }

    pub fn set_validation_done(&mut self, done: bool) {
        if done {
            self.flags5 |= flags5::VALIDATION_DONE;
        } else {
            self.flags5 &= !flags5::VALIDATION_DONE;
        }
    }

    pub fn set_at_top_of_form(&mut self, at_tof: bool) {
        if at_tof {
            self.flags5 |= flags5::AT_TOP_OF_FORM;
        } else {
            self.flags5 &= !flags5::AT_TOP_OF_FORM;
        }
    }

    pub fn is_at_top_of_form(&self) -> bool {
        self.flags5 & flags5::AT_TOP_OF_FORM != 0
    }

    /// Owned exclusively by the paper-in-chute oscillator.
    pub fn set_paper_in_chute(&mut self, present: bool) {
        if present {
            self.flags3 |= flags3::PAPER_IN_CHUTE;
        } else {
            self.flags3 &= !flags3::PAPER_IN_CHUTE;
        }
    }

    pub fn paper_in_chute(&self) -> bool {
        self.flags3 & flags3::PAPER_IN_CHUTE != 0
    }

    /// Record a completed job and advance the advertised template.
    pub fn publish_completed_template(&mut self, template_id: char) {
        self.last_template_id = template_id;
        self.report_template_id = template_id;
    }

    /// Encode the extended-status frame:
    ///
    /// ```text
    /// *S|<addr>|<version>|<flags1>|<flags2>|<flags3>|<flags4>|<flags5>|P<tid>|*
    /// ```
    ///
    /// Address and version are literal ASCII; the five flag bytes are raw.
    pub fn to_status_frame(&self, unit_address: u8, software_version: &str) -> Vec<u8> {
        let mut frame = Vec::with_capacity(24 + software_version.len());
        frame.push(STATUS_DELIMITER);
        frame.push(b'S');
        frame.push(FIELD_SEPARATOR);
        frame.extend_from_slice(unit_address.to_string().as_bytes());
        frame.push(FIELD_SEPARATOR);
        frame.extend_from_slice(software_version.as_bytes());
        frame.push(FIELD_SEPARATOR);
        for flags in [self.flags1, self.flags2, self.flags3, self.flags4, self.flags5] {
            frame.push(flags);
            frame.push(FIELD_SEPARATOR);
        }
        frame.push(b'P');
        frame.push(self.report_template_id as u8);
        frame.push(FIELD_SEPARATOR);
        frame.push(STATUS_DELIMITER);
        frame
    }
}

impl Default for StatusVector {
    fn default() -> Self {
        Self::power_up()
    }
}
