//! Protocol constants for the PayCheck 4 "TCL" command language.
//!
//! Derived from the Nanoptix TCL command reference and captured host traffic.

// ============================================================================
// Frame Delimiters
// ============================================================================

/// Opening/closing delimiter of inbound (host -> printer) frames.
pub const FRAME_DELIMITER: u8 = b'^';

/// Opening/closing delimiter of outbound (printer -> host) frames.
pub const STATUS_DELIMITER: u8 = b'*';

/// Field separator inside a frame.
pub const FIELD_SEPARATOR: u8 = b'|';

// ============================================================================
// Command Identifiers (second byte of an inbound frame)
// ============================================================================

/// Status request (`^S|^`) and extended status request (`^Se|^`).
pub const CMD_STATUS: u8 = b'S';

/// Extended status qualifier (`^Se|^`).
pub const CMD_STATUS_EXTENDED: u8 = b'e';

/// Clear software error flags (`^C|^`).
pub const CMD_CLEAR_FLAGS: u8 = b'C';

/// Print template (`^P|T|N|F1|...|Fk|^`).
pub const CMD_PRINT: u8 = b'P';

// ============================================================================
// Size Constants
// ============================================================================

/// Shortest valid frame, `^S|^`.
pub const MIN_MESSAGE_SIZE: usize = 4;

/// Cap on the reassembly buffer.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Largest accepted copy count in a print command.
pub const MAX_PRINT_COPIES: u16 = 9999;

// ============================================================================
// Status Flag Bits
//
// Bit positions are read raw by the host and must not move. Bit 6 of every
// flag byte is the "unmask" bit: it is always set so a flag byte can never
// appear on the wire as 0x00.
// ============================================================================

/// Always-set high bit shared by all five flag bytes.
pub const UNMASK: u8 = 1 << 6;

/// Bits of `flags1`.
pub mod flags1 {
    pub const VOLTAGE_ERROR: u8 = 1 << 0;
    pub const HEAD_ERROR: u8 = 1 << 1;
    pub const PAPER_OUT: u8 = 1 << 2;
    pub const PLATEN_UP: u8 = 1 << 3;
    pub const SYSTEM_ERROR: u8 = 1 << 4;
    pub const BUSY: u8 = 1 << 5;
}

/// Bits of `flags2`.
pub mod flags2 {
    pub const JOB_MEMORY_OVERFLOW: u8 = 1 << 0;
    pub const BUFFER_OVERFLOW: u8 = 1 << 1;
    pub const LIBRARY_LOAD_ERROR: u8 = 1 << 2;
    pub const PRINT_REGION_DATA_ERROR: u8 = 1 << 3;
    pub const LIBRARY_REF_ERROR: u8 = 1 << 4;
    pub const TEMPERATURE_ERROR: u8 = 1 << 5;
}

/// Bits of `flags3`.
pub mod flags3 {
    pub const MISSING_SUPPLY_INDEX: u8 = 1 << 0;
    pub const PRINTER_OFFLINE: u8 = 1 << 1;
    pub const FLASH_PROGRAM_ERROR: u8 = 1 << 2;
    pub const PAPER_IN_CHUTE: u8 = 1 << 3;
    pub const PRINT_LIBRARIES_CORRUPT: u8 = 1 << 4;
    pub const COMMAND_ERROR: u8 = 1 << 5;
}

/// Bits of `flags4`. The vendor documentation also names bit 6 `Reserved`;
/// on the wire it behaves as the unmask bit and is always 1.
pub mod flags4 {
    pub const PAPER_LOW: u8 = 1 << 0;
    pub const PAPER_JAM: u8 = 1 << 5;
    pub const JOURNAL_PRINT_MODE: u8 = 1 << 7;
}

/// Bits of `flags5`.
pub mod flags5 {
    pub const RESET_POWER_UP: u8 = 1 << 0;
    pub const BARCODE_DATA_IS_ACCESSED: u8 = 1 << 1;
    pub const PRINTER_OPEN: u8 = 1 << 2;
    pub const XED_OFF: u8 = 1 << 3;
    pub const AT_TOP_OF_FORM: u8 = 1 << 4;
    pub const VALIDATION_DONE: u8 = 1 << 5;
}

// ============================================================================
// Timing Defaults (milliseconds)
// ============================================================================

/// Period of unsolicited status frames.
pub const DEFAULT_STATUS_REPORTING_INTERVAL_MS: u64 = 2000;

/// Print acceptance to Busy.
pub const DEFAULT_PRINT_START_DELAY_MS: u64 = 3000;

/// Busy to ValidationDone.
pub const DEFAULT_VALIDATION_DELAY_MS: u64 = 18_000;

/// ValidationDone to end of Busy.
pub const DEFAULT_BUSY_STATE_CHANGE_DELAY_MS: u64 = 20_000;

/// End of Busy to top-of-form.
pub const DEFAULT_TOF_STATE_CHANGE_DELAY_MS: u64 = 4000;

/// ValidationDone to paper entering the chute.
pub const DEFAULT_PAPER_IN_CHUTE_SET_DELAY_MS: u64 = 2000;

/// Paper-in-chute hold time before the ticket is considered taken.
pub const DEFAULT_PAPER_IN_CHUTE_CLEAR_DELAY_MS: u64 = 10_000;

/// Inter-segment reassembly timeout. The vendor firmware comments say 10 ms
/// for release builds but ships 20 ms; we default to the shipped value.
pub const DEFAULT_REASSEMBLY_TIMEOUT_MS: u64 = 20;

// ============================================================================
// Identity Defaults
// ============================================================================

/// Unit address on the (legacy) multi-drop bus, emitted as ASCII decimal.
pub const DEFAULT_UNIT_ADDRESS: u8 = 0;

/// Firmware version string advertised in status frames.
pub const DEFAULT_SOFTWARE_VERSION: &str = "PAY-6.22B";

/// Template id reported before the first job ever completes.
pub const NO_TEMPLATE_ID: char = ' ';
