//! The TCL wire protocol: constants, framing, commands, and status encoding.

pub mod command;
pub mod constants;
pub mod frame;
pub mod status;

pub use command::{CommandError, PrintCommand, TclCommand, parse_frame};
pub use frame::{FrameReassembler, FramerError, FramerEvent};
pub use status::StatusVector;
