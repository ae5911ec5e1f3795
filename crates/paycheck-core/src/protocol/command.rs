//! TCL command classification and print-command parsing.
//!
//! Works on whole frames only; the reassembler guarantees the opening and
//! closing delimiters are present before anything lands here.

use thiserror::Error;

use crate::protocol::constants::{
    CMD_CLEAR_FLAGS, CMD_PRINT, CMD_STATUS, CMD_STATUS_EXTENDED, FIELD_SEPARATOR, FRAME_DELIMITER,
    MAX_PRINT_COPIES,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized command frame")]
    Unrecognized,
    #[error("print command carries fewer fields than template id + copies")]
    MissingPrintFields,
    #[error("template id must be a single character, got {0:?}")]
    BadTemplateId(String),
    #[error("copy count {0:?} is not a decimal integer in 1..=9999")]
    BadCopyCount(String),
    #[error("frame payload is not valid text")]
    NotText,
}

/// A parsed print request. Fields are carried in order but never rendered;
/// the emulator only mimics the timing of the job they would produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintCommand {
    pub template_id: char,
    pub copies: u16,
    pub fields: Vec<String>,
}

impl PrintCommand {
    /// Re-encode as the wire frame `^P|T|N|F1|...|Fk|^`.
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.push(FRAME_DELIMITER);
        frame.push(CMD_PRINT);
        frame.push(FIELD_SEPARATOR);
        frame.push(self.template_id as u8);
        frame.push(FIELD_SEPARATOR);
        frame.extend_from_slice(self.copies.to_string().as_bytes());
        for field in &self.fields {
            frame.push(FIELD_SEPARATOR);
            frame.extend_from_slice(field.as_bytes());
        }
        frame.push(FIELD_SEPARATOR);
        frame.push(FRAME_DELIMITER);
        frame
    }
}

/// One recognized host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TclCommand {
    /// `^S|^`
    StatusRequest,
    /// `^Se|^`
    ExtendedStatusRequest,
    /// `^C|^`
    ClearErrorFlags,
    /// `^P|T|N|F1|...|Fk|^`
    Print(PrintCommand),
}

/// Classify a whole frame (delimiters included) into a command.
pub fn parse_frame(frame: &[u8]) -> Result<TclCommand, CommandError> {
    match frame {
        [FRAME_DELIMITER, CMD_STATUS, FIELD_SEPARATOR, FRAME_DELIMITER] => {
            Ok(TclCommand::StatusRequest)
        }
        [
            FRAME_DELIMITER,
            CMD_STATUS,
            CMD_STATUS_EXTENDED,
            FIELD_SEPARATOR,
            FRAME_DELIMITER,
        ] => Ok(TclCommand::ExtendedStatusRequest),
        [FRAME_DELIMITER, CMD_CLEAR_FLAGS, FIELD_SEPARATOR, FRAME_DELIMITER] => {
            Ok(TclCommand::ClearErrorFlags)
        }
        [FRAME_DELIMITER, CMD_PRINT, FIELD_SEPARATOR, rest @ ..]
            if rest.len() >= 2 && rest[rest.len() - 2] == FIELD_SEPARATOR =>
        {
            parse_print(&rest[..rest.len() - 2]).map(TclCommand::Print)
        }
        _ => Err(CommandError::Unrecognized),
    }
}

/// Parse the payload between `^P|` and `|^`.
fn parse_print(payload: &[u8]) -> Result<PrintCommand, CommandError> {
    let text = std::str::from_utf8(payload).map_err(|_| CommandError::NotText)?;
    let mut parts = text.split(FIELD_SEPARATOR as char);

    let template = parts.next().unwrap_or_default();
    let copies = parts.next().ok_or(CommandError::MissingPrintFields)?;

    let mut template_chars = template.chars();
    let template_id = match (template_chars.next(), template_chars.next()) {
        (Some(c), None) => c,
        _ => return Err(CommandError::BadTemplateId(template.to_string())),
    };

    let copies = copies
        .parse::<u16>()
        .ok()
        .filter(|&n| (1..=MAX_PRINT_COPIES).contains(&n))
        .ok_or_else(|| CommandError::BadCopyCount(copies.to_string()))?;

    Ok(PrintCommand {
        template_id,
        copies,
        fields: parts.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_request() {
        assert_eq!(parse_frame(b"^S|^"), Ok(TclCommand::StatusRequest));
    }

    #[test]
    fn test_extended_status_request() {
        assert_eq!(parse_frame(b"^Se|^"), Ok(TclCommand::ExtendedStatusRequest));
    }

    #[test]
    fn test_clear_error_flags() {
        assert_eq!(parse_frame(b"^C|^"), Ok(TclCommand::ClearErrorFlags));
    }

    #[test]
    fn test_print_with_fields() {
        let cmd = parse_frame(b"^P|0|1|A|B|C|^").unwrap();
        assert_eq!(
            cmd,
            TclCommand::Print(PrintCommand {
                template_id: '0',
                copies: 1,
                fields: vec!["A".into(), "B".into(), "C".into()],
            })
        );
    }

    #[test]
    fn test_print_without_fields() {
        let cmd = parse_frame(b"^P|X|3|^").unwrap();
        assert_eq!(
            cmd,
            TclCommand::Print(PrintCommand {
                template_id: 'X',
                copies: 3,
                fields: vec![],
            })
        );
    }

    #[test]
    fn test_print_preserves_empty_fields() {
        let cmd = parse_frame(b"^P|T|2|first||third|^").unwrap();
        match cmd {
            TclCommand::Print(p) => {
                assert_eq!(p.fields, vec!["first".to_string(), String::new(), "third".into()])
            }
            other => panic!("expected print, got {other:?}"),
        }
    }

    #[test]
    fn test_copy_count_bounds() {
        assert!(parse_frame(b"^P|T|1|^").is_ok());
        assert!(parse_frame(b"^P|T|9999|^").is_ok());
        assert_eq!(
            parse_frame(b"^P|T|0|^"),
            Err(CommandError::BadCopyCount("0".into()))
        );
        assert_eq!(
            parse_frame(b"^P|T|10000|^"),
            Err(CommandError::BadCopyCount("10000".into()))
        );
        assert_eq!(
            parse_frame(b"^P|T|abc|^"),
            Err(CommandError::BadCopyCount("abc".into()))
        );
    }

    #[test]
    fn test_template_id_must_be_one_char() {
        assert_eq!(
            parse_frame(b"^P|AB|1|^"),
            Err(CommandError::BadTemplateId("AB".into()))
        );
        assert_eq!(
            parse_frame(b"^P||1|^"),
            Err(CommandError::BadTemplateId(String::new()))
        );
    }

    #[test]
    fn test_print_requires_copies_field() {
        assert_eq!(parse_frame(b"^P|T|^"), Err(CommandError::MissingPrintFields));
    }

    #[test]
    fn test_unrecognized_frames() {
        assert_eq!(parse_frame(b"^Q|^"), Err(CommandError::Unrecognized));
        assert_eq!(parse_frame(b"^C|j|^"), Err(CommandError::Unrecognized));
        assert_eq!(parse_frame(b"^SS|^"), Err(CommandError::Unrecognized));
    }

    #[test]
    fn test_print_round_trip() {
        let wire = b"^P|0|1|A|B|C|^";
        match parse_frame(wire).unwrap() {
            TclCommand::Print(cmd) => assert_eq!(cmd.to_frame(), wire),
            other => panic!("expected print, got {other:?}"),
        }
    }
}
