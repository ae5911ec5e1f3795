//! Control handlers (status requests, error-flag clearing).

use crate::events::{LogLevel, PrinterEvent};

use super::HandlerContext;

/// `^S|^` / `^Se|^` - answer with one extended-status frame.
///
/// The flag bytes and template character come from the state already locked
/// by the caller, so the frame is a consistent snapshot by construction.
pub fn handle_status_request(ctx: &mut HandlerContext<'_>) {
    let frame = ctx
        .state
        .status
        .to_status_frame(ctx.config.unit_address, &ctx.config.software_version);
    ctx.emit(PrinterEvent::StatusEmitted {
        length: frame.len(),
        on_demand: true,
    });
    ctx.effects.outbound.push(frame);
}

/// `^C|^` - clear software error flags.
///
/// None of the error bits are ever raised by the emulator, so there is
/// nothing to clear yet; the hook stays so the dispatch table matches the
/// real firmware's command set.
pub fn handle_clear_flags(ctx: &mut HandlerContext<'_>) {
    ctx.emit(PrinterEvent::Log {
        level: LogLevel::Info,
        message: "Clear error flags requested; no error bits set".to_string(),
    });
}
