//! Print-job acceptance.

use crate::events::PrinterEvent;
use crate::protocol::command::PrintCommand;
use crate::state::machine::PrintJobState;

use super::{HandlerContext, TimerKind, TimerRequest};

/// `^P|T|N|...|^` - accept a print job, or drop it.
///
/// Acceptance needs both checks: the Busy flag only rises after the start
/// delay, so between acceptance and that first transition the job state is
/// still `IdleTof` and only the pending timer betrays the in-flight job.
/// There is no queueing; a command that loses the race is dropped.
pub fn handle_print(command: PrintCommand, ctx: &mut HandlerContext<'_>) {
    if ctx.state.job != PrintJobState::IdleTof || ctx.state.job_timer.is_some() {
        ctx.emit(PrinterEvent::PrintRejected {
            template_id: command.template_id,
            state: ctx.state.job,
        });
        return;
    }

    // A fresh job invalidates any chute oscillation left over from the
    // previous ticket; the new cycle re-arms it at validation time.
    ctx.state.chute_timer = None;

    ctx.state.last_print_template_id = command.template_id;
    let token = ctx.state.arm_job_timer();
    ctx.effects.timers.push(TimerRequest {
        kind: TimerKind::Job,
        token,
        delay: ctx.config.print_start_delay(),
    });

    ctx.emit(PrinterEvent::PrintAccepted {
        template_id: command.template_id,
        copies: command.copies,
        field_count: command.fields.len(),
    });
}
