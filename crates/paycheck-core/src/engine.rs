//! The emulation engine: lifecycle, timers, inbound dispatch, and the
//! periodic status broadcaster.
//!
//! All mutable state lives behind one mutex. Timer threads and the inbound
//! path take the lock, mutate, and record side effects; frames and observer
//! events are flushed only after the lock is released, so the mutex is never
//! held across a transport write or a log call.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::EmulatorConfig;
use crate::events::{PrinterEvent, PrinterObserver, TracingObserver};
use crate::protocol::command::parse_frame;
use crate::protocol::frame::FramerEvent;
use crate::protocol::status::StatusVector;
use crate::state::handlers::{Effects, HandlerContext, TimerKind, TimerRequest, handle_command};
use crate::state::machine::{EngineState, PrintJobState};
use crate::transport::TransportSink;

struct EngineShared {
    config: EmulatorConfig,
    sink: Arc<dyn TransportSink>,
    observer: Arc<dyn PrinterObserver>,
    state: Mutex<EngineState>,
    /// Wakes the broadcaster early when the engine stops.
    wakeup: Condvar,
    status_thread: Mutex<Option<JoinHandle<()>>>,
}

/// The printer emulation engine.
///
/// Cheap to clone; clones share the same state. The transport calls
/// [`deliver`](Self::deliver) with inbound chunks and receives outbound
/// frames through the sink handed in at construction.
#[derive(Clone)]
pub struct PrinterEngine {
    shared: Arc<EngineShared>,
}

impl PrinterEngine {
    /// Create an engine that logs events through tracing.
    pub fn new(config: EmulatorConfig, sink: Arc<dyn TransportSink>) -> Self {
        Self::with_observer(config, sink, Arc::new(TracingObserver))
    }

    /// Create an engine with a custom observer.
    pub fn with_observer(
        config: EmulatorConfig,
        sink: Arc<dyn TransportSink>,
        observer: Arc<dyn PrinterObserver>,
    ) -> Self {
        let state = EngineState::new(&config);
        Self {
            shared: Arc::new(EngineShared {
                config,
                sink,
                observer,
                state: Mutex::new(state),
                wakeup: Condvar::new(),
                status_thread: Mutex::new(None),
            }),
        }
    }

    /// Enter the running state and begin periodic status broadcasts.
    ///
    /// The first frame goes out immediately; the host learns the power-up
    /// flags without having to ask.
    pub fn start(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.running {
                return;
            }
            state.running = true;
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::spawn(move || status_loop(shared));
        *self.shared.status_thread.lock().unwrap() = Some(handle);

        self.shared.observer.on_event(&PrinterEvent::Started);
    }

    /// Leave the running state.
    ///
    /// Cancels every pending one-shot timer, then joins the broadcaster so
    /// any in-flight status write finishes before this returns. Timer
    /// threads that wake later observe the cleared running flag and no-op.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if !state.running {
                return;
            }
            state.running = false;
            state.cancel_timers();
        }
        self.shared.wakeup.notify_all();

        let handle = self.shared.status_thread.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        self.shared.observer.on_event(&PrinterEvent::Stopped);
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().unwrap().running
    }

    /// Feed one inbound chunk from the transport.
    ///
    /// Chunks may carry partial frames or several errors' worth of junk; the
    /// reassembler and dispatcher sort it out. Everything a frame triggers
    /// is ordered after the frames delivered before it.
    pub fn deliver(&self, chunk: &[u8]) {
        let mut effects = Effects::default();
        {
            let mut state = self.shared.state.lock().unwrap();
            if !state.running {
                return;
            }

            for event in state.framer.push(chunk, Instant::now()) {
                match event {
                    FramerEvent::Frame(frame) => {
                        effects.events.push(PrinterEvent::FrameReceived {
                            length: frame.len(),
                        });
                        match parse_frame(&frame) {
                            Ok(command) => {
                                let mut ctx = HandlerContext {
                                    state: &mut state,
                                    config: &self.shared.config,
                                    effects: &mut effects,
                                };
                                handle_command(command, &mut ctx);
                            }
                            Err(error) => effects.events.push(PrinterEvent::CommandError {
                                message: error.to_string(),
                            }),
                        }
                    }
                    FramerEvent::Error(error) => {
                        effects.events.push(PrinterEvent::ReceiveError { error });
                    }
                }
            }
        }
        self.flush(effects);
    }

    /// Current print-job state.
    pub fn job_state(&self) -> PrintJobState {
        self.shared.state.lock().unwrap().job
    }

    /// Consistent copy of the status vector.
    pub fn status(&self) -> StatusVector {
        self.shared.state.lock().unwrap().status
    }

    /// Arm timers, send frames, and notify the observer, in that order.
    /// Called with the state mutex released.
    fn flush(&self, effects: Effects) {
        for request in effects.timers {
            spawn_timer(Arc::clone(&self.shared), request);
        }
        for frame in effects.outbound {
            if let Err(error) = self.shared.sink.send(&frame) {
                self.shared.observer.on_event(&PrinterEvent::TransportError {
                    message: error.to_string(),
                });
            }
        }
        for event in effects.events {
            self.shared.observer.on_event(&event);
        }
    }
}

/// Sleep out the delay, then run the matching transition if the timer is
/// still wanted.
fn spawn_timer(shared: Arc<EngineShared>, request: TimerRequest) {
    thread::spawn(move || {
        thread::sleep(request.delay);

        let mut effects = Effects::default();
        {
            let mut state = shared.state.lock().unwrap();
            if !state.running {
                return;
            }
            let live = match request.kind {
                TimerKind::Job => state.take_job_timer(request.token),
                TimerKind::ChuteSet | TimerKind::ChuteClear => {
                    state.take_chute_timer(request.token)
                }
            };
            if !live {
                return;
            }
            match request.kind {
                TimerKind::Job => on_job_timer(&shared.config, &mut state, &mut effects),
                TimerKind::ChuteSet => on_chute_set(&shared.config, &mut state, &mut effects),
                TimerKind::ChuteClear => on_chute_clear(&mut state, &mut effects),
            }
        }

        for request in effects.timers {
            spawn_timer(Arc::clone(&shared), request);
        }
        for event in effects.events {
            shared.observer.on_event(&event);
        }
    });
}

/// Drive the next print-job transition. The pending state decides which
/// transition this timer was armed for.
fn on_job_timer(config: &EmulatorConfig, state: &mut EngineState, effects: &mut Effects) {
    let from = state.job;
    match from {
        // Acceptance delay elapsed: the job becomes visible to the host.
        PrintJobState::IdleTof => {
            state.goto_state(PrintJobState::BusyNotTof);
            state.status.set_busy(true);
            state.status.set_validation_done(false);
            state.status.set_at_top_of_form(false);
            let token = state.arm_job_timer();
            effects.timers.push(TimerRequest {
                kind: TimerKind::Job,
                token,
                delay: config.validation_delay(),
            });
        }
        // Validation number laid down; the ticket starts moving, so the
        // chute oscillator is armed alongside the main timer.
        PrintJobState::BusyNotTof => {
            state.goto_state(PrintJobState::BusyValDone);
            state.status.set_validation_done(true);
            let token = state.arm_job_timer();
            effects.timers.push(TimerRequest {
                kind: TimerKind::Job,
                token,
                delay: config.busy_state_change_delay(),
            });
            let chute = state.arm_chute_timer();
            effects.timers.push(TimerRequest {
                kind: TimerKind::ChuteSet,
                token: chute,
                delay: config.paper_in_chute_set_delay(),
            });
        }
        // Job complete: Busy drops and status frames start advertising the
        // just-finished template instead of the previous one.
        PrintJobState::BusyValDone => {
            state.goto_state(PrintJobState::IdleNotTof);
            state.status.set_busy(false);
            let template = state.last_print_template_id;
            state.status.publish_completed_template(template);
            let token = state.arm_job_timer();
            effects.timers.push(TimerRequest {
                kind: TimerKind::Job,
                token,
                delay: config.tof_state_change_delay(),
            });
        }
        // Paper back at top of form; ready for the next ticket.
        PrintJobState::IdleNotTof => {
            state.goto_state(PrintJobState::IdleTof);
            state.status.set_at_top_of_form(true);
        }
    }
    effects.events.push(PrinterEvent::JobStateChanged {
        from,
        to: state.job,
    });
}

fn on_chute_set(config: &EmulatorConfig, state: &mut EngineState, effects: &mut Effects) {
    state.status.set_paper_in_chute(true);
    let token = state.arm_chute_timer();
    effects.timers.push(TimerRequest {
        kind: TimerKind::ChuteClear,
        token,
        delay: config.paper_in_chute_clear_delay(),
    });
    effects
        .events
        .push(PrinterEvent::PaperInChute { present: true });
}

fn on_chute_clear(state: &mut EngineState, effects: &mut Effects) {
    state.status.set_paper_in_chute(false);
    effects
        .events
        .push(PrinterEvent::PaperInChute { present: false });
}

/// Periodic status broadcaster. Emits one frame per tick from a snapshot
/// taken under the mutex, and goes down with the running flag.
fn status_loop(shared: Arc<EngineShared>) {
    let interval = shared.config.status_reporting_interval();
    loop {
        let frame = {
            let state = shared.state.lock().unwrap();
            if !state.running {
                break;
            }
            state
                .status
                .to_status_frame(shared.config.unit_address, &shared.config.software_version)
        };

        match shared.sink.send(&frame) {
            Ok(()) => shared.observer.on_event(&PrinterEvent::StatusEmitted {
                length: frame.len(),
                on_demand: false,
            }),
            Err(error) => shared.observer.on_event(&PrinterEvent::TransportError {
                message: error.to_string(),
            }),
        }

        let state = shared.state.lock().unwrap();
        if !state.running {
            break;
        }
        let (state, _) = shared
            .wakeup
            .wait_timeout_while(state, interval, |s| s.running)
            .unwrap();
        if !state.running {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::time::Duration;

    /// Compressed delays so a whole print cycle fits in under a second.
    /// Transitions land at t=100 (Busy), t=200 (ValDone), t=300 (chute set),
    /// t=450 (chute clear), t=500 (job done), t=600 (top of form).
    fn fast_config() -> EmulatorConfig {
        EmulatorConfig {
            status_reporting_interval_ms: 3_600_000, // effectively off
            print_start_delay_ms: 100,
            validation_delay_ms: 100,
            busy_state_change_delay_ms: 300,
            tof_state_change_delay_ms: 100,
            paper_in_chute_set_delay_ms: 100,
            paper_in_chute_clear_delay_ms: 150,
            ..EmulatorConfig::default()
        }
    }

    fn engine_with_mock(config: EmulatorConfig) -> (PrinterEngine, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let engine = PrinterEngine::new(config, mock.clone());
        (engine, mock)
    }

    fn sleep_ms(ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    fn power_up_frame() -> Vec<u8> {
        StatusVector::power_up().to_status_frame(0, "PAY-6.22B")
    }

    #[test]
    fn test_periodic_broadcast_starts_immediately() {
        let config = EmulatorConfig {
            status_reporting_interval_ms: 50,
            ..EmulatorConfig::default()
        };
        let (engine, mock) = engine_with_mock(config);
        engine.start();
        sleep_ms(20);
        engine.stop();

        let sent = mock.sent_frames();
        assert!(!sent.is_empty());
        assert_eq!(sent[0], power_up_frame());
    }

    #[test]
    fn test_status_request_echo() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.start();
        sleep_ms(50); // let the start-up broadcast land
        mock.clear_sent();

        engine.deliver(b"^S|^");
        let sent = mock.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], power_up_frame());

        // No state change in between: byte-identical answer.
        engine.deliver(b"^Se|^");
        assert_eq!(mock.sent_frames()[1], power_up_frame());
        engine.stop();
    }

    #[test]
    fn test_fragmented_print_command_accepted() {
        let (engine, _mock) = engine_with_mock(fast_config());
        engine.start();

        engine.deliver(b"^P|0|1|A|");
        engine.deliver(b"B|C|^");

        // Acceptance gap: still idle, but the start timer is pending.
        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        assert!(!engine.status().is_busy());

        sleep_ms(150);
        assert_eq!(engine.job_state(), PrintJobState::BusyNotTof);
        assert!(engine.status().is_busy());
        engine.stop();
    }

    #[test]
    fn test_print_cycle_flag_trace() {
        let (engine, _mock) = engine_with_mock(fast_config());
        engine.start();
        engine.deliver(b"^P|X|1|f|^");

        // t=50: acceptance gap.
        sleep_ms(50);
        let status = engine.status();
        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        assert!(!status.is_busy());
        assert_eq!(status.flags5, 0x61);

        // t=150: Busy, validation cleared, top of form surrendered.
        sleep_ms(100);
        let status = engine.status();
        assert_eq!(engine.job_state(), PrintJobState::BusyNotTof);
        assert_eq!(status.flags1, 0x60);
        assert_eq!(status.flags5, 0x41);
        assert_eq!(status.report_template_id, ' ');

        // t=250: validation done, still busy.
        sleep_ms(100);
        let status = engine.status();
        assert_eq!(engine.job_state(), PrintJobState::BusyValDone);
        assert_eq!(status.flags5, 0x61);
        assert!(status.is_busy());

        // t=350: paper in the chute.
        sleep_ms(100);
        let status = engine.status();
        assert_eq!(status.flags3, 0x48);
        assert!(status.is_busy());

        // t=480: chute cleared again at t=450.
        sleep_ms(130);
        assert_eq!(engine.status().flags3, 0x40);

        // t=550: job complete, template advertised.
        sleep_ms(70);
        let status = engine.status();
        assert_eq!(engine.job_state(), PrintJobState::IdleNotTof);
        assert_eq!(status.flags1, 0x40);
        assert_eq!(status.report_template_id, 'X');
        assert!(!status.is_at_top_of_form());

        // t=650: back at top of form. ValidationDone stays up until the
        // next job's busy transition, so flags5 carries it alongside
        // AtTopOfForm and ResetPowerUp.
        sleep_ms(100);
        let status = engine.status();
        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        assert_eq!(status.flags5, 0x71);
        assert!(status.is_at_top_of_form());
        engine.stop();
    }

    #[test]
    fn test_second_print_dropped_during_acceptance_gap() {
        let (engine, _mock) = engine_with_mock(fast_config());
        engine.start();

        engine.deliver(b"^P|A|1|^");
        sleep_ms(10); // still inside the acceptance gap
        engine.deliver(b"^P|B|1|^");

        // Run the cycle out; only template A was ever in flight.
        sleep_ms(700);
        let status = engine.status();
        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        assert_eq!(status.report_template_id, 'A');
        assert_eq!(status.last_template_id, 'A');
        engine.stop();
    }

    #[test]
    fn test_second_print_dropped_while_busy() {
        let (engine, _mock) = engine_with_mock(fast_config());
        engine.start();

        engine.deliver(b"^P|A|1|^");
        sleep_ms(150); // Busy now
        engine.deliver(b"^P|B|1|^");

        sleep_ms(600);
        assert_eq!(engine.status().report_template_id, 'A');
        engine.stop();
    }

    #[test]
    fn test_reassembly_timeout_drops_job() {
        let (engine, _mock) = engine_with_mock(fast_config());
        engine.start();

        engine.deliver(b"^P|0|1|A");
        sleep_ms(50); // past the 20 ms reassembly timeout
        engine.deliver(b"|B|^");

        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        assert!(!engine.status().is_busy());

        // The engine still accepts a clean retry.
        engine.deliver(b"^P|0|1|A|B|^");
        sleep_ms(150);
        assert!(engine.status().is_busy());
        engine.stop();
    }

    #[test]
    fn test_stop_cancels_pending_timers() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.start();

        engine.deliver(b"^P|Z|1|^");
        engine.stop();
        mock.clear_sent();

        sleep_ms(250); // past where the Busy transition would have fired
        let status = engine.status();
        assert!(!status.is_busy());
        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        assert!(mock.sent_frames().is_empty());
    }

    #[test]
    fn test_deliver_ignored_when_stopped() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.deliver(b"^S|^");
        assert!(mock.sent_frames().is_empty());
    }

    #[test]
    fn test_send_failure_drops_frame_and_continues() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.start();
        sleep_ms(50);
        mock.clear_sent();

        mock.disconnect();
        engine.deliver(b"^S|^");
        assert!(mock.sent_frames().is_empty());

        mock.reconnect();
        engine.deliver(b"^S|^");
        assert_eq!(mock.sent_frames().len(), 1);
        engine.stop();
    }

    #[test]
    fn test_unrecognized_frame_gets_no_reply() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.start();
        sleep_ms(50);
        mock.clear_sent();

        engine.deliver(b"^Q|^");
        engine.deliver(b"^C|j|^");
        assert!(mock.sent_frames().is_empty());
        assert_eq!(engine.job_state(), PrintJobState::IdleTof);
        engine.stop();
    }

    #[test]
    fn test_clear_flags_is_accepted_and_silent() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.start();
        sleep_ms(50);
        mock.clear_sent();

        engine.deliver(b"^C|^");
        assert!(mock.sent_frames().is_empty());
        assert_eq!(engine.status(), StatusVector::power_up());
        engine.stop();
    }

    #[test]
    fn test_restart_after_stop() {
        let (engine, mock) = engine_with_mock(fast_config());
        engine.start();
        engine.stop();

        engine.start();
        sleep_ms(50);
        mock.clear_sent();
        engine.deliver(b"^S|^");
        assert_eq!(mock.sent_frames().len(), 1);
        engine.stop();
    }
}
