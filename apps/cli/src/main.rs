use anyhow::{Context, Result};
use clap::Parser;
use paycheck_core::{
    EmulatorConfig, PrinterEngine, PrinterEvent, PrinterObserver, SerialTransport,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "paycheck",
    author,
    version,
    about = "Nanoptix PayCheck 4 printer emulator",
    long_about = "Emulates a PayCheck 4 thermal receipt printer toward an EGM host \
                  over a USB CDC-ACM serial link."
)]
struct Args {
    /// Serial device node the host is wired to (gadget-side tty)
    #[arg(long, default_value = "/dev/ttyGS0")]
    device: String,

    /// Baud rate (nominal on a CDC-ACM gadget tty)
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// CLI observer that prints progress to stderr.
struct CliObserver {
    verbose: bool,
}

impl PrinterObserver for CliObserver {
    fn on_event(&self, event: &PrinterEvent) {
        match event {
            PrinterEvent::Started => {
                eprintln!("✓ Emulator running");
            }
            PrinterEvent::Stopped => {
                eprintln!("✗ Emulator stopped");
            }
            PrinterEvent::FrameReceived { length } => {
                if self.verbose {
                    eprintln!("← Frame ({length} bytes)");
                }
            }
            PrinterEvent::ReceiveError { error } => {
                eprintln!("! Receive error: {error}");
            }
            PrinterEvent::CommandError { message } => {
                eprintln!("! Command error: {message}");
            }
            PrinterEvent::PrintAccepted {
                template_id,
                copies,
                field_count,
            } => {
                eprintln!("→ Print job: template '{template_id}', {copies} copies, {field_count} fields");
            }
            PrinterEvent::PrintRejected { template_id, state } => {
                eprintln!("! Print '{template_id}' dropped (printer {state})");
            }
            PrinterEvent::JobStateChanged { from, to } => {
                if self.verbose {
                    eprintln!("→ Job: {from} → {to}");
                }
            }
            PrinterEvent::PaperInChute { present } => {
                if self.verbose {
                    eprintln!("→ Paper in chute: {present}");
                }
            }
            PrinterEvent::StatusEmitted { on_demand, .. } => {
                if self.verbose && *on_demand {
                    eprintln!("→ Status reply sent");
                }
            }
            PrinterEvent::TransportError { message } => {
                eprintln!("! Transport error: {message}");
            }
            PrinterEvent::Log { .. } => {}
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("PayCheck emulator starting...");

    let config = match &args.config {
        Some(path) => EmulatorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {path}"))?,
        None => EmulatorConfig::default(),
    };

    let observer = Arc::new(CliObserver {
        verbose: args.verbose,
    });

    // Each (re)connection is a power cycle as far as the host can tell: a
    // fresh engine comes up with power-up status flags.
    loop {
        let transport = match SerialTransport::open(&args.device, args.baud) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                warn!(device = %args.device, error = %e, "Waiting for device...");
                thread::sleep(Duration::from_secs(1));
                continue;
            }
        };

        let engine =
            PrinterEngine::with_observer(config.clone(), transport.clone(), observer.clone());
        engine.start();

        match transport.pump(&engine) {
            Ok(()) => {
                engine.stop();
                break;
            }
            Err(e) => {
                warn!(error = %e, "Device lost, re-opening...");
                engine.stop();
                thread::sleep(Duration::from_secs(1));
            }
        }
    }

    Ok(())
}
