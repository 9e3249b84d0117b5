//! Fail-fast startup sequencing.
//!
//! Runs the configured pre-flight steps strictly in order, then launches
//! the application server as the long-lived foreground child. The first
//! non-zero step outcome aborts everything after it; signals delivered to
//! the sequencer are forwarded to whichever child is currently running.

use crate::config::Config;
use crate::error::{Result, RunwayError};
use crate::probe::TcpProbe;
use crate::step::{StepDefinition, StepKind, StepOutcome};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// SIGTERM/SIGINT streams, installed once per sequence run.
///
/// tokio's unix signal streams latch delivery, so a signal arriving
/// between two child spawns is not lost.
struct Signals {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
}

impl Signals {
    fn install() -> Result<Self> {
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
        })
    }

    /// Wait for the next SIGTERM or SIGINT.
    async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.term.recv() => Signal::SIGTERM,
            _ = self.int.recv() => Signal::SIGINT,
        }
    }
}

// ---------------------------------------------------------------------------
// SequenceReport
// ---------------------------------------------------------------------------

/// Result of a completed run. `server_exit` is `None` when the server
/// launch was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    pub completed: Vec<StepOutcome>,
    pub server_exit: Option<i32>,
}

// ---------------------------------------------------------------------------
// run_sequence
// ---------------------------------------------------------------------------

/// Run the startup sequence: every pre-flight step in order, then (unless
/// `launch_server` is false) the server as the foreground process.
///
/// Environment and stdio are inherited by every child unmodified. The
/// first failing step aborts the sequence with a [`RunwayError`] whose
/// `exit_code()` is the status to propagate; a successful run reports
/// the server's own exit code.
pub async fn run_sequence(config: &Config, launch_server: bool) -> Result<SequenceReport> {
    let mut signals = Signals::install()?;
    let total = config.steps.len();
    let mut completed = Vec::with_capacity(total);

    for (idx, step) in config.steps.iter().enumerate() {
        completed.push(run_step(step, idx + 1, total, &mut signals).await?);
    }

    if !launch_server {
        return Ok(SequenceReport {
            completed,
            server_exit: None,
        });
    }

    let argv = config.server.to_argv();
    info!(command = %argv.join(" "), "launching server");
    let mut child = spawn_child("server", &argv)?;
    let status = wait_forwarding_signals(&mut child, &mut signals).await?;
    let code = exit_status_code(status);
    if code == 0 {
        info!("server exited cleanly");
    } else {
        warn!(code, "server exited");
    }
    Ok(SequenceReport {
        completed,
        server_exit: Some(code),
    })
}

async fn run_step(
    step: &StepDefinition,
    position: usize,
    total: usize,
    signals: &mut Signals,
) -> Result<StepOutcome> {
    info!(step = %step.name, position, total, "running step");
    let start = Instant::now();

    match &step.action {
        StepKind::Command { argv } => {
            let mut child = spawn_child(&step.name, argv)?;
            let status = wait_forwarding_signals(&mut child, signals).await?;
            let code = exit_status_code(status);
            let duration_ms = start.elapsed().as_millis() as u64;
            if code != 0 {
                error!(step = %step.name, code, "step failed, aborting startup");
                return Err(RunwayError::StepFailed {
                    step: step.name.clone(),
                    code,
                });
            }
            info!(step = %step.name, duration_ms, "step succeeded");
            Ok(StepOutcome {
                step_name: step.name.clone(),
                exit_code: 0,
                duration_ms,
            })
        }
        StepKind::WaitTcp {
            addr,
            interval_ms,
            timeout_seconds,
        } => {
            let probe = TcpProbe::new(
                addr.clone(),
                Duration::from_millis(*interval_ms),
                Duration::from_secs(*timeout_seconds),
            );
            // No child exists during a built-in probe; a signal aborts
            // the sequence directly.
            tokio::select! {
                res = probe.wait_until_ready() => { res?; }
                sig = signals.recv() => {
                    warn!(step = %step.name, signal = %sig, "interrupted while waiting");
                    return Err(RunwayError::Interrupted {
                        step: step.name.clone(),
                        signal: sig as i32,
                    });
                }
            }
            let duration_ms = start.elapsed().as_millis() as u64;
            info!(step = %step.name, duration_ms, "step succeeded");
            Ok(StepOutcome {
                step_name: step.name.clone(),
                exit_code: 0,
                duration_ms,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Child process plumbing
// ---------------------------------------------------------------------------

/// Spawn an argv with inherited stdio and environment.
fn spawn_child(step: &str, argv: &[String]) -> Result<Child> {
    let Some((program, args)) = argv.split_first() else {
        return Err(RunwayError::EmptyCommand {
            step: step.to_string(),
        });
    };
    if program.trim().is_empty() {
        return Err(RunwayError::EmptyCommand {
            step: step.to_string(),
        });
    }
    Command::new(program)
        .args(args)
        .spawn()
        .map_err(|e| RunwayError::SpawnFailed {
            step: step.to_string(),
            program: program.clone(),
            source: e,
        })
}

/// Wait for the child to exit, forwarding any SIGTERM/SIGINT received in
/// the meantime. The child keeps running until it exits on its own
/// terms; its resulting status is returned either way.
async fn wait_forwarding_signals(child: &mut Child, signals: &mut Signals) -> Result<ExitStatus> {
    // Captured before the wait loop: `Child::id` returns None once the
    // child has been reaped.
    let pid = child.id();
    loop {
        tokio::select! {
            status = child.wait() => return Ok(status?),
            sig = signals.recv() => forward_signal(pid, sig),
        }
    }
}

/// Deliver `sig` to the child. Best-effort: the child may have exited
/// between the signal arriving and the kill.
fn forward_signal(pid: Option<u32>, sig: Signal) {
    if let Some(pid) = pid {
        match kill(Pid::from_raw(pid as i32), sig) {
            Ok(()) => info!(signal = %sig, pid, "forwarded signal to child"),
            Err(e) => warn!(signal = %sig, pid, error = %e, "failed to forward signal"),
        }
    }
}

/// Map a wait(2) status to the exit code the sequencer propagates:
/// the child's own code, or `128 + signo` for signal deaths.
pub fn exit_status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    use std::os::unix::process::ExitStatusExt;
    128 + status.signal().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
