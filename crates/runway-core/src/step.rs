use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StepKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Execute an argv directly (no shell). Stdio is inherited from the
    /// sequencer so child output reaches the terminal untouched.
    Command { argv: Vec<String> },
    /// Poll a TCP connect until the endpoint accepts or the deadline
    /// passes. Replaces an external readiness-check command with a
    /// built-in probe; the sequence still sees a single pass/fail step.
    WaitTcp {
        addr: String,
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
        #[serde(default = "default_wait_timeout")]
        timeout_seconds: u64,
    },
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_wait_timeout() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// StepDefinition
// ---------------------------------------------------------------------------

/// One pre-flight entry in the startup sequence.
///
/// Steps run strictly in list order; the first non-zero outcome aborts
/// everything after it, including the server launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub name: String,
    pub action: StepKind,
}

impl StepDefinition {
    pub fn command(name: impl Into<String>, argv: &[&str]) -> Self {
        Self {
            name: name.into(),
            action: StepKind::Command {
                argv: argv.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn wait_tcp(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: StepKind::WaitTcp {
                addr: addr.into(),
                interval_ms: default_interval_ms(),
                timeout_seconds: default_wait_timeout(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// Record of one completed step. Only successful steps produce an
/// outcome in a [`crate::sequence::SequenceReport`]; a failing step
/// surfaces as an error instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_name: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
