use anyhow::Context;
use runway_core::config::Config;
use runway_core::sequence::run_sequence;
use runway_core::step::StepKind;
use std::path::Path;
use tracing::warn;

pub fn run(
    config_path: Option<&Path>,
    dry_run: bool,
    skip_server: bool,
    json: bool,
) -> anyhow::Result<i32> {
    let config = Config::resolve(config_path).context("failed to load config")?;

    // Surface config problems up front; runtime checks still produce the
    // authoritative failures.
    for w in config.validate() {
        warn!("{}", w.message);
    }

    if dry_run {
        print_plan(&config, skip_server, json)?;
        return Ok(0);
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let report = rt.block_on(run_sequence(&config, !skip_server))?;

    Ok(report.server_exit.unwrap_or(0))
}

/// Print the resolved step and server argvs without executing anything.
fn print_plan(config: &Config, skip_server: bool, json: bool) -> anyhow::Result<()> {
    if json {
        let plan = serde_json::json!({
            "steps": config.steps,
            "server": if skip_server {
                None
            } else {
                Some(config.server.to_argv())
            },
        });
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Plan:");
    for (idx, step) in config.steps.iter().enumerate() {
        let detail = match &step.action {
            StepKind::Command { argv } => argv.join(" "),
            StepKind::WaitTcp {
                addr,
                interval_ms,
                timeout_seconds,
            } => format!("wait for {addr} (every {interval_ms}ms, up to {timeout_seconds}s)"),
        };
        println!("  {}. {:<16} {}", idx + 1, step.name, detail);
    }
    if skip_server {
        println!("  server launch skipped");
    } else {
        println!("  server: {}", config.server.to_argv().join(" "));
    }
    Ok(())
}
