use anyhow::Context;
use runway_core::probe::TcpProbe;
use std::time::Duration;

pub fn run(addr: &str, interval_ms: u64, timeout_seconds: u64) -> anyhow::Result<i32> {
    let probe = TcpProbe::new(
        addr,
        Duration::from_millis(interval_ms),
        Duration::from_secs(timeout_seconds),
    );

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(probe.wait_until_ready())?;
    Ok(0)
}
