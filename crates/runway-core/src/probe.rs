use crate::error::{Result, RunwayError};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// TcpProbe
// ---------------------------------------------------------------------------

/// Polls a TCP connect until the endpoint accepts or the deadline passes.
///
/// One connect attempt is made per poll tick; an attempt that neither
/// succeeds nor fails within the tick interval is abandoned so an
/// unresponsive host cannot stall the deadline check.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    pub addr: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            interval,
            timeout,
        }
    }

    /// Block until `addr` accepts a TCP connection. Returns the elapsed
    /// wait on success; [`RunwayError::WaitTimeout`] once the deadline
    /// passes.
    pub async fn wait_until_ready(&self) -> Result<Duration> {
        let start = Instant::now();
        // A zero interval still needs a bounded connect attempt.
        let attempt_window = self.interval.max(Duration::from_millis(100));

        loop {
            match tokio::time::timeout(attempt_window, TcpStream::connect(self.addr.as_str())).await
            {
                Ok(Ok(_stream)) => {
                    let elapsed = start.elapsed();
                    info!(addr = %self.addr, waited_ms = elapsed.as_millis() as u64, "endpoint ready");
                    return Ok(elapsed);
                }
                Ok(Err(e)) => {
                    debug!(addr = %self.addr, error = %e, "endpoint not ready yet");
                }
                Err(_) => {
                    debug!(addr = %self.addr, "connect attempt timed out");
                }
            }

            if start.elapsed() >= self.timeout {
                return Err(RunwayError::WaitTimeout {
                    addr: self.addr.clone(),
                    timeout_s: self.timeout.as_secs_f64(),
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
