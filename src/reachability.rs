//! Plain TCP reachability check for a display's MDC port.

use std::fmt;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Outcome of one reachability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    pub online: bool,
    /// Time to connect, when the connect succeeded.
    pub elapsed_ms: Option<u64>,
    /// `Reachable in N ms`, or the connect error.
    pub detail: String,
}

impl Reachability {
    #[must_use]
    pub const fn state(&self) -> &'static str {
        if self.online {
            "ONLINE"
        } else {
            "OFFLINE"
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.state(), self.detail)
    }
}

/// Open (and immediately close) a TCP connection to `host:port`.
pub async fn check_reachability(host: &str, port: u16, limit: Duration) -> Reachability {
    let host = host.trim();
    let start = Instant::now();
    let outcome = timeout(limit, TcpStream::connect((host, port))).await;
    match outcome {
        Ok(Ok(_stream)) => {
            let ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            Reachability {
                online: true,
                elapsed_ms: Some(ms),
                detail: format!("Reachable in {ms} ms"),
            }
        }
        Ok(Err(e)) => {
            tracing::debug!(host, port, error = %e, "reachability check failed");
            Reachability {
                online: false,
                elapsed_ms: None,
                detail: e.to_string(),
            }
        }
        Err(_) => Reachability {
            online: false,
            elapsed_ms: None,
            detail: format!("timed out after {} ms", limit.as_millis()),
        },
    }
}

/// [`check_reachability`] with the configured timeout.
pub async fn check_reachability_default(host: &str, port: u16) -> Reachability {
    check_reachability(host, port, crate::config::config().reachability_timeout()).await
}
