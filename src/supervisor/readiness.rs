//! Readiness barrier between the tunnel and shell starts.
//!
//! The shell must not start until the tunnel can accept connections, so the
//! supervisor polls the tunnel's local bind target for TCP connectability
//! with bounded backoff instead of sleeping a flat settle interval.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// Poll pacing for the readiness barrier.
#[derive(Debug, Clone)]
pub struct Settle {
    /// Give up and fail closed once this much time has passed.
    pub timeout: Duration,
    /// First retry interval; doubles per attempt.
    pub initial_interval: Duration,
    /// Retry interval cap.
    pub max_interval: Duration,
}

impl Default for Settle {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
        }
    }
}

/// True once something is accepting TCP connections on the local bind
/// target.
pub(crate) fn listener_up(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok()
}

/// Doubles `interval` up to the configured cap.
pub(crate) fn next_interval(settle: &Settle, interval: Duration) -> Duration {
    (interval * 2).min(settle.max_interval)
}
