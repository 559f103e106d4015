use std::time::Duration;

use thiserror::Error;

/// Failures at the market-data gateway boundary.
///
/// None of these escape the client layer: they are logged and turned into a
/// [`FallbackReason`](crate::dataset::FallbackReason).
#[derive(Error, Debug)]
pub enum GatewayError {
    /// TCP/HTTP layer could not reach the host.
    #[error("gateway unreachable: {0}")]
    Connectivity(String),

    #[error("gateway timed out after {0:?}")]
    Timeout(Duration),

    /// Host answered with a non-2xx status.
    #[error("gateway returned {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("gateway response was not valid JSON: {0}")]
    Decode(String),

    /// Short-circuited: the availability flag says the gateway is down.
    #[error("gateway unavailable (last probe failed)")]
    Unavailable,
}

impl GatewayError {
    /// Errors that prove the host is not reachable right now.
    pub fn is_network(&self) -> bool {
        matches!(self, GatewayError::Connectivity(_) | GatewayError::Timeout(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(timeout)
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Connectivity(err.to_string())
        }
    }
}
