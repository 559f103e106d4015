//! Live-vs-fallback bookkeeping.
//!
//! Client calls resolve to `Result<T, FallbackReason>`; services turn that into a
//! [`DataSet`] that always carries data plus where it came from, so handlers and
//! tests never have to guess from the shape of the payload.

use metrics::counter;

use crate::gateway::GatewayError;

/// Why a fallback dataset was served instead of live data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The last health probe (or call) marked the gateway down; no request was made.
    Unavailable,
    /// The host could not be reached.
    Connectivity,
    /// The request did not complete within its timeout.
    Timeout,
    /// The gateway answered with a non-2xx status.
    UpstreamStatus(u16),
    /// Well-formed response without any records.
    EmptyResult,
    /// Response body or records did not match any known upstream shape.
    UnrecognizedShape,
}

impl FallbackReason {
    /// Short label for headers and metrics.
    pub fn label(&self) -> String {
        match self {
            FallbackReason::Unavailable => "unavailable".into(),
            FallbackReason::Connectivity => "connectivity".into(),
            FallbackReason::Timeout => "timeout".into(),
            FallbackReason::UpstreamStatus(code) => format!("status-{code}"),
            FallbackReason::EmptyResult => "empty".into(),
            FallbackReason::UnrecognizedShape => "unrecognized-shape".into(),
        }
    }
}

impl From<&GatewayError> for FallbackReason {
    fn from(e: &GatewayError) -> Self {
        match e {
            GatewayError::Connectivity(_) => FallbackReason::Connectivity,
            GatewayError::Timeout(_) => FallbackReason::Timeout,
            GatewayError::UpstreamStatus { status, .. } => FallbackReason::UpstreamStatus(*status),
            GatewayError::Decode(_) => FallbackReason::UnrecognizedShape,
            GatewayError::Unavailable => FallbackReason::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Live,
    /// Live data served from the in-process cache.
    Cached,
    Fallback(FallbackReason),
}

impl Origin {
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Live => "live",
            Origin::Cached => "cached",
            Origin::Fallback(_) => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSet<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> DataSet<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            origin: Origin::Live,
        }
    }

    pub fn fallback(data: T, reason: FallbackReason) -> Self {
        Self {
            data,
            origin: Origin::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback(_))
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.origin {
            Origin::Fallback(r) => Some(r),
            _ => None,
        }
    }

    /// Re-label a live set as cached; fallback sets keep their reason.
    pub fn into_cached(self) -> Self {
        let origin = match self.origin {
            Origin::Live => Origin::Cached,
            other => other,
        };
        Self {
            data: self.data,
            origin,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DataSet<U> {
        DataSet {
            data: f(self.data),
            origin: self.origin,
        }
    }
}

/// Terminal step of every fetch: live data on success, generated data otherwise.
pub fn resolve<T>(
    domain: &'static str,
    result: Result<T, FallbackReason>,
    fallback: impl FnOnce() -> T,
) -> DataSet<T> {
    match result {
        Ok(data) => DataSet::live(data),
        Err(reason) => {
            tracing::debug!(target: "fallback", domain, reason = %reason.label(), "serving fallback data");
            counter!("fallback_served_total", "domain" => domain).increment(1);
            DataSet::fallback(fallback(), reason)
        }
    }
}
