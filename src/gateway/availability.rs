//! Process-wide "is the gateway up" flag.
//!
//! Only the health probe and completed gateway calls write it; every data fetch
//! reads it before touching the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use metrics::gauge;

#[derive(Debug, Default)]
pub struct ProviderAvailability {
    available: AtomicBool,
    checked: AtomicBool,
    last_probe: Mutex<Option<DateTime<Utc>>>,
    /// Held while a health check is in flight so concurrent callers share one `/health` call.
    probe_gate: tokio::sync::Mutex<()>,
}

impl ProviderAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn is_checked(&self) -> bool {
        self.checked.load(Ordering::SeqCst)
    }

    pub fn last_probe(&self) -> Option<DateTime<Utc>> {
        *self.last_probe.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// A call reached the host.
    pub fn mark_up(&self) {
        self.set(true);
    }

    /// A call failed at the network layer. The flag drops and the next call checks health again.
    pub fn mark_down(&self) {
        self.set(false);
        self.checked.store(false, Ordering::SeqCst);
    }

    pub fn record_probe(&self, ok: bool, at: DateTime<Utc>) {
        self.set(ok);
        self.checked.store(true, Ordering::SeqCst);
        *self.last_probe.lock().unwrap_or_else(|p| p.into_inner()) = Some(at);
    }

    pub fn probe_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.probe_gate
    }

    /// Forget the last probe so the next data call probes again.
    pub fn reset(&self) {
        self.checked.store(false, Ordering::SeqCst);
    }

    /// True when no probe has run yet, or the optional probe TTL has elapsed.
    pub fn needs_probe(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        if !self.is_checked() {
            return true;
        }
        match (ttl, self.last_probe()) {
            (Some(ttl), Some(at)) => now - at >= ttl,
            _ => false,
        }
    }

    fn set(&self, up: bool) {
        self.available.store(up, Ordering::SeqCst);
        gauge!("gateway_available").set(if up { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 14, 0, 0).unwrap()
    }

    #[test]
    fn starts_unchecked_and_unavailable() {
        let a = ProviderAvailability::new();
        assert!(!a.is_available());
        assert!(!a.is_checked());
        assert!(a.needs_probe(t0(), None));
    }

    #[test]
    fn probe_result_is_sticky_without_ttl() {
        let a = ProviderAvailability::new();
        a.record_probe(false, t0());
        assert!(!a.is_available());
        assert!(!a.needs_probe(t0() + Duration::hours(6), None));

        a.reset();
        assert!(a.needs_probe(t0(), None));
    }

    #[test]
    fn probe_ttl_expires() {
        let a = ProviderAvailability::new();
        a.record_probe(true, t0());
        let ttl = Some(Duration::seconds(60));
        assert!(!a.needs_probe(t0() + Duration::seconds(59), ttl));
        assert!(a.needs_probe(t0() + Duration::seconds(60), ttl));
    }

    #[test]
    fn calls_flip_the_flag() {
        let a = ProviderAvailability::new();
        a.mark_up();
        assert!(a.is_available());
        a.mark_down();
        assert!(!a.is_available());
    }

    #[test]
    fn network_failure_forces_a_fresh_health_check() {
        let a = ProviderAvailability::new();
        a.record_probe(true, t0());
        assert!(!a.needs_probe(t0(), None));
        a.mark_down();
        assert!(!a.is_available());
        assert!(a.needs_probe(t0(), None));
    }
}
