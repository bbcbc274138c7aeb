//! Global atomic counters for probe harness observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a session).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lock-free atomic counters.
pub struct Metrics {
    probes_executed: AtomicU64,
    provider_calls: AtomicU64,
    upstream_failures: AtomicU64,
    proxy_requests: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            probes_executed: AtomicU64::new(0),
            provider_calls: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
            proxy_requests: AtomicU64::new(0),
        }
    }

    /// Increment the probes-executed counter by one.
    pub fn inc_probes_executed(&self) {
        self.probes_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_executed", "counter incremented");
    }

    pub fn inc_provider_calls(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "provider_calls", "counter incremented");
    }

    pub fn inc_upstream_failures(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "upstream_failures", "counter incremented");
    }

    pub fn inc_proxy_requests(&self) {
        self.proxy_requests.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "proxy_requests", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            probes_executed = self.probes_executed(),
            provider_calls = self.provider_calls(),
            upstream_failures = self.upstream_failures(),
            proxy_requests = self.proxy_requests(),
        );
    }

    pub fn probes_executed(&self) -> u64 {
        self.probes_executed.load(Ordering::Relaxed)
    }

    pub fn provider_calls(&self) -> u64 {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }

    pub fn proxy_requests(&self) -> u64 {
        self.proxy_requests.load(Ordering::Relaxed)
    }
}
