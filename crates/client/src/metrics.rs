//! Delivery metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::DeliveryError;

/// Delivery counters of one client
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Batches waiting for a sender
    queued: AtomicUsize,
    /// Batches handed to the pool
    submitted: AtomicU64,
    /// Batches accepted by the service
    delivered: AtomicU64,
    /// 422 responses
    data_rejected: AtomicU64,
    /// 401 / 403 responses
    auth_rejected: AtomicU64,
    /// Other non-success statuses
    unexpected_status: AtomicU64,
    /// Network errors and exhausted retries
    transport_failures: AtomicU64,
    /// Batches lost because the pool or transport was already closed
    dropped: AtomicU64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    pub fn set_queued(&self, len: usize) {
        self.queued.store(len, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed delivery under its outcome
    pub fn record_failure(&self, error: &DeliveryError) {
        let counter = match error {
            DeliveryError::DataRejected => &self.data_rejected,
            DeliveryError::AuthenticationRejected { .. } => &self.auth_rejected,
            DeliveryError::UnexpectedStatus(_) => &self.unexpected_status,
            DeliveryError::TransportFailure { .. } => &self.transport_failures,
            DeliveryError::Closed => &self.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queued: self.queued(),
            submitted: self.submitted(),
            delivered: self.delivered(),
            data_rejected: self.data_rejected.load(Ordering::Relaxed),
            auth_rejected: self.auth_rejected.load(Ordering::Relaxed),
            unexpected_status: self.unexpected_status.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DeliveryMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queued: usize,
    pub submitted: u64,
    pub delivered: u64,
    pub data_rejected: u64,
    pub auth_rejected: u64,
    pub unexpected_status: u64,
    pub transport_failures: u64,
    pub dropped: u64,
}

impl MetricsSnapshot {
    /// Batches that reached a final outcome
    pub fn completed(&self) -> u64 {
        self.delivered + self.failed()
    }

    /// Batches that were not delivered
    pub fn failed(&self) -> u64 {
        self.data_rejected
            + self.auth_rejected
            + self.unexpected_status
            + self.transport_failures
            + self.dropped
    }
}
