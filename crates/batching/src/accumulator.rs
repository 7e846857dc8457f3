//! Accumulator - size/linger bounded batching

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{Batch, BatchingConfig, Record};
use tracing::debug;

use crate::clock::{Clock, MonotonicClock};

/// Why a batch left the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Reached `max_batch_size`
    Size,
    /// Older than the linger time
    Linger,
    /// Hard flush requested by the caller
    Forced,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Linger => "linger",
            Self::Forced => "forced",
        }
    }
}

/// Owns the batch being filled
///
/// Every operation runs in one critical section, so concurrent producers
/// never lose or duplicate a record and a handed-off batch is never touched
/// again. No I/O happens under the lock.
pub struct Accumulator {
    max_batch_size: usize,
    linger_ms: u64,
    clock: Arc<dyn Clock>,
    current: Mutex<Batch>,
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("max_batch_size", &self.max_batch_size)
            .field("linger_ms", &self.linger_ms)
            .field("pending", &self.len())
            .finish()
    }
}

impl Accumulator {
    /// Create an accumulator on the monotonic clock
    pub fn new(config: BatchingConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Create an accumulator on a custom clock
    pub fn with_clock(config: BatchingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_batch_size: config.max_batch_size,
            linger_ms: config.linger_ms,
            clock,
            current: Mutex::new(Batch::new()),
        }
    }

    /// Append a record, returning the batch if it became ready
    pub fn add(&self, record: impl Into<Record>) -> Option<Batch> {
        let mut current = self.lock();
        let now_ms = self.clock.now_ms();
        current.push_at(record.into(), now_ms);
        self.take_ready(&mut current, true, now_ms)
    }

    /// Emit the current batch
    ///
    /// A soft flush keeps the batch while it is both under `max_batch_size`
    /// and younger than the linger time. A hard flush emits any non-empty
    /// batch. An empty batch is never emitted.
    pub fn flush(&self, soft: bool) -> Option<Batch> {
        let mut current = self.lock();
        let now_ms = self.clock.now_ms();
        self.take_ready(&mut current, soft, now_ms)
    }

    /// Number of records waiting in the current batch
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn linger_ms(&self) -> u64 {
        self.linger_ms
    }

    fn take_ready(&self, current: &mut Batch, soft: bool, now_ms: u64) -> Option<Batch> {
        if current.is_empty() {
            return None;
        }

        let full = current.len() >= self.max_batch_size;
        let expired = current.age_ms(now_ms) >= self.linger_ms;
        if soft && !full && !expired {
            return None;
        }

        let trigger = if full {
            FlushTrigger::Size
        } else if expired {
            FlushTrigger::Linger
        } else {
            FlushTrigger::Forced
        };

        let batch = std::mem::take(current);
        debug!(
            batch_len = batch.len(),
            age_ms = batch.age_ms(now_ms),
            trigger = trigger.as_str(),
            "Batch ready"
        );
        observability::metrics::record_batch_emitted(batch.len(), trigger.as_str());
        Some(batch)
    }

    fn lock(&self) -> MutexGuard<'_, Batch> {
        // The batch stays structurally valid if a holder panicked.
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
