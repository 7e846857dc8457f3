//! Client - public entry point for recording signals and traces

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use batching::{Accumulator, Clock, MonotonicClock};
use contracts::{
    Batch, ClientConfig, Properties, Record, Signal, SignalKind, Trace, TraceData, Transport,
    Value,
};
use tracing::{debug, info, instrument, warn};
use transport::HttpTransport;

use crate::error::{ClientError, Result};
use crate::metrics::{DeliveryMetrics, MetricsSnapshot};
use crate::pool::SenderPool;

/// `User-Agent` sent with every request
pub const USER_AGENT: &str = concat!("security-signal-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Records signals and traces and ships them in batches
///
/// Recording never waits on the network: ready batches are queued to a
/// pool of `max_workers` senders. Delivery outcomes are only logged and
/// counted (see [`Client::metrics`]).
///
/// [`Client::close`] blocks until every queued batch has been sent, so call
/// it from a thread that may block. Dropping an open client closes it.
pub struct Client<T = HttpTransport>
where
    T: Transport + Send + Sync + 'static,
{
    accumulator: Accumulator,
    transport: Arc<T>,
    pool: Mutex<Option<SenderPool>>,
    metrics: Arc<DeliveryMetrics>,
    closed: AtomicBool,
    /// Held for read while recording, for write while closing
    gate: RwLock<()>,
}

impl Client<HttpTransport> {
    /// Create a client sending to the ingestion service over HTTP
    ///
    /// # Errors
    /// - Configuration validation failure
    /// - Invalid base or proxy URL
    /// - Sender runtime could not start
    #[instrument(
        name = "client_new",
        skip(config),
        fields(base_url = %config.base_url, max_workers = config.max_workers)
    )]
    pub fn new(config: ClientConfig) -> Result<Self> {
        config_loader::validate(&config)?;

        let headers = config.credentials().headers(USER_AGENT);
        let transport = HttpTransport::new(
            &config.base_url,
            config.proxy_url.as_deref(),
            headers,
            config.transport.clone(),
        )?;

        Self::with_transport(&config, transport)
    }
}

impl<T> Client<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Create a client on a custom transport
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        Self::with_transport_and_clock(config, transport, Arc::new(MonotonicClock::new()))
    }

    /// Create a client on a custom transport and batch clock
    pub fn with_transport_and_clock(
        config: &ClientConfig,
        transport: T,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config_loader::validate(config)?;

        let transport = Arc::new(transport);
        let metrics = Arc::new(DeliveryMetrics::new());
        let pool = SenderPool::spawn(
            Arc::clone(&transport),
            config.max_workers,
            Arc::clone(&metrics),
        )?;

        info!(
            transport = transport.name(),
            max_batch_size = config.batching.max_batch_size,
            linger_ms = config.batching.linger_ms,
            max_workers = config.max_workers,
            "Client started"
        );

        Ok(Self {
            accumulator: Accumulator::with_clock(config.batching, clock),
            transport,
            pool: Mutex::new(Some(pool)),
            metrics,
            closed: AtomicBool::new(false),
            gate: RwLock::new(()),
        })
    }

    /// Record a point signal
    pub fn point(
        &self,
        name: impl Into<String>,
        payload: impl Into<Value>,
        properties: Properties,
    ) -> Result<()> {
        self.signal(name, payload, properties.kind(SignalKind::Point))
    }

    /// Record a metric signal
    pub fn metric(
        &self,
        name: impl Into<String>,
        payload: impl Into<Value>,
        properties: Properties,
    ) -> Result<()> {
        self.signal(name, payload, properties.kind(SignalKind::Metric))
    }

    /// Record a signal
    ///
    /// # Errors
    /// [`ClientError::Closed`] after [`Client::close`]
    pub fn signal(
        &self,
        name: impl Into<String>,
        payload: impl Into<Value>,
        properties: Properties,
    ) -> Result<()> {
        let signal = Signal::new(name, payload).with_properties(properties);
        self.record(signal)
    }

    /// Record a trace
    ///
    /// # Errors
    /// [`ClientError::Closed`] after [`Client::close`]
    pub fn trace(&self, data: impl Into<TraceData>, properties: Properties) -> Result<()> {
        let trace = Trace::new(data).with_properties(properties);
        self.record(trace)
    }

    /// Record a prebuilt signal or trace
    pub fn record(&self, record: impl Into<Record>) -> Result<()> {
        let _open = self.enter()?;

        let record = record.into();
        observability::metrics::record_record_accepted(record.label());

        if let Some(batch) = self.accumulator.add(record) {
            self.dispatch(batch);
        }
        Ok(())
    }

    /// Send pending records
    ///
    /// With `soft`, the pending batch is only sent once it is full or older
    /// than the linger time.
    ///
    /// # Errors
    /// [`ClientError::Closed`] after [`Client::close`]
    pub fn flush(&self, soft: bool) -> Result<()> {
        let _open = self.enter()?;
        if let Some(batch) = self.accumulator.flush(soft) {
            self.dispatch(batch);
        }
        Ok(())
    }

    /// Send pending records, wait for every queued batch, release the transport
    ///
    /// Idempotent. Blocks the calling thread until the sender pool drains.
    #[instrument(name = "client_close", skip(self))]
    pub fn close(&self) {
        {
            // Waits for in-flight record/flush calls, later ones see `closed`
            let _gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }

            if let Some(batch) = self.accumulator.flush(false) {
                self.dispatch(batch);
            }
        }

        let pool = self.lock_pool().take();
        if let Some(pool) = pool {
            pool.shutdown();
        }

        self.transport.close();

        let snapshot = self.metrics.snapshot();
        info!(
            delivered = snapshot.delivered,
            failed = snapshot.failed(),
            "Client closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Records waiting in the current batch
    pub fn pending(&self) -> usize {
        self.accumulator.len()
    }

    /// Delivery counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Underlying transport, for direct sends
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read guard kept for the whole call, so `close` cannot slip in between
    fn enter(&self) -> Result<RwLockReadGuard<'_, ()>> {
        let guard = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(guard)
    }

    fn dispatch(&self, batch: Batch) {
        let batch_len = batch.len();
        match self.lock_pool().as_ref() {
            Some(pool) => {
                if pool.submit(batch) {
                    debug!(batch_len, "Batch queued");
                }
            }
            None => {
                self.metrics.inc_dropped();
                warn!(batch_len, "Client closed, batch dropped");
            }
        }
    }

    fn lock_pool(&self) -> MutexGuard<'_, Option<SenderPool>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Client<T>
where
    T: Transport + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.is_closed() {
            debug!("Client dropped while open, closing");
            self.close();
        }
    }
}
