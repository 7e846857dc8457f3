//! HttpTransport - POSTs JSON bodies to the ingestion service

use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    Batch, DeliveryError, Endpoint, Headers, Signal, Trace, Transport, TransportConfig,
    CONTENT_TYPE, JSON_CONTENT_TYPE,
};
use tracing::{debug, instrument, warn};

use crate::codec::JsonCodec;
use crate::error::TransportError;
use crate::retry::{is_retryable_status, Backoff};

const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// HTTP transport with a pooled keep-alive client
///
/// Shared by every sender of a client. `close()` drops the connection pool;
/// any later send fails with [`DeliveryError::Closed`].
pub struct HttpTransport {
    name: String,
    base_url: String,
    headers: Headers,
    config: TransportConfig,
    client: RwLock<Option<reqwest::Client>>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.config.max_attempts)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport
    ///
    /// `headers` are sent with every request; `Content-Type` is always
    /// `application/json`.
    #[instrument(name = "http_transport_new", skip(headers, config))]
    pub fn new(
        base_url: &str,
        proxy_url: Option<&str>,
        headers: Headers,
        config: TransportConfig,
    ) -> Result<Self, TransportError> {
        let base_url = Self::normalize_base_url(base_url)?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(TCP_KEEPALIVE)
            .gzip(true)
            // A 3xx is a final status, never followed
            .redirect(reqwest::redirect::Policy::none());

        if let Some(proxy_url) = proxy_url {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|source| TransportError::InvalidProxy {
                    url: proxy_url.to_string(),
                    source,
                })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        debug!(base_url = %base_url, proxied = proxy_url.is_some(), "HttpTransport ready");

        Ok(Self {
            name: format!("http:{base_url}"),
            base_url,
            headers: headers.with(CONTENT_TYPE, JSON_CONTENT_TYPE),
            config,
            client: RwLock::new(Some(client)),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Full URL of an endpoint
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    pub fn is_closed(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Send a batch to the `batches` endpoint with extra headers
    pub async fn send_batch_with(
        &self,
        batch: &Batch,
        overrides: &Headers,
    ) -> Result<(), DeliveryError> {
        self.send(Endpoint::Batches, JsonCodec::encode(batch), overrides)
            .await
    }

    /// Send one signal to the `signals` endpoint
    pub async fn send_signal(
        &self,
        signal: &Signal,
        overrides: &Headers,
    ) -> Result<(), DeliveryError> {
        self.send(Endpoint::Signals, JsonCodec::encode(signal), overrides)
            .await
    }

    /// Send one trace to the `traces` endpoint
    pub async fn send_trace(&self, trace: &Trace, overrides: &Headers) -> Result<(), DeliveryError> {
        self.send(Endpoint::Traces, JsonCodec::encode(trace), overrides)
            .await
    }

    /// POST an encoded body, retrying transient failures
    ///
    /// 200 and 202 are success. 408, 500, 502, 503, 504 and network errors
    /// are retried until `max_attempts` is spent.
    #[instrument(
        name = "http_transport_send",
        skip(self, body, overrides),
        fields(endpoint = endpoint.path(), bytes = body.len())
    )]
    pub async fn send(
        &self,
        endpoint: Endpoint,
        body: Bytes,
        overrides: &Headers,
    ) -> Result<(), DeliveryError> {
        let client = self.client()?;
        let url = self.url(endpoint);
        let headers = self.headers.merged(overrides);
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = Backoff::from_config(&self.config);
        let mut last_err = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = backoff.next_delay();
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %last_err, "Retrying");
                tokio::time::sleep(delay).await;
            }

            let mut request = client.post(&url).body(body.clone());
            for (name, value) in headers.iter() {
                request = request.header(name, value);
            }

            let started = Instant::now();
            let result = request.send().await;
            observability::metrics::record_send_latency_ms(started.elapsed().as_secs_f64() * 1000.0);

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match status {
                        200 | 202 => {
                            debug!(status, attempt, "Delivered");
                            return Ok(());
                        }
                        s if is_retryable_status(s) => {
                            last_err = format!("status {s}");
                        }
                        s => return Err(DeliveryError::from_status(s)),
                    }
                }
                Err(e) if e.is_builder() => {
                    return Err(DeliveryError::transport_failure(attempt, e.to_string()));
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        warn!(attempts = max_attempts, error = %last_err, "Retry budget exhausted");
        Err(DeliveryError::transport_failure(max_attempts, last_err))
    }

    fn client(&self) -> Result<reqwest::Client, DeliveryError> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DeliveryError::Closed)
    }

    fn normalize_base_url(base_url: &str) -> Result<String, TransportError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed)
            .map_err(|e| TransportError::invalid_base_url(base_url, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::invalid_base_url(
                base_url,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(trimmed.to_string())
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_batch(&self, batch: &Batch) -> Result<(), DeliveryError> {
        self.send_batch_with(batch, &Headers::new()).await
    }

    #[instrument(name = "http_transport_close", skip(self), fields(transport = %self.name))]
    fn close(&self) {
        let previous = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("Connection pool released");
        }
    }
}
