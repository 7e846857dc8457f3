//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 累积器 → 发送池 → HTTP 传输 的完整链路
//! - 本地模拟 ingestion 服务 (无需外网)
//! - 配置文件驱动的客户端构建

#[cfg(test)]
mod fake_ingestion;

#[cfg(test)]
mod contract_tests {
    use contracts::{Batch, Record, Signal, Value};

    #[test]
    fn test_batch_wire_format() {
        let batch = Batch::from_records(vec![Record::from(Signal::new(
            "test",
            Value::empty_map(),
        ))]);
        assert_eq!(
            serde_json::to_string(&batch).unwrap(),
            r#"[{"signal_name":"test","payload":{}}]"#
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::Duration;

    use client::{Client, ClientConfig, Properties, Value, USER_AGENT};
    use config_loader::ConfigLoader;
    use contracts::TransportConfig;

    use crate::fake_ingestion::FakeIngestion;

    fn fast_transport() -> TransportConfig {
        TransportConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 10,
            timeout_ms: 2_000,
            connect_timeout_ms: 1_000,
            ..Default::default()
        }
    }

    fn config(server: &FakeIngestion, max_batch_size: usize) -> ClientConfig {
        ClientConfig::new("42")
            .with_app_name("test")
            .with_base_url(server.base_url())
            .with_max_batch_size(max_batch_size)
            .with_transport(fast_transport())
    }

    /// max_batch_size = 1: one signal is one request
    #[test]
    fn test_single_signal_batch() {
        let server = FakeIngestion::start([202]);
        let client = Client::new(config(&server, 1)).unwrap();

        client
            .signal("test", Value::empty_map(), Properties::new())
            .unwrap();
        client.close();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);

        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/batches");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("user-agent"), Some(USER_AGENT));
        assert_eq!(request.header("x-api-token"), Some("42"));
        assert_eq!(request.header("x-app-name"), Some("test"));
        assert_eq!(
            request.json(),
            serde_json::json!([{"signal_name": "test", "payload": {}}])
        );

        let metrics = client.metrics();
        assert_eq!(metrics.delivered, 1);
        assert_eq!(metrics.failed(), 0);
    }

    /// max_batch_size = 50: the 50th signal releases the batch
    #[test]
    fn test_fifty_signal_batch() {
        let server = FakeIngestion::start([200]);
        let client = Client::new(config(&server, 50)).unwrap();

        for i in 0..49 {
            client.point("sq.test", i, Properties::new()).unwrap();
        }
        assert_eq!(client.metrics().submitted, 0);
        assert_eq!(client.pending(), 49);

        client.point("sq.test", 49, Properties::new()).unwrap();
        assert_eq!(client.metrics().submitted, 1);
        assert_eq!(client.pending(), 0);

        client.close();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let body = requests[0].json();
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 50);
        assert_eq!(items[0]["type"], "point");
        assert_eq!(items[49]["payload"], 49);
    }

    /// 401: the producer already returned, the outcome is only counted
    #[test]
    fn test_authentication_rejected_is_not_raised() {
        let server = FakeIngestion::start([401]);
        let client = Client::new(config(&server, 1)).unwrap();

        let result = client.signal("test", Value::empty_map(), Properties::new());
        assert!(result.is_ok());
        client.close();

        let metrics = client.metrics();
        assert_eq!(metrics.auth_rejected, 1);
        assert_eq!(metrics.delivered, 0);
        // authentication failures are final
        assert_eq!(server.requests().len(), 1);
    }

    /// 500 on every attempt: the retry budget runs out
    #[test]
    fn test_retry_budget_exhausted() {
        let server = FakeIngestion::start([500]);
        let client = Client::new(config(&server, 1)).unwrap();

        assert!(client
            .signal("test", Value::empty_map(), Properties::new())
            .is_ok());
        client.close();

        assert_eq!(server.requests().len(), 3);
        let metrics = client.metrics();
        assert_eq!(metrics.transport_failures, 1);
        assert_eq!(metrics.delivered, 0);
    }

    #[test]
    fn test_transient_failure_recovers() {
        let server = FakeIngestion::start([503, 502, 200]);
        let client = Client::new(config(&server, 1)).unwrap();

        client.metric("sq.test", 1.5, Properties::new()).unwrap();
        client.close();

        assert_eq!(server.requests().len(), 3);
        assert_eq!(client.metrics().delivered, 1);
    }

    #[test]
    fn test_data_rejected_and_unexpected_status() {
        let server = FakeIngestion::start([422, 506]);
        let client = Client::new(config(&server, 1).with_max_workers(1)).unwrap();

        client.signal("a", 1, Properties::new()).unwrap();
        client.signal("b", 2, Properties::new()).unwrap();
        client.close();

        let metrics = client.metrics();
        assert_eq!(metrics.data_rejected, 1);
        assert_eq!(metrics.unexpected_status, 1);
        assert_eq!(server.requests().len(), 2);
    }

    #[test]
    fn test_session_key_header() {
        let server = FakeIngestion::start([200]);
        let config = ClientConfig::new("session-42")
            .with_app_name("ignored")
            .with_session_token()
            .with_base_url(server.base_url())
            .with_max_batch_size(1)
            .with_transport(fast_transport());
        let client = Client::new(config).unwrap();

        client.signal("s", 1, Properties::new()).unwrap();
        client.close();

        let request = &server.requests()[0];
        assert_eq!(request.header("x-session-key"), Some("session-42"));
        assert_eq!(request.header("x-api-token"), None);
        assert_eq!(request.header("x-app-name"), None);
    }

    #[test]
    fn test_invalid_bytes_are_escaped_on_the_wire() {
        let server = FakeIngestion::start([200]);
        let client = Client::new(config(&server, 1)).unwrap();

        client
            .signal(
                "s",
                Value::bytes(b"bar\xe9".to_vec()),
                Properties::new().actor(Value::bytes(b"foo".to_vec())),
            )
            .unwrap();
        client.close();

        let body = server.requests()[0].json();
        assert_eq!(body[0]["payload"], "bar\\xe9");
        assert_eq!(body[0]["actor"], "foo");
    }

    #[test]
    fn test_close_sends_pending_batch() {
        let server = FakeIngestion::start([200]);
        let client = Client::new(config(&server, 50)).unwrap();

        client
            .trace(serde_json::json!({"step": 1}), Properties::new())
            .unwrap();
        client.signal("s", 1, Properties::new()).unwrap();
        assert!(server.requests().is_empty());

        client.close();

        let body = server.requests()[0].json();
        assert_eq!(
            body,
            serde_json::json!([
                {"data": {"step": 1}},
                {"signal_name": "s", "payload": 1}
            ])
        );
    }

    #[test]
    fn test_dropping_client_drains_queue() {
        let server = FakeIngestion::start([200]);
        {
            let client = Client::new(config(&server, 2)).unwrap();
            for i in 0..6 {
                client.signal("s", i, Properties::new()).unwrap();
            }
        }
        assert_eq!(server.requests().len(), 3);
    }

    #[test]
    fn test_client_from_config_file() {
        let server = FakeIngestion::start([200]);
        let content = format!(
            r#"
token = "42"
app_name = "from-file"
base_url = "{}"

[batching]
max_batch_size = 2
linger_ms = 60000

[transport]
max_attempts = 2
initial_backoff_ms = 1
max_backoff_ms = 5
"#,
            server.base_url()
        );
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        let client = Client::new(config).unwrap();
        client.signal("a", 1, Properties::new()).unwrap();
        client.signal("b", 2, Properties::new()).unwrap();
        client.close();

        let request = &server.requests()[0];
        assert_eq!(request.header("x-app-name"), Some("from-file"));
        assert_eq!(request.json().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_linger_releases_batch_on_soft_flush() {
        let server = FakeIngestion::start([200]);
        let config = config(&server, 50).with_linger_time(Duration::from_millis(300));
        let client = Client::new(config).unwrap();

        client.signal("s", 1, Properties::new()).unwrap();
        client.flush(true).unwrap();
        assert_eq!(client.metrics().submitted, 0);

        std::thread::sleep(Duration::from_millis(350));
        client.flush(true).unwrap();
        assert_eq!(client.metrics().submitted, 1);

        client.close();
        assert_eq!(server.requests().len(), 1);
    }
}

#[cfg(test)]
mod transport_tests {
    use contracts::{DeliveryError, Headers, Signal, Trace, Transport, TransportConfig};
    use contracts::{Batch, Endpoint};
    use transport::HttpTransport;

    use crate::fake_ingestion::FakeIngestion;

    fn transport(server: &FakeIngestion) -> HttpTransport {
        let headers = Headers::new()
            .with(contracts::USER_AGENT, "tests/1.0")
            .with(contracts::API_TOKEN, "42");
        let config = TransportConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..Default::default()
        };
        HttpTransport::new(&server.base_url(), None, headers, config).unwrap()
    }

    #[tokio::test]
    async fn test_send_signal_with_override_headers() {
        let server = FakeIngestion::start([202]);
        let transport = transport(&server);

        let overrides = Headers::new().with("X-Request-Id", "abc");
        transport
            .send_signal(&Signal::new("sq.direct", 1), &overrides)
            .await
            .unwrap();

        let request = &server.requests()[0];
        assert_eq!(request.path, "/signals");
        assert_eq!(request.header("x-request-id"), Some("abc"));
        assert_eq!(request.header("x-api-token"), Some("42"));
        assert_eq!(
            request.json(),
            serde_json::json!({"signal_name": "sq.direct", "payload": 1})
        );
    }

    #[tokio::test]
    async fn test_override_headers_do_not_leak() {
        let server = FakeIngestion::start([200]);
        let transport = transport(&server);

        transport
            .send_trace(
                &Trace::new(serde_json::json!([])),
                &Headers::new().with("X-Once", "1"),
            )
            .await
            .unwrap();
        transport
            .send_trace(&Trace::new(serde_json::json!([])), &Headers::new())
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].path, "/traces");
        assert_eq!(requests[0].header("x-once"), Some("1"));
        assert_eq!(requests[1].header("x-once"), None);
    }

    #[tokio::test]
    async fn test_status_outcomes() {
        let cases = [
            (422, DeliveryError::DataRejected),
            (401, DeliveryError::AuthenticationRejected { status: 401 }),
            (403, DeliveryError::AuthenticationRejected { status: 403 }),
            (506, DeliveryError::UnexpectedStatus(506)),
            (404, DeliveryError::UnexpectedStatus(404)),
        ];

        for (status, expected) in cases {
            let server = FakeIngestion::start([status]);
            let result = transport(&server).send_batch(&Batch::new()).await;
            assert_eq!(result, Err(expected), "status {status}");
            assert_eq!(server.requests().len(), 1, "status {status} retried");
        }
    }

    #[tokio::test]
    async fn test_retry_then_failure() {
        let server = FakeIngestion::start([504]);
        let result = transport(&server).send_batch(&Batch::new()).await;

        match result {
            Err(DeliveryError::TransportFailure { attempts, message }) => {
                assert_eq!(attempts, 3);
                assert!(message.contains("504"), "{message}");
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_raw_send_to_endpoint() {
        let server = FakeIngestion::start([200]);
        let transport = transport(&server);

        transport
            .send(
                Endpoint::Batches,
                bytes::Bytes::from_static(b"[]"),
                &Headers::new(),
            )
            .await
            .unwrap();

        assert_eq!(server.requests()[0].body, b"[]");
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let server = FakeIngestion::start([302, 200]);
        let result = transport(&server).send_batch(&Batch::new()).await;

        assert_eq!(result, Err(DeliveryError::UnexpectedStatus(302)));
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/batches");
    }

    #[tokio::test]
    async fn test_requests_go_through_proxy() {
        let proxy = FakeIngestion::start([200]);
        let transport = HttpTransport::new(
            "http://ingestion.invalid/",
            Some(&proxy.base_url()),
            Headers::new().with(contracts::API_TOKEN, "42"),
            TransportConfig::default(),
        )
        .unwrap();

        transport.send_batch(&Batch::new()).await.unwrap();

        let request = &proxy.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "http://ingestion.invalid/batches");
        assert_eq!(request.header("x-api-token"), Some("42"));
    }

    #[tokio::test]
    async fn test_override_replaces_base_header_regardless_of_case() {
        let server = FakeIngestion::start([200]);
        let transport = transport(&server);

        let overrides = Headers::new()
            .with("x-api-token", "7")
            .with("CONTENT-TYPE", "application/json; charset=utf-8");
        transport
            .send_signal(&Signal::new("s", 1), &overrides)
            .await
            .unwrap();

        let request = &server.requests()[0];
        assert_eq!(request.header("x-api-token"), Some("7"));
        assert_eq!(
            request.header("content-type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_closed_transport() {
        let server = FakeIngestion::start([200]);
        let transport = transport(&server);
        transport.close();

        let result = transport.send_batch(&Batch::new()).await;
        assert_eq!(result, Err(DeliveryError::Closed));
        assert!(server.requests().is_empty());
    }
}
