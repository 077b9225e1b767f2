//! HTTP client for the sync server's REST API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use stockbook_core::sync::{PushRequest, PushResponse, SyncSnapshot, SyncTransport};

use crate::error::{Result, SyncClientError};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the sync server.
///
/// Exposes the two sync endpoints plus a connectivity probe. The engine
/// consumes it through the transport trait; nothing here touches local state.
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: reqwest::Client,
    base_url: String,
}

impl SyncClient {
    /// Create a new sync client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the sync server (e.g., "https://sync.stockbook.app")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(SyncClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            SyncClientError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Fetch the full server export.
    ///
    /// GET /sync/all
    pub async fn fetch_all(&self) -> Result<SyncSnapshot> {
        let url = format!("{}/sync/all", self.base_url);
        debug!("Fetching sync snapshot from {}", url);

        let response = self.client.get(&url).send().await?;
        Self::parse_response(response).await
    }

    /// Push one batch of dirty rows and receive the canonical server copies.
    ///
    /// POST /sync/push
    pub async fn push(&self, request: &PushRequest) -> Result<PushResponse> {
        let url = format!("{}/sync/push", self.base_url);
        debug!(
            "Pushing {} products, {} invoices to {}",
            request.products.len(),
            request.invoices.len(),
            url
        );

        let response = self.client.post(&url).json(request).send().await?;
        Self::parse_response(response).await
    }

    /// Cheap reachability probe; any response counts as reachable.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/sync/all", self.base_url);
        match self.client.head(&url).send().await {
            Ok(response) => {
                debug!("Connectivity probe status: {}", response.status());
                true
            }
            Err(err) => {
                debug!("Connectivity probe failed: {}", err);
                false
            }
        }
    }
}

#[async_trait]
impl SyncTransport for SyncClient {
    async fn fetch_snapshot(&self) -> stockbook_core::Result<SyncSnapshot> {
        Ok(self.fetch_all().await?)
    }

    async fn push_batch(&self, request: PushRequest) -> stockbook_core::Result<PushResponse> {
        Ok(self.push(&request).await?)
    }

    async fn check_connectivity(&self) -> bool {
        self.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;

    fn status_text(status: u16) -> &'static str {
        match status {
            200 => "OK",
            400 => "Bad Request",
            500 => "Internal Server Error",
            _ => "Error",
        }
    }

    /// One-shot scripted HTTP server; captures the raw request it received.
    async fn start_mock_server(
        status: u16,
        body: String,
    ) -> (String, Arc<TokioMutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::new()));
        let captured_clone = Arc::clone(&captured);

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let mut buffer = Vec::new();
            loop {
                let mut chunk = [0_u8; 2048];
                let Ok(read) = stream.read(&mut chunk).await else {
                    return;
                };
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);

                let Some(header_end) =
                    buffer.windows(4).position(|window| window == b"\r\n\r\n")
                else {
                    continue;
                };
                let head = String::from_utf8_lossy(&buffer[..header_end]);
                let content_length = head
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buffer.len() >= header_end + 4 + content_length {
                    break;
                }
            }

            captured_clone
                .lock()
                .await
                .push(String::from_utf8_lossy(&buffer).to_string());

            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                status_text(status),
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.flush().await;
        });

        (format!("http://{}", addr), captured)
    }

    #[tokio::test]
    async fn fetch_all_parses_snapshot_with_either_id_convention() {
        let body = r#"{
            "products": [
                {"id": "srv_1", "name": "Rice", "quantity": 50},
                {"_id": "srv_2", "name": "Beans", "quantity": 20}
            ],
            "invoices": [
                {"_id": "inv_1", "totalAmount": 12.5, "items": [
                    {"productId": "srv_1", "quantity": 2, "price": 3.0}
                ]}
            ]
        }"#;
        let (base_url, captured) = start_mock_server(200, body.to_string()).await;

        let client = SyncClient::new(&base_url);
        let snapshot = client.fetch_all().await.expect("fetch snapshot");

        assert_eq!(snapshot.products.len(), 2);
        assert_eq!(snapshot.products[0].id.as_deref(), Some("srv_1"));
        assert_eq!(snapshot.products[1].id.as_deref(), Some("srv_2"));
        assert_eq!(snapshot.invoices[0].id.as_deref(), Some("inv_1"));
        let items = snapshot.invoices[0].items.as_ref().expect("items");
        assert_eq!(items[0].product_id.as_deref(), Some("srv_1"));

        let requests = captured.lock().await;
        assert!(requests[0].starts_with("GET /sync/all HTTP/1.1"));
    }

    #[tokio::test]
    async fn push_sends_device_id_and_parses_acknowledgements() {
        let response_body = r#"{
            "products": [{"id": "srv_9", "localId": 3, "name": "Rice", "quantity": 50}],
            "invoices": []
        }"#;
        let (base_url, captured) = start_mock_server(200, response_body.to_string()).await;

        let request: PushRequest = serde_json::from_value(serde_json::json!({
            "products": [{"localId": 3, "name": "Rice", "quantity": 50}],
            "invoices": [],
            "deviceId": "device-abc"
        }))
        .expect("request fixture");

        let client = SyncClient::new(&base_url);
        let response = client.push(&request).await.expect("push");

        assert_eq!(response.products[0].id.as_deref(), Some("srv_9"));
        assert_eq!(response.products[0].local_id, Some(3));

        let requests = captured.lock().await;
        assert!(requests[0].starts_with("POST /sync/push HTTP/1.1"));
        assert!(requests[0].contains(r#""deviceId":"device-abc""#));
        assert!(requests[0].contains(r#""localId":3"#));
    }

    #[tokio::test]
    async fn non_success_status_becomes_an_api_error() {
        let (base_url, _captured) =
            start_mock_server(500, r#"{"message":"boom"}"#.to_string()).await;

        let client = SyncClient::new(&base_url);
        let err = client.fetch_all().await.expect_err("should fail");

        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn probe_reports_unreachable_servers() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        drop(listener);

        let client = SyncClient::new(&format!("http://{}", addr));
        assert!(!client.probe().await);
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let client = SyncClient::new("https://sync.example.test/");
        assert_eq!(client.base_url, "https://sync.example.test");
    }
}
