use crate::response::ApiResponse;
use anyhow::Context as _;
use gale_instruments::{OperationRecord, Reporter};
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the proxy credential on write requests.
const API_KEY_HEADER: &str = "X-API-Key";

/// Per-request timeout. The runner never retries, so a hung request costs one
/// agent at most this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Claude Proxy API that reports every request it makes.
///
/// Each call is timed from send to the last body byte and recorded against
/// its operation name, so the built-in `request_duration` and
/// `request_failed` metrics cover exactly the traffic this client generates.
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct ProxyClient {
    base_url: String,
    api_key: String,
    inner: reqwest::Client,
    reporter: Arc<Reporter>,
}

impl ProxyClient {
    /// `base_url` must be an absolute URL; paths are appended to it verbatim,
    /// so a trailing slash is trimmed rather than treated as a base path.
    pub fn new(base_url: &str, api_key: &str, reporter: Arc<Reporter>) -> anyhow::Result<Self> {
        url::Url::parse(base_url).with_context(|| format!("Invalid target URL: {base_url}"))?;

        let inner = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            inner,
            reporter,
        })
    }

    /// GET a path relative to the base URL, without credentials.
    pub async fn get(&self, path: &str) -> anyhow::Result<ApiResponse> {
        let request = self.inner.get(self.endpoint(path));
        self.send(path, request).await
    }

    /// GET with the API key attached, recorded under `operation_id` instead
    /// of the raw path. Use this for paths that embed identifiers, which
    /// would otherwise turn every request into its own operation.
    pub async fn get_authed(&self, operation_id: &str, path: &str) -> anyhow::Result<ApiResponse> {
        let request = self
            .inner
            .get(self.endpoint(path))
            .header(API_KEY_HEADER, &self.api_key);
        self.send(operation_id, request).await
    }

    /// POST a JSON body to a path relative to the base URL. Sets
    /// `Content-Type: application/json` and the API key header.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<ApiResponse> {
        let request = self
            .inner
            .post(self.endpoint(path))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body);
        self.send(path, request).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        operation_id: &str,
        request: reqwest::RequestBuilder,
    ) -> anyhow::Result<ApiResponse> {
        let record = OperationRecord::new(operation_id);

        let outcome = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(ApiResponse::new(status, body))
        }
        .await;

        match outcome {
            Ok(response) => {
                // Error statuses still produced a response; the duration is
                // real and belongs in the latency distribution.
                self.reporter
                    .add_operation(record.finish(!response.status().is_success()));
                Ok(response)
            }
            Err(e) => {
                self.reporter.add_operation(record.finish(true));
                log::debug!("Request to {operation_id} failed: {e}");
                Err(e).with_context(|| format!("Request to {operation_id} failed"))
            }
        }
    }
}
