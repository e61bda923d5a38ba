//! Transport seam between the map engine and the network.
//!
//! The engine only ever issues GET requests described by a
//! [`ResourceRequest`]; [`HttpFetcher`] performs them with `reqwest`, and
//! tests substitute their own implementation.

use async_trait::async_trait;
use bytes::Bytes;
use radar_common::{RadarError, RadarResult};
use reqwest::Client;
use tracing::{debug, instrument};
use wms_protocol::ResourceRequest;

use crate::config::ServiceEndpoints;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("geomet-radar/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Perform the request and return the response body.
    async fn fetch_bytes(&self, request: &ResourceRequest) -> RadarResult<Bytes>;

    /// Perform the request and return the body as UTF-8 text.
    async fn fetch_text(&self, request: &ResourceRequest) -> RadarResult<String> {
        let body = self.fetch_bytes(request).await?;
        String::from_utf8(body.to_vec()).map_err(|e| RadarError::FetchFailed {
            url: request.url.clone(),
            message: format!("response is not UTF-8: {}", e),
        })
    }
}

/// [`ResourceFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(endpoints: &ServiceEndpoints) -> RadarResult<Self> {
        let client = Client::builder()
            .user_agent(endpoints.user_agent.clone())
            .timeout(endpoints.request_timeout())
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RadarError::InternalError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn request_kind(request: &ResourceRequest) -> String {
    request.operation().unwrap_or("GET").to_string()
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> RadarError {
    if err.is_timeout() {
        RadarError::Timeout(url.to_string())
    } else {
        RadarError::FetchFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(url = %request.url, kind = ?request.operation()))]
    async fn fetch_bytes(&self, request: &ResourceRequest) -> RadarResult<Bytes> {
        let kind = request_kind(request);
        metrics::counter!("radar_fetch_total", "kind" => kind.clone()).increment(1);

        let result = async {
            let response = self
                .client
                .get(&request.url)
                .query(&request.params)
                .send()
                .await
                .map_err(|e| map_reqwest_error(&request.url, e))?
                .error_for_status()
                .map_err(|e| map_reqwest_error(&request.url, e))?;
            response
                .bytes()
                .await
                .map_err(|e| map_reqwest_error(&request.url, e))
        }
        .await;

        match &result {
            Ok(body) => debug!(bytes = body.len(), "Fetched resource"),
            Err(e) => {
                metrics::counter!("radar_fetch_failures_total", "kind" => kind).increment(1);
                debug!(error = %e, "Fetch failed");
            }
        }
        result
    }
}
