use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::UpstreamConfig;
use crate::errors::{
    fetch_api_result_with_limit, HttpError, Payload, ERR_SERVICE_UNAVAILABLE,
};
use crate::metrics::registry::{UPSTREAM_CALLS_TOTAL, UPSTREAM_ERRORS_TOTAL};

/// JSON API client whose failures come back as [`HttpError`]s
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    base_url: String,
    max_body_bytes: usize,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("her/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_seconds,
            "Initialized upstream client"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` from the upstream and decode its JSON payload.
    ///
    /// Transport failures map to the service-unavailable sentinel; decode
    /// failures, oversized bodies and upstream 5xx responses map as
    /// [`fetch_api_result_with_limit`] does.
    /// On success the upstream status is returned alongside the payload.
    pub async fn get(&self, path: &str) -> Result<(u16, Payload), HttpError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        UPSTREAM_CALLS_TOTAL.with_label_values(&["get"]).inc();
        debug!("Fetching upstream: {}", url);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, "Upstream request failed: {}", e);
                UPSTREAM_ERRORS_TOTAL.with_label_values(&["transport"]).inc();
                return Err(ERR_SERVICE_UNAVAILABLE.clone());
            }
        };

        let status = response.status().as_u16();
        let mut payload: Payload = Payload::default();
        if let Some(err) =
            fetch_api_result_with_limit(response, &mut payload, self.max_body_bytes).await
        {
            let label = if err.status_code() == 503 {
                status.to_string()
            } else {
                "decode".to_string()
            };
            UPSTREAM_ERRORS_TOTAL.with_label_values(&[&label]).inc();
            return Err(err);
        }

        Ok((status, payload))
    }
}
