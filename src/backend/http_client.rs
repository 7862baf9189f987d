//! Thin reqwest wrapper with user agent resolution and request timing.

use std::time::{Duration, Instant};

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

const USER_AGENT: &str = "SmartRead/0.3 (technical paper reader)";

/// Resolve user agent from config value.
/// - None or empty => default SmartRead user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// HTTP client used for every outbound JSON call.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    bearer_token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client.
    ///
    /// `timeout` of `None` means requests may wait indefinitely.
    pub fn new(user_agent_config: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let user_agent = resolve_user_agent(user_agent_config);
        let mut builder = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .brotli(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            bearer_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: String) -> Self {
        self.bearer_token = Some(token);
        self
    }

    /// POST a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> std::result::Result<HttpResponse, reqwest::Error> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let duration = start.elapsed();

        debug!(
            "POST {} -> {} in {}ms",
            url,
            response.status().as_u16(),
            duration.as_millis()
        );

        Ok(HttpResponse {
            status: response.status(),
            response,
        })
    }
}

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    response: Response,
}

impl HttpResponse {
    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get response body as text.
    pub async fn text(self) -> std::result::Result<String, reqwest::Error> {
        self.response.text().await
    }
}
