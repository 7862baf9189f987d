//! Mistral OCR client for the direct rendering path.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{OcrDocument, OcrError};
use crate::backend::HttpClient;

/// Configuration for the OCR provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// API base URL (default: https://api.mistral.ai)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// OCR model (default: mistral-ocr-latest)
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; `MISTRAL_API_KEY` overrides it.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.mistral.ai".to_string()
}
fn default_model() -> String {
    "mistral-ocr-latest".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl OcrConfig {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentRef<'a>,
    include_image_base64: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "document_url")]
struct DocumentRef<'a> {
    document_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    fn describe(&self) -> Option<String> {
        [&self.message, &self.detail]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
    }
}

/// Client for the OCR provider.
pub struct OcrClient {
    config: OcrConfig,
    http: HttpClient,
}

impl OcrClient {
    /// Fails with [`OcrError::MissingApiKey`] when no key is configured, so no
    /// request is ever sent unauthenticated.
    pub fn new(config: OcrConfig, http: HttpClient) -> Result<Self, OcrError> {
        let api_key = config.api_key().ok_or(OcrError::MissingApiKey)?.to_string();
        Ok(Self {
            config,
            http: http.with_bearer_token(api_key),
        })
    }

    /// Run OCR over the document at `document_url`.
    pub async fn process(&self, document_url: &str) -> Result<OcrDocument, OcrError> {
        let request = OcrRequest {
            model: &self.config.model,
            document: DocumentRef { document_url },
            include_image_base64: true,
        };

        let url = format!("{}/v1/ocr", self.config.endpoint.trim_end_matches('/'));
        info!("Running OCR on {}", document_url);
        let resp = self
            .http
            .post_json(&url, &request)
            .await
            .map_err(|e| OcrError::Connection(e.to_string()))?;

        let status = resp.status;
        let success = resp.is_success();
        let body = resp
            .text()
            .await
            .map_err(|e| OcrError::Connection(e.to_string()))?;

        if !success {
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.describe())
                .unwrap_or(body);
            warn!("OCR request failed with HTTP {}", status);
            return Err(OcrError::Api(format!("HTTP {}: {}", status, detail)));
        }

        let document: OcrDocument =
            serde_json::from_str(&body).map_err(|e| OcrError::Parse(e.to_string()))?;
        if document.pages.is_empty() {
            return Err(OcrError::EmptyResponse);
        }

        info!(
            "OCR returned {} pages ({})",
            document.pages.len(),
            document.model
        );
        Ok(document)
    }
}
