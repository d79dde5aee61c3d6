use crate::{Lookup, LookupError, LookupRequest};
use async_trait::async_trait;
use core_types::config::ApiConfig;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_MS: u64 = 750;
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_MS: u64 = 50;

/// HTTP client for the directory REST API.
///
/// Each source maps to a collection endpoint (`/companies/`, `/investors/`,
/// `/people/`) filtered with `search` and capped with `page_size`.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    request_timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl Default for DirectoryClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retries: DEFAULT_RETRIES,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }

    pub fn from_config(cfg: &ApiConfig) -> Self {
        let client = Self::new(cfg.base_url.as_str())
            .with_request_timeout(Duration::from_millis(cfg.timeout_ms))
            .with_retries(cfg.retries)
            .with_backoff(Duration::from_millis(cfg.backoff_ms));
        if cfg.token.is_empty() {
            client
        } else {
            client.with_token(cfg.token.as_str())
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, req: &LookupRequest) -> String {
        format!("{}/{}/", self.base_url, req.kind.path_segment())
    }

    async fn request(&self, req: &LookupRequest) -> Result<Value, LookupError> {
        let url = self.endpoint(req);
        let mut attempt = 0;
        let mut last_err: Option<LookupError> = None;

        while attempt <= self.retries {
            match tokio::time::timeout(self.request_timeout, self.fetch_once(&url, req)).await {
                Ok(Ok(payload)) => return Ok(payload),
                Ok(Err(e)) => {
                    warn!(
                        request_id = %req.id,
                        source = %req.kind,
                        "lookup attempt {} failed: {e}",
                        attempt + 1
                    );
                    let retryable = e.is_retryable();
                    last_err = Some(e);
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    warn!(
                        request_id = %req.id,
                        source = %req.kind,
                        "lookup attempt {} timed out",
                        attempt + 1
                    );
                    last_err = Some(LookupError::Timeout {
                        attempts: attempt + 1,
                    });
                }
            }

            attempt += 1;
            if attempt <= self.retries {
                sleep(self.backoff * attempt).await;
            }
        }

        Err(last_err.unwrap_or(LookupError::Timeout { attempts: attempt }))
    }

    async fn fetch_once(&self, url: &str, req: &LookupRequest) -> Result<Value, LookupError> {
        let limit = req.limit.to_string();
        let mut builder = self
            .http
            .get(url)
            .query(&[("search", req.query.as_str()), ("page_size", limit.as_str())]);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        debug!(request_id = %req.id, source = %req.kind, %status, "lookup response");

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Array(Vec::new()));
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Lookup for DirectoryClient {
    async fn lookup(&self, req: &LookupRequest) -> Result<Value, LookupError> {
        self.request(req).await
    }
}
