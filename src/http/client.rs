//! HTTP client with soft-error retries
//!
//! Provides the client every connector goes through. It handles:
//! - Status classification (404/401/403/400) before any body inspection
//! - Detection of error envelopes returned with a usable status
//! - Fixed-interval retries of transient errors
//! - Non-raising probes for callers that can live with a missing resource

use super::types::{FetchReport, HttpClientConfig, RequestConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Outcome of a single GET attempt
enum Attempt {
    Body(Value),
    Transient(String),
}

/// Authenticated HTTP client
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
}

impl HttpClient {
    /// Create a new HTTP client without authentication
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Self::with_auth(config, AuthConfig::None)
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            config,
            authenticator: Authenticator::new(auth_config),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a single request and classify its status
    ///
    /// 404, 401, 403 and 400 are turned into errors here. Any other status is
    /// handed back so the caller can look at the body.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let mut req = self.client.request(method.clone(), url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(ref body) = config.body {
            req = req.json(body);
        } else if let Some(ref data) = config.bytes {
            req = req.body(data.clone());
        }

        req = self.authenticator.apply(req);

        debug!("{} {}", method, url);
        let response = req.send().await?;
        classify_status(url, response).await
    }

    /// Issue a HEAD request, used to open a session
    pub async fn head(&self, url: &str) -> Result<Response> {
        let response = self.request(Method::HEAD, url, RequestConfig::new()).await?;
        ensure_success(response).await
    }

    /// GET a JSON document, retrying transient remote errors
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        Ok(self.fetch_with_report(url).await?.body)
    }

    /// GET a JSON document, mapping not-found to `None`
    pub async fn probe_json(&self, url: &str) -> Result<Option<Value>> {
        match self.fetch_with_report(url).await {
            Ok(report) => Ok(Some(report.body)),
            Err(Error::NotFound { url }) => {
                warn!("Resource not found, continuing: {url}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// GET a JSON document and report how many attempts it took
    pub async fn fetch_with_report(&self, url: &str) -> Result<FetchReport> {
        let policy = self.config.retry;
        let mut attempts = 0;
        let mut backoff = Duration::ZERO;

        loop {
            attempts += 1;
            let message = match self.attempt_json(url).await {
                Ok(Attempt::Body(body)) => {
                    return Ok(FetchReport {
                        body,
                        attempts,
                        backoff,
                    })
                }
                Ok(Attempt::Transient(message)) => message,
                Err(e) if e.is_retryable() && attempts < policy.max_attempts => e.to_string(),
                Err(e) => return Err(e),
            };

            if attempts >= policy.max_attempts {
                error!("Giving up on {url} after {attempts} attempts: {message}");
                return Err(Error::RemoteService { message, attempts });
            }

            warn!(
                "Remote error on {}, attempt {}/{}, retrying in {:?}: {}",
                url, attempts, policy.max_attempts, policy.delay, message
            );
            tokio::time::sleep(policy.delay).await;
            backoff += policy.delay;
        }
    }

    /// GET a raw body
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.request(Method::GET, url, RequestConfig::new()).await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?)
    }

    /// POST and decode the JSON answer, if there is one
    pub async fn post(&self, url: &str, config: RequestConfig) -> Result<Option<Value>> {
        let response = self.request(Method::POST, url, config).await?;
        let response = ensure_success(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn attempt_json(&self, url: &str) -> Result<Attempt> {
        let response = self.request(Method::GET, url, RequestConfig::new()).await?;
        let status = response.status();
        let text = response.text().await?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(Error::http_status(status.as_u16(), text));
            }
            Err(e) => return Err(Error::malformed(format!("body is not JSON: {e}"))),
        };

        if let Some(envelope) = body.get("error") {
            return match envelope.get("message").and_then(|m| m.get("value")) {
                Some(Value::String(message)) => Ok(Attempt::Transient(message.clone())),
                Some(other) => Ok(Attempt::Transient(other.to_string())),
                None => {
                    error!("Remote service error on {url}: {envelope}");
                    Err(Error::RemoteFatal {
                        body: envelope.to_string(),
                    })
                }
            };
        }

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), text));
        }

        Ok(Attempt::Body(body))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("auth", &self.authenticator.config().scheme())
            .finish_non_exhaustive()
    }
}

/// Map the statuses that never carry a usable body to errors
async fn classify_status(url: &str, response: Response) -> Result<Response> {
    let url = url.to_string();
    match response.status() {
        StatusCode::NOT_FOUND => Err(Error::NotFound { url }),
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized { url }),
        StatusCode::FORBIDDEN => Err(Error::Forbidden { url }),
        StatusCode::BAD_REQUEST => {
            let body = response.text().await.unwrap_or_default();
            Err(Error::BadRequest { url, body })
        }
        _ => Ok(response),
    }
}

/// Turn any remaining non-success status into an error
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::http_status(status.as_u16(), body))
}
