use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::engine_warn;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use scout_core::OriginPolicy;
use url::Url;

use crate::{EngineSettings, TransportError, TransportErrorKind, TransportResponse};

const REDIRECT_LIMIT: usize = 5;

/// Network capability used by the direct-fetch strategy: one GET, bounded by `timeout`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, address: &Url, timeout: Duration)
        -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    max_bytes: u64,
}

/// Raised from the redirect policy; recovered from the reqwest error chain.
#[derive(Debug, thiserror::Error)]
#[error("redirect to non-permitted host {host}")]
struct ForbiddenRedirect {
    host: String,
}

impl ReqwestTransport {
    /// Every redirect hop is checked against `policy`; a hop to a host it does
    /// not permit is never requested.
    pub fn new(
        settings: &EngineSettings,
        policy: Arc<OriginPolicy>,
    ) -> Result<Self, TransportError> {
        let redirect = reqwest::redirect::Policy::custom(move |attempt| {
            if !policy.permits(attempt.url()) {
                let host = attempt.url().host_str().unwrap_or_default().to_string();
                engine_warn!("Refusing redirect to {}", attempt.url());
                return attempt.error(ForbiddenRedirect { host });
            }
            if attempt.previous().len() >= REDIRECT_LIMIT {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(redirect)
            .build()
            .map_err(|err| TransportError::new(TransportErrorKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            max_bytes: settings.max_body_bytes,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        address: &Url,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(address.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        // Error pages are never classified, so their bodies are not read.
        if !response.status().is_success() {
            return Ok(TransportResponse {
                status,
                content_type,
                body: Vec::new(),
            });
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(TransportError::new(
                    TransportErrorKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(TransportError::new(
                    TransportErrorKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(forbidden) = cause.downcast_ref::<ForbiddenRedirect>() {
            return TransportError::new(
                TransportErrorKind::Forbidden {
                    host: forbidden.host.clone(),
                },
                err.to_string(),
            );
        }
        source = cause.source();
    }
    if err.is_timeout() {
        return TransportError::new(TransportErrorKind::Timeout, err.to_string());
    }
    TransportError::new(TransportErrorKind::Network, err.to_string())
}
