use engine_logging::{engine_debug, engine_info, engine_warn};
use scout_core::{classify, Status};
use url::Url;

use crate::decode::decode_body;
use crate::transport::Transport;
use crate::{EngineSettings, TransportErrorKind};

/// Result of the direct-fetch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectOutcome {
    /// Final for the task; no escalation.
    Terminal(Status),
    /// Fetched and decoded, but no language mentioned.
    Inconclusive,
    /// The request never got a response (connection refused, DNS, TLS, ...).
    Refused,
}

/// Direct-fetch strategy: one GET, classify the body.
///
/// The whole attempt is bounded by `settings.fetch_timeout`; on expiry the
/// request future is dropped, which aborts it.
pub async fn direct_fetch(
    transport: &dyn Transport,
    address: &Url,
    settings: &EngineSettings,
) -> DirectOutcome {
    let attempt = transport.get(address, settings.fetch_timeout);
    let response = match tokio::time::timeout(settings.fetch_timeout, attempt).await {
        Err(_) => {
            engine_info!("Timeout fetching {}", address);
            return DirectOutcome::Terminal(Status::TimedOut);
        }
        Ok(Err(err)) => {
            return match err.kind {
                TransportErrorKind::Timeout => {
                    engine_info!("Timeout fetching {}: {}", address, err.message);
                    DirectOutcome::Terminal(Status::TimedOut)
                }
                TransportErrorKind::TooLarge { .. } => {
                    engine_warn!("Not classifying {}: {}", address, err);
                    DirectOutcome::Terminal(Status::Unsupported)
                }
                TransportErrorKind::Forbidden { .. } => {
                    engine_warn!("Not following {}: {}", address, err);
                    DirectOutcome::Terminal(Status::Blocked)
                }
                TransportErrorKind::Network => {
                    engine_warn!("Fetching {} failed: {}", address, err.message);
                    DirectOutcome::Refused
                }
            };
        }
        Ok(Ok(response)) => response,
    };

    if !(200..300).contains(&response.status) {
        engine_warn!("Invalid return status for {}: HTTP {}", address, response.status);
        return DirectOutcome::Terminal(Status::HttpError(response.status));
    }

    let text = match decode_body(
        &response.body,
        response.content_type.as_deref(),
        &settings.allowed_content_types,
    ) {
        Ok(text) => text,
        Err(err) => {
            engine_warn!("Body of {} is not text: {}", address, err);
            return DirectOutcome::Terminal(Status::Unsupported);
        }
    };

    let indicators = classify(&text);
    if indicators.is_empty() {
        engine_debug!("No language keywords in fetched {}", address);
        DirectOutcome::Inconclusive
    } else {
        engine_info!("Fetched {} and found {}", address, indicators);
        DirectOutcome::Terminal(Status::Found(indicators))
    }
}
