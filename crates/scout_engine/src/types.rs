use std::fmt;
use std::time::Duration;

use scout_core::{ConfigError, RowId, ScoutConfig, Status};

/// Timing and size limits applied by the orchestrator and its strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
    pub page_load_timeout: Duration,
    pub inter_attempt_delay: Duration,
    pub max_body_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub escalate_on_network_error: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&ScoutConfig::default())
    }
}

impl From<&ScoutConfig> for EngineSettings {
    fn from(config: &ScoutConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            page_load_timeout: Duration::from_millis(config.page_load_timeout_ms),
            inter_attempt_delay: Duration::from_millis(config.inter_attempt_delay_ms),
            max_body_bytes: config.max_body_bytes,
            allowed_content_types: config.allowed_content_types.clone(),
            escalate_on_network_error: config.escalate_on_network_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StatusChanged { row_id: RowId, status: Status },
}

/// Raw answer to a single GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// A redirect pointed at a host the origin policy does not permit.
    Forbidden { host: String },
    Network,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            TransportErrorKind::Forbidden { host } => {
                write!(f, "redirect to non-permitted host {host}")
            }
            TransportErrorKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("rendering backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid rendering endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,
    #[error("work queue needs a tokio runtime: {0}")]
    NoRuntime(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("renderer setup failed: {0}")]
    Render(#[from] RenderError),
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
