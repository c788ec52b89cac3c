use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("no observable page pattern is outside the contactable hosts; cannot tell which page embeds the scout")]
    NoEmbedderPage,
    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,
}

/// Static scout configuration, read once at startup.
///
/// `observable_pages` are address patterns of pages the scout is deployed
/// against (the embedding page plus the candidate sites); `contactable_hosts`
/// are the hosts the network layer may address. Every field has a default so
/// a partial file is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub observable_pages: Vec<String>,
    pub contactable_hosts: Vec<String>,
    pub max_concurrent: usize,
    pub page_load_timeout_ms: u64,
    pub inter_attempt_delay_ms: u64,
    pub fetch_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_body_bytes: u64,
    pub allowed_content_types: Vec<String>,
    /// Escalate to isolated rendering when the direct fetch fails at the network level.
    pub escalate_on_network_error: bool,
    /// Base URL of a headless rendering service used for isolated rendering.
    pub render_endpoint: Option<String>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            observable_pages: vec![
                "http://radarr.intra/*".to_string(),
                "https://thepiratebay.org/*".to_string(),
                "www.torrentleech.org/*".to_string(),
                "uindex.org/*".to_string(),
            ],
            contactable_hosts: vec![
                "thepiratebay.org".to_string(),
                "www.torrentleech.org".to_string(),
                "uindex.org".to_string(),
            ],
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            page_load_timeout_ms: 5_000,
            inter_attempt_delay_ms: 1_000,
            fetch_timeout_ms: 15_000,
            connect_timeout_ms: 10_000,
            max_body_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
                "text/plain".to_string(),
            ],
            escalate_on_network_error: false,
            render_endpoint: None,
        }
    }
}

impl ScoutConfig {
    /// Checks every pattern parses and the limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.observable_hosts()?;
        self.contactable_host_names()?;
        Ok(())
    }

    pub fn observable_hosts(&self) -> Result<Vec<String>, ConfigError> {
        self.observable_pages
            .iter()
            .map(|pattern| host_of_pattern(pattern, true))
            .collect()
    }

    pub fn contactable_host_names(&self) -> Result<Vec<String>, ConfigError> {
        self.contactable_hosts
            .iter()
            .map(|pattern| host_of_pattern(pattern, false))
            .collect()
    }

    /// Origin of the page embedding the scout: the first observable page
    /// whose host the scout is not allowed to contact.
    ///
    /// Isolated contexts address their result message to this origin.
    pub fn embedder_origin(&self) -> Result<String, ConfigError> {
        let contactable = self.contactable_host_names()?;
        for pattern in &self.observable_pages {
            let host = host_of_pattern(pattern, true)?;
            if contactable.contains(&host) {
                continue;
            }
            let url = parse_pattern(&pattern.replace('*', ""), pattern)?;
            return Ok(url.origin().ascii_serialization());
        }
        Err(ConfigError::NoEmbedderPage)
    }
}

/// Host named by a match or connect pattern.
///
/// Patterns without a scheme are read as `http://`. With `wildcard` set, the
/// first `*` is replaced by a placeholder label so patterns such as
/// `uindex.org/*` still parse.
pub fn host_of_pattern(pattern: &str, wildcard: bool) -> Result<String, ConfigError> {
    let expanded = if wildcard {
        pattern.replacen('*', "example", 1)
    } else {
        pattern.to_string()
    };
    let url = parse_pattern(&expanded, pattern)?;
    url.host_str()
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern has no host".to_string(),
        })
}

fn parse_pattern(candidate: &str, pattern: &str) -> Result<Url, ConfigError> {
    let with_scheme = if candidate.contains("://") {
        candidate.to_string()
    } else {
        format!("http://{candidate}")
    };
    Url::parse(&with_scheme).map_err(|err| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}
