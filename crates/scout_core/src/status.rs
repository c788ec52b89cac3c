use std::fmt;

use crate::IndicatorSet;

/// Resolution state of one candidate page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Requested by the host, not yet dispatched.
    Pending,
    /// Dispatched; a retrieval attempt is running.
    Loading,
    /// Host not permitted, or the network refused the request.
    Blocked,
    TimedOut,
    HttpError(u16),
    /// Body could not be decoded as text.
    Unsupported,
    /// Page loaded but mentions none of the languages.
    NotFound,
    Found(IndicatorSet),
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending | Status::Loading)
    }

    /// Terminal status for a completed classification.
    pub fn from_indicators(set: IndicatorSet) -> Self {
        if set.is_empty() {
            Status::NotFound
        } else {
            Status::Found(set)
        }
    }

    /// Symbol shown in the host UI.
    pub fn symbol(&self) -> String {
        match self {
            Status::Pending | Status::Loading => "◌".to_string(),
            Status::Blocked => "⛔".to_string(),
            Status::TimedOut => "💤".to_string(),
            Status::HttpError(code) => format!("HTTP {code}"),
            Status::Unsupported => "❓".to_string(),
            Status::NotFound => "❌".to_string(),
            Status::Found(set) => set.to_flags(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}
