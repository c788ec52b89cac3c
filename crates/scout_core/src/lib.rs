//! Scout core: pure language classification, status model, origin policy and row bookkeeping.
mod classify;
mod config;
mod language;
mod policy;
mod rows;
mod status;

pub use classify::classify;
pub use config::{host_of_pattern, ConfigError, ScoutConfig, DEFAULT_MAX_CONCURRENT};
pub use language::{FlagParseError, IndicatorSet, Language};
pub use policy::OriginPolicy;
pub use rows::{RowId, RowTable, RowView};
pub use status::Status;
