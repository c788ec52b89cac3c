use std::collections::HashSet;

use url::Url;

use crate::{ConfigError, ScoutConfig};

/// Which candidate hosts the scout may contact.
///
/// A host is permitted only when it is both observable (a page the scout is
/// deployed against) and contactable (a host the network layer may address).
/// Built once; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OriginPolicy {
    observable: HashSet<String>,
    contactable: HashSet<String>,
}

impl OriginPolicy {
    pub fn new<O, C>(observable: O, contactable: C) -> Self
    where
        O: IntoIterator,
        O::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            observable: observable
                .into_iter()
                .map(|host| host.as_ref().to_ascii_lowercase())
                .collect(),
            contactable: contactable
                .into_iter()
                .map(|host| host.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ScoutConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.observable_hosts()?,
            config.contactable_host_names()?,
        ))
    }

    pub fn is_permitted(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.observable.contains(&host) && self.contactable.contains(&host)
    }

    /// Addresses without a host are never permitted.
    pub fn permits(&self, address: &Url) -> bool {
        address
            .host_str()
            .is_some_and(|host| self.is_permitted(host))
    }
}
