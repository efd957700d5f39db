/// Selection rules for development volume claims
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::api::ListParams;

use crate::config::ConfigError;

/// Decides which claims in a namespace are development volumes
pub trait VolumeSelector: Send + Sync {
    /// Server-side filter applied when listing claims
    fn list_params(&self) -> ListParams;

    /// Client-side check applied to every listed claim
    fn selects(&self, claim: &PersistentVolumeClaim) -> bool;
}

/// Selects claims carrying a single `key=value` label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    key: String,
    value: String,
}

impl LabelSelector {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for LabelSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidLabel(s.to_string()))?;

        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.contains('=') {
            return Err(ConfigError::InvalidLabel(s.to_string()));
        }

        Ok(Self::new(key, value))
    }
}

impl VolumeSelector for LabelSelector {
    fn list_params(&self) -> ListParams {
        ListParams::default().labels(&self.to_string())
    }

    fn selects(&self, claim: &PersistentVolumeClaim) -> bool {
        claim
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(&self.key))
            .is_some_and(|value| *value == self.value)
    }
}
