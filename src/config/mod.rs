/// Run configuration for the reaper
use thiserror::Error;
use url::Url;

use crate::reaper::selector::LabelSelector;

/// Environment variable holding the control-plane access token
pub const TOKEN_ENV: &str = "OKTETO_TOKEN";

/// Environment variable holding the control-plane URL
pub const URL_ENV: &str = "OKTETO_URL";

/// Label carried by every claim provisioned for a development container
pub const DEFAULT_DEV_LABEL: &str = "dev.okteto.com=true";

/// Command that writes a kubeconfig for the control-plane's cluster
pub const DEFAULT_KUBECONFIG_COMMAND: &str = "okteto kubeconfig";

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OKTETO_TOKEN and OKTETO_URL environment variables are required (missing {0})")]
    Missing(&'static str),

    #[error("Invalid OKTETO_URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid label selector '{0}', expected key=value")]
    InvalidLabel(String),
}

/// Everything a single reaper run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Control-plane access token
    pub token: String,

    /// Control-plane URL as given by the operator
    pub api_url: Url,

    /// Label identifying development claims
    pub dev_label: LabelSelector,

    /// Shell command that writes the kubeconfig
    pub kubeconfig_command: String,
}

impl ReaperConfig {
    /// Build the configuration from optional raw values.
    ///
    /// Blank values count as missing.
    pub fn resolve(
        token: Option<String>,
        url: Option<String>,
        dev_label: Option<&str>,
        kubeconfig_command: Option<String>,
    ) -> Result<Self, ConfigError> {
        let token = non_empty(token).ok_or(ConfigError::Missing(TOKEN_ENV))?;
        let url = non_empty(url).ok_or(ConfigError::Missing(URL_ENV))?;
        let api_url = parse_api_url(&url)?;

        let dev_label = dev_label
            .unwrap_or(DEFAULT_DEV_LABEL)
            .parse::<LabelSelector>()?;

        let kubeconfig_command =
            non_empty(kubeconfig_command).unwrap_or_else(|| DEFAULT_KUBECONFIG_COMMAND.to_string());

        Ok(Self {
            token,
            api_url,
            dev_label,
            kubeconfig_command,
        })
    }

    /// Host (and port, when explicit) of the control-plane API
    pub fn api_host(&self) -> String {
        // parse_api_url guarantees a host
        let host = self.api_url.host_str().unwrap_or_default();
        match self.api_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse the control-plane URL, accepting a bare host name
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let parsed = Url::parse(&candidate).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL has no host".to_string(),
        }),
    }
}
