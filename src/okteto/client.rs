/// Control-plane API client
use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::Namespace;

const NAMESPACES_ENDPOINT: &str = "api/v0/namespaces";

/// Client for the control-plane REST API
#[derive(Clone)]
pub struct OktetoClient {
    client: Client,
    base_url: Url,
}

impl OktetoClient {
    /// Create a client talking HTTPS to `host`
    pub fn new(host: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(&format!("https://{}/", host))
            .with_context(|| format!("Invalid control-plane host {}", host))?;
        Self::with_base_url(base_url, token)
    }

    /// Create a client rooted at an explicit base URL
    pub fn with_base_url(base_url: Url, token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Invalid API token format")?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request to the API
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self
            .base_url
            .join(endpoint)
            .with_context(|| format!("Invalid endpoint {}", endpoint))?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send GET request")?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .context("Failed to parse API response")
        } else {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed with status {}: {}", status, error_text)
        }
    }

    /// List the namespaces visible to the token
    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let namespaces: Vec<Namespace> = self.get(NAMESPACES_ENDPOINT).await?;
        for ns in &namespaces {
            debug!(
                "Namespace {} ({})",
                ns.name,
                ns.status.as_deref().unwrap_or("unknown status")
            );
        }
        Ok(namespaces)
    }
}
