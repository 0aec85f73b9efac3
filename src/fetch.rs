//! Network access for pages, dictionaries and widget APIs.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

/// GET a resource as text.
///
/// Relative URLs are resolved against the site; absolute URLs are fetched
/// as given. Non-success statuses are errors.
pub trait Fetcher: Send + Sync + 'static {
    fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

/// GET and deserialize a JSON resource.
pub async fn get_json<T: DeserializeOwned>(fetcher: &dyn Fetcher, url: &str) -> Result<T, FetchError> {
    let body = fetcher.get_text(url).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// `Fetcher` backed by a reqwest client rooted at the site's base URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Self::with_client(client, &config.site_base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        // A trailing slash makes relative joins land inside the base path
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized)
            .with_context(|| format!("Invalid SITE_BASE_URL '{base_url}'"))?;
        Ok(Self { client, base })
    }

    /// Absolute URL for a site-relative or absolute reference.
    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        let relative = url.strip_prefix('/').unwrap_or(url);
        let joined = if url.contains("://") {
            Url::parse(url)
        } else {
            self.base.join(relative)
        };
        joined.map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let target = self.resolve(url)?;
        debug!("GET {}", target);

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(self.fetch(url))
    }
}
