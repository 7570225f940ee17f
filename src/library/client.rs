//! HTTP client for downloading the catalog document.
//!
//! The download runs under a querying handle so the busy indicator stays
//! lit for as long as the request is in flight.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs;

use super::catalog::Catalog;
use crate::core::SessionState;

/// Fetches catalog documents from a remote endpoint
pub struct CatalogClient {
    client: reqwest::Client,
}

impl CatalogClient {
    /// Create a client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Download a catalog document, validate it and write it to `dest`.
    ///
    /// The previous document is only replaced once the new one parses.
    pub async fn sync(&self, url: &str, dest: &Path, session: &SessionState) -> Result<Catalog> {
        let _querying = session.begin();

        tracing::info!(url, "Fetching catalog");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch catalog from {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Catalog server error ({}): {}", status, text);
        }

        let body = response.text().await.context("Failed to read catalog body")?;
        let catalog = Catalog::parse(&body).context("Downloaded catalog is invalid")?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = dest.with_extension("json.tmp");
        fs::write(&tmp, &body)
            .await
            .with_context(|| format!("Failed to write catalog: {}", tmp.display()))?;
        fs::rename(&tmp, dest)
            .await
            .with_context(|| format!("Failed to replace catalog: {}", dest.display()))?;

        tracing::info!(playlists = catalog.len(), "Catalog saved to {}", dest.display());
        Ok(catalog)
    }
}
