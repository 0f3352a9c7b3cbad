//! HTTP access to the reference source

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::markup::{parse_detail, parse_listing};
use super::{MonsterSource, SourceConfig, SourceError, SourceRow};
use crate::names::source_slug;
use crate::statblock::ScrapedDetail;

/// Reference source reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    config: SourceConfig,
}

impl HttpSource {
    /// Create a source client with the configured timeout and user agent
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    /// Detail page address for a creature name
    pub fn detail_url(&self, name: &str) -> String {
        self.config.detail_url.replace("{slug}", &source_slug(name))
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Reference source error: {} for {}", status, url);
            return Err(SourceError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

impl MonsterSource for HttpSource {
    async fn fetch_listing(&self) -> Result<Vec<SourceRow>, SourceError> {
        let body = self.get_text(&self.config.listing_url).await?;
        let rows = parse_listing(&body)?;
        debug!("Listing has {} rows", rows.len());
        Ok(rows)
    }

    async fn fetch_detail(&self, name: &str) -> Result<ScrapedDetail, SourceError> {
        let url = self.detail_url(name);
        let body = self.get_text(&url).await?;
        parse_detail(&body, name, &url, &self.config.asset_base).ok_or_else(|| {
            warn!("No creature block for {} at {}", name, url);
            SourceError::NotFound(name.to_string())
        })
    }
}
