//! Where headlines come from.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::CacheError;

/// One article as published by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    /// Stable article URL, used as the cache key.
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// Produces the current set of feed items.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedItem>, CacheError>;
}

/// JSON feed over HTTP: `GET <url>` → `[{url, title, text}]`.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, CacheError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| CacheError::Source(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HeadlineSource for HttpFeedSource {
    async fn fetch(&self) -> Result<Vec<FeedItem>, CacheError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CacheError::Source(format!("GET {} failed: {e}", self.url)))?;

        if !resp.status().is_success() {
            return Err(CacheError::Source(format!(
                "GET {} returned {}",
                self.url,
                resp.status()
            )));
        }

        let items: Vec<FeedItem> = resp
            .json()
            .await
            .map_err(|e| CacheError::Source(format!("invalid feed from {}: {e}", self.url)))?;
        debug!(count = items.len(), "Fetched feed items");
        Ok(items)
    }
}
