//! Headline cache shared between the refresh timer and the dispatcher.
//!
//! The pipeline only uses the [`HeadlineCache`] contract; locking is the
//! cache's own business.

pub mod cache;
pub mod refresher;
pub mod source;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CacheError;

pub use cache::NewsCache;
pub use refresher::spawn_cache_refresher;
pub use source::{FeedItem, HeadlineSource, HttpFeedSource};

/// Default retention of cached articles (24 hours).
pub const ARTICLE_TTL_HOURS: i64 = 24;

/// A digest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub id: u32,
    pub title: String,
    pub added_at: DateTime<Utc>,
}

/// Full text of one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub headline: String,
    pub text: String,
}

/// Thread-safe headline store.
#[async_trait]
pub trait HeadlineCache: Send + Sync {
    /// Pull fresh headlines from the source. Safe to call on a timer.
    async fn refresh(&self) -> Result<(), CacheError>;

    /// Current headlines in cache order.
    async fn headlines(&self) -> Vec<Headline>;

    /// Look up one article by id.
    async fn article(&self, id: u32) -> Result<Article, CacheError>;
}
