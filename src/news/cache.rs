//! In-memory headline cache with time-based retention.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::source::HeadlineSource;
use super::{ARTICLE_TTL_HOURS, Article, Headline, HeadlineCache};
use crate::error::CacheError;

#[derive(Debug, Clone)]
struct CacheEntry {
    url: String,
    title: String,
    text: String,
    added_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    next_id: u32,
    entries: BTreeMap<u32, CacheEntry>,
    ids_by_url: HashMap<String, u32>,
}

/// Headline cache keyed by article URL.
///
/// Ids are assigned from 1 in order of first appearance and stay stable
/// across refreshes while the article is retained.
pub struct NewsCache {
    source: Arc<dyn HeadlineSource>,
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl NewsCache {
    pub fn new(source: Arc<dyn HeadlineSource>) -> Self {
        Self::with_ttl(source, Duration::hours(ARTICLE_TTL_HOURS))
    }

    pub fn with_ttl(source: Arc<dyn HeadlineSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: RwLock::new(CacheState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Refresh as if the current time were `now`.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<(), CacheError> {
        // Fetch outside the lock so readers are never blocked on the network.
        let items = self
            .source
            .fetch()
            .await
            .map_err(|e| CacheError::Refresh(e.to_string()))?;

        let mut state = self.state.write().await;
        let mut added = 0;

        for item in items {
            if let Some(id) = state.ids_by_url.get(&item.url).copied() {
                if let Some(entry) = state.entries.get_mut(&id) {
                    entry.title = item.title;
                    entry.text = item.text;
                }
                continue;
            }

            let id = state.next_id;
            state.next_id = state.next_id.wrapping_add(1).max(1);
            state.ids_by_url.insert(item.url.clone(), id);
            state.entries.insert(
                id,
                CacheEntry {
                    url: item.url,
                    title: item.title,
                    text: item.text,
                    added_at: now,
                },
            );
            added += 1;
        }

        let expired: Vec<u32> = state
            .entries
            .iter()
            .filter(|(_, e)| now - e.added_at > self.ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(entry) = state.entries.remove(id) {
                state.ids_by_url.remove(&entry.url);
                debug!(id, url = %entry.url, "Evicted expired article");
            }
        }

        info!(
            added,
            evicted = expired.len(),
            total = state.entries.len(),
            "Headline cache refreshed"
        );
        Ok(())
    }

    fn is_live(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.added_at <= self.ttl
    }
}

#[async_trait]
impl HeadlineCache for NewsCache {
    async fn refresh(&self) -> Result<(), CacheError> {
        self.refresh_at(Utc::now()).await
    }

    async fn headlines(&self) -> Vec<Headline> {
        let now = Utc::now();
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .filter(|(_, e)| self.is_live(e, now))
            .map(|(id, e)| Headline {
                id: *id,
                title: e.title.clone(),
                added_at: e.added_at,
            })
            .collect()
    }

    async fn article(&self, id: u32) -> Result<Article, CacheError> {
        let now = Utc::now();
        let state = self.state.read().await;
        state
            .entries
            .get(&id)
            .filter(|e| self.is_live(e, now))
            .map(|e| Article {
                headline: e.title.clone(),
                text: e.text.clone(),
            })
            .ok_or(CacheError::ArticleNotFound { id })
    }
}
