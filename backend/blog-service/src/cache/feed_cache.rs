use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::metrics::feed::FEED_CACHE_EVENTS;
use crate::models::{Page, PageRequest, Post};

/// Rendered pages of the global feed, keyed by requested page number.
///
/// A page is served from here until its TTL elapses, even if posts were
/// created or edited in the meantime.
#[derive(Clone)]
pub struct GlobalFeedCache {
    cache: Cache<String, Arc<Page<Post>>>,
}

impl GlobalFeedCache {
    pub fn new(ttl: Duration, max_pages: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_pages)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    fn page_key(request: PageRequest) -> String {
        format!("index_page:{}", request.number())
    }

    pub async fn get(&self, request: PageRequest) -> Option<Arc<Page<Post>>> {
        let key = Self::page_key(request);
        match self.cache.get(&key).await {
            Some(page) => {
                debug!(key = %key, "global feed cache HIT");
                FEED_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                Some(page)
            }
            None => {
                debug!(key = %key, "global feed cache MISS");
                FEED_CACHE_EVENTS.with_label_values(&["miss"]).inc();
                None
            }
        }
    }

    pub async fn insert(&self, request: PageRequest, page: Arc<Page<Post>>) {
        self.cache.insert(Self::page_key(request), page).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageWindow;

    fn empty_page() -> Arc<Page<Post>> {
        let window = PageWindow::resolve(PageRequest::first(), 0, 10);
        Arc::new(Page::new(Vec::new(), window))
    }

    #[tokio::test]
    async fn pages_are_cached_per_request() {
        let cache = GlobalFeedCache::new(Duration::from_secs(20), 16);
        cache.insert(PageRequest::first(), empty_page()).await;

        assert!(cache.get(PageRequest::first()).await.is_some());
        assert!(cache.get(PageRequest::new(2)).await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = GlobalFeedCache::new(Duration::from_millis(100), 16);
        cache.insert(PageRequest::first(), empty_page()).await;
        assert!(cache.get(PageRequest::first()).await.is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(cache.get(PageRequest::first()).await.is_none());
    }
}
