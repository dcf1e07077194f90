use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const MAX_VARIANTS_PER_PATH: usize = 64;

struct CachedPage {
    payload: Value,
    stored_at: Instant,
}

/**
 * Rendered page payloads keyed by path, then by query string
 * @dev entries expire after `ttl`; actions evict a path early with `revalidate`
 */
pub struct PageCache {
    ttl: Duration,
    pages: RwLock<HashMap<String, HashMap<String, CachedPage>>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, path: &str, query: &str) -> Option<Value> {
        {
            let pages = self.pages.read().await;
            let page = pages.get(path)?.get(query)?;
            if page.stored_at.elapsed() < self.ttl {
                return Some(page.payload.clone());
            }
        }
        let mut pages = self.pages.write().await;
        if let Some(variants) = pages.get_mut(path) {
            variants.retain(|_, page| page.stored_at.elapsed() < self.ttl);
            if variants.is_empty() {
                pages.remove(path);
            }
        }
        None
    }

    /**
     * Store a payload, sweeping expired entries first
     * @dev a path holds at most MAX_VARIANTS_PER_PATH query strings; the oldest goes first
     */
    pub async fn insert(&self, path: &str, query: &str, payload: Value) {
        if self.ttl.is_zero() {
            return;
        }
        let mut pages = self.pages.write().await;
        pages.retain(|_, variants| {
            variants.retain(|_, page| page.stored_at.elapsed() < self.ttl);
            !variants.is_empty()
        });
        let variants = pages.entry(path.to_string()).or_default();
        if variants.len() >= MAX_VARIANTS_PER_PATH && !variants.contains_key(query) {
            let oldest = variants
                .iter()
                .min_by_key(|(_, page)| page.stored_at)
                .map(|(query, _)| query.clone());
            if let Some(oldest) = oldest {
                variants.remove(&oldest);
            }
        }
        variants.insert(
            query.to_string(),
            CachedPage {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every cached variant of `path`
    pub async fn revalidate(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        let evicted = self.pages.write().await.remove(path);
        if let Some(variants) = evicted {
            tracing::debug!("Revalidated {} ({} cached variants)", path, variants.len());
        }
    }

    #[cfg(test)]
    async fn variant_count(&self, path: &str) -> usize {
        self.pages.read().await.get(path).map_or(0, |variants| variants.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_what_was_stored() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/", "page=1", json!({ "threads": [] })).await;
        assert_eq!(cache.get("/", "page=1").await, Some(json!({ "threads": [] })));
        assert_eq!(cache.get("/", "page=2").await, None);
    }

    #[tokio::test]
    async fn revalidate_drops_all_queries_of_a_path() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/", "", json!(1)).await;
        cache.insert("/", "page=2", json!(2)).await;
        cache.insert("/thread/abc", "", json!(3)).await;

        cache.revalidate("/").await;

        assert_eq!(cache.get("/", "").await, None);
        assert_eq!(cache.get("/", "page=2").await, None);
        assert_eq!(cache.get("/thread/abc", "").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = PageCache::new(Duration::from_millis(10));
        cache.insert("/", "", json!(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("/", "").await, None);
    }

    #[tokio::test]
    async fn expired_entries_are_removed() {
        let cache = PageCache::new(Duration::from_millis(5));
        for i in 0..1000 {
            cache.insert("/", &format!("x={}", i), json!(i)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.insert("/", "page=1", json!("fresh")).await;
        assert_eq!(cache.variant_count("/").await, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("/", "page=1").await, None);
        assert_eq!(cache.variant_count("/").await, 0);
    }

    #[tokio::test]
    async fn variants_per_path_are_capped() {
        let cache = PageCache::new(Duration::from_secs(60));
        for i in 0..MAX_VARIANTS_PER_PATH + 10 {
            cache.insert("/", &format!("x={}", i), json!(i)).await;
        }
        assert_eq!(cache.variant_count("/").await, MAX_VARIANTS_PER_PATH);
        // older variants made room for the newest
        let last = format!("x={}", MAX_VARIANTS_PER_PATH + 9);
        assert_eq!(cache.get("/", &last).await, Some(json!(MAX_VARIANTS_PER_PATH + 9)));
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = PageCache::new(Duration::ZERO);
        cache.insert("/", "", json!(1)).await;
        assert_eq!(cache.get("/", "").await, None);
    }
}
