//! Tag-based view cache.
//!
//! Rendered views (carts, orders, catalog pages) are cached under a string
//! key and labelled with one or more [`ViewTag`]s. Invalidating a tag evicts
//! every entry carrying it, so the next read refetches from the commerce API.
//!
//! Each tag also has a generation, bumped on every invalidation. Readers
//! take a [`Snapshot`] before fetching and hand it back to
//! [`ViewCache::insert`]; a view fetched across an invalidation of any of
//! its tags is dropped instead of cached.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mercado_core::ProductId;
use moka::future::Cache;
use tracing::debug;

use crate::commerce::{Order, Page, Product, ShopCart, Taxonomy};

/// Upper bound on cached views.
const MAX_VIEWS: u64 = 10_000;

/// Label attached to cached views.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewTag {
    Cart,
    ActiveOrder,
    Product(ProductId),
    Collection(String),
    Catalog,
}

impl fmt::Display for ViewTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cart => f.write_str("cart"),
            Self::ActiveOrder => f.write_str("active-order"),
            Self::Product(id) => write!(f, "product:{id}"),
            Self::Collection(slug) => write!(f, "collection:{slug}"),
            Self::Catalog => f.write_str("catalog"),
        }
    }
}

/// Tags invalidated by every successful cart mutation.
pub const CART_MUTATION_TAGS: [ViewTag; 2] = [ViewTag::Cart, ViewTag::ActiveOrder];

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CachedView {
    Cart(Box<ShopCart>),
    Order(Option<Box<Order>>),
    Product(Box<Product>),
    Products(Page<Product>),
    Taxonomies(Page<Taxonomy>),
}

/// Combined generation of a set of tags, taken before a remote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Snapshot(u64);

#[derive(Debug, Clone)]
struct Entry {
    view: CachedView,
    tags: Arc<[ViewTag]>,
    stamp: u64,
}

/// Tag membership and generations.
///
/// Members map each key to the stamp of the insert that indexed it, so a
/// late removal notice for a replaced entry leaves the newer one indexed.
#[derive(Debug, Default)]
struct TagIndex {
    members: HashMap<ViewTag, HashMap<String, u64>>,
    generations: HashMap<ViewTag, u64>,
    next_stamp: u64,
}

impl TagIndex {
    fn generation(&self, tags: &[ViewTag]) -> u64 {
        tags.iter()
            .map(|tag| self.generations.get(tag).copied().unwrap_or_default())
            .fold(0, u64::wrapping_add)
    }

    fn add(&mut self, key: &str, tags: &[ViewTag]) -> u64 {
        self.next_stamp = self.next_stamp.wrapping_add(1);
        for tag in tags {
            self.members
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string(), self.next_stamp);
        }
        self.next_stamp
    }

    fn prune(&mut self, key: &str, tags: &[ViewTag], stamp: u64) {
        for tag in tags {
            if let Some(keys) = self.members.get_mut(tag) {
                if keys.get(key) == Some(&stamp) {
                    keys.remove(key);
                }
                if keys.is_empty() {
                    self.members.remove(tag);
                }
            }
        }
    }

    fn take(&mut self, tag: &ViewTag) -> Vec<String> {
        let generation = self.generations.entry(tag.clone()).or_default();
        *generation = generation.wrapping_add(1);
        self.members
            .remove(tag)
            .map(|keys| keys.into_keys().collect())
            .unwrap_or_default()
    }
}

fn lock(index: &Mutex<TagIndex>) -> MutexGuard<'_, TagIndex> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared view cache; clones share storage.
#[derive(Clone)]
pub struct ViewCache {
    views: Cache<String, Entry>,
    index: Arc<Mutex<TagIndex>>,
}

impl ViewCache {
    /// Create a cache whose entries expire after `ttl`.
    ///
    /// Entries leaving the cache for any reason (expiry, capacity,
    /// replacement or invalidation) are dropped from the tag index.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let index = Arc::new(Mutex::new(TagIndex::default()));
        let listener_index = Arc::clone(&index);
        Self {
            views: Cache::builder()
                .max_capacity(MAX_VIEWS)
                .time_to_live(ttl)
                .eviction_listener(move |key: Arc<String>, entry: Entry, _cause| {
                    lock(&listener_index).prune(&key, &entry.tags, entry.stamp);
                })
                .build(),
            index,
        }
    }

    /// Look up a cached view.
    pub async fn get(&self, key: &str) -> Option<CachedView> {
        self.views.get(key).await.map(|entry| entry.view)
    }

    /// Current generation of `tags`. Take it before fetching a view.
    pub fn snapshot(&self, tags: &[ViewTag]) -> Snapshot {
        Snapshot(lock(&self.index).generation(tags))
    }

    /// Cache a view under `key`, labelled with `tags`.
    ///
    /// Returns `false` without caching if any of `tags` was invalidated
    /// since `snapshot` was taken.
    pub async fn insert(
        &self,
        key: impl Into<String>,
        view: CachedView,
        tags: &[ViewTag],
        snapshot: Snapshot,
    ) -> bool {
        let key = key.into();
        let stamp = {
            let mut index = lock(&self.index);
            if index.generation(tags) != snapshot.0 {
                debug!(key = %key, "Skipping view fetched across an invalidation");
                return false;
            }
            index.add(&key, tags)
        };

        let entry = Entry {
            view,
            tags: tags.into(),
            stamp,
        };
        self.views.insert(key.clone(), entry).await;

        // An invalidation may have taken the index between the check and
        // the insert above.
        let raced = {
            let mut index = lock(&self.index);
            let raced = index.generation(tags) != snapshot.0;
            if raced {
                index.prune(&key, tags, stamp);
            }
            raced
        };
        if raced {
            self.views.invalidate(&key).await;
        }
        !raced
    }

    /// Evict a single view.
    pub async fn remove(&self, key: &str) {
        self.views.invalidate(key).await;
    }

    /// Evict every view carrying `tag`.
    pub async fn invalidate_tag(&self, tag: &ViewTag) {
        let keys = lock(&self.index).take(tag);
        debug!(tag = %tag, views = keys.len(), "Invalidating view tag");
        for key in keys {
            self.views.invalidate(&key).await;
        }
    }

    /// Evict every view carrying any of `tags`.
    pub async fn invalidate_tags(&self, tags: &[ViewTag]) {
        for tag in tags {
            self.invalidate_tag(tag).await;
        }
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use mercado_core::CartId;

    use super::*;

    fn cart(id: &str) -> CachedView {
        CachedView::Cart(Box::new(ShopCart {
            id: CartId::new(id),
            items: Vec::new(),
            for_delivery: false,
            for_pickup: false,
            shipment_address: None,
            external_reference: None,
        }))
    }

    async fn put(cache: &ViewCache, key: &str, view: CachedView, tags: &[ViewTag]) -> bool {
        let snapshot = cache.snapshot(tags);
        cache.insert(key, view, tags, snapshot).await
    }

    fn indexed_keys(cache: &ViewCache) -> usize {
        lock(&cache.index).members.values().map(HashMap::len).sum()
    }

    #[tokio::test]
    async fn test_invalidate_tag_evicts_tagged_views_only() {
        let cache = ViewCache::default();
        put(&cache, "cart:c1", cart("c1"), &[ViewTag::Cart]).await;
        put(&cache, "cart:c2", cart("c2"), &[ViewTag::Cart]).await;
        put(
            &cache,
            "taxonomies",
            CachedView::Taxonomies(Page::empty()),
            &[ViewTag::Catalog],
        )
        .await;

        cache.invalidate_tag(&ViewTag::Cart).await;

        assert!(cache.get("cart:c1").await.is_none());
        assert!(cache.get("cart:c2").await.is_none());
        assert!(cache.get("taxonomies").await.is_some());
    }

    #[tokio::test]
    async fn test_view_with_several_tags_evicted_by_either() {
        let cache = ViewCache::default();
        let product = ProductId::new("p1");
        put(
            &cache,
            "products::cafe:1",
            CachedView::Products(Page::empty()),
            &[ViewTag::Catalog, ViewTag::Collection("cafe".to_string())],
        )
        .await;

        cache.invalidate_tag(&ViewTag::Product(product)).await;
        assert!(cache.get("products::cafe:1").await.is_some());

        cache
            .invalidate_tag(&ViewTag::Collection("cafe".to_string()))
            .await;
        assert!(cache.get("products::cafe:1").await.is_none());
    }

    #[tokio::test]
    async fn test_cart_mutation_tags() {
        let cache = ViewCache::default();
        put(&cache, "cart:c1", cart("c1"), &[ViewTag::Cart]).await;
        put(
            &cache,
            "active-order:s1",
            CachedView::Order(None),
            &[ViewTag::ActiveOrder],
        )
        .await;

        cache.invalidate_tags(&CART_MUTATION_TAGS).await;

        assert!(cache.get("cart:c1").await.is_none());
        assert!(cache.get("active-order:s1").await.is_none());
    }

    #[tokio::test]
    async fn test_remove_evicts_single_view() {
        let cache = ViewCache::default();
        put(&cache, "active-order:s1", CachedView::Order(None), &[ViewTag::ActiveOrder]).await;
        put(&cache, "active-order:s2", CachedView::Order(None), &[ViewTag::ActiveOrder]).await;

        cache.remove("active-order:s1").await;

        assert!(cache.get("active-order:s1").await.is_none());
        assert!(cache.get("active-order:s2").await.is_some());
    }

    #[tokio::test]
    async fn test_expired_views_leave_the_tag_index() {
        let cache = ViewCache::new(Duration::from_millis(50));
        for page in 1..=3 {
            put(
                &cache,
                &format!("products:espresso::{page}"),
                CachedView::Products(Page::empty()),
                &[ViewTag::Catalog],
            )
            .await;
        }
        assert_eq!(indexed_keys(&cache), 3);

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.views.run_pending_tasks().await;

        assert_eq!(cache.views.entry_count(), 0);
        assert_eq!(indexed_keys(&cache), 0);
        assert!(lock(&cache.index).members.is_empty());
    }

    #[tokio::test]
    async fn test_replaced_view_stays_indexed() {
        let cache = ViewCache::default();
        put(&cache, "cart:c1", cart("c1"), &[ViewTag::Cart]).await;
        put(&cache, "cart:c1", cart("c1"), &[ViewTag::Cart]).await;
        cache.views.run_pending_tasks().await;

        assert_eq!(indexed_keys(&cache), 1);
        cache.invalidate_tag(&ViewTag::Cart).await;
        assert!(cache.get("cart:c1").await.is_none());
    }

    #[tokio::test]
    async fn test_insert_after_invalidation_is_dropped() {
        let cache = ViewCache::default();
        let snapshot = cache.snapshot(&[ViewTag::Cart]);

        cache.invalidate_tags(&CART_MUTATION_TAGS).await;

        let cached = cache
            .insert("cart:c1", cart("c1"), &[ViewTag::Cart], snapshot)
            .await;
        assert!(!cached);
        assert!(cache.get("cart:c1").await.is_none());
        assert_eq!(indexed_keys(&cache), 0);
    }

    #[tokio::test]
    async fn test_unrelated_invalidation_does_not_block_insert() {
        let cache = ViewCache::default();
        let snapshot = cache.snapshot(&[ViewTag::Catalog]);

        cache.invalidate_tag(&ViewTag::Cart).await;

        let cached = cache
            .insert(
                "taxonomies",
                CachedView::Taxonomies(Page::empty()),
                &[ViewTag::Catalog],
                snapshot,
            )
            .await;
        assert!(cached);
        assert!(cache.get("taxonomies").await.is_some());
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(ViewTag::ActiveOrder.to_string(), "active-order");
        assert_eq!(ViewTag::Product(ProductId::new("p9")).to_string(), "product:p9");
    }
}
