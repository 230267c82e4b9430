// In-process view cache with per-view expiry

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use backend_domain::ports::{CachedView, ViewCache, ViewEntry};
use backend_domain::Uid;

#[derive(Default)]
struct Slot {
    value: Option<(Vec<u8>, Instant)>,
    generation: u64,
}

/// Same contract as the Redis cache: one TTL per view and a generation that
/// every invalidation advances.
#[derive(Default)]
pub struct MemoryViewCache {
    slots: Mutex<HashMap<(Uid, CachedView), Slot>>,
}

impl MemoryViewCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ViewCache for MemoryViewCache {
    async fn get_view(&self, uid: Uid, view: CachedView) -> anyhow::Result<ViewEntry> {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get_mut(&(uid, view)) else {
            return Ok(ViewEntry::default());
        };
        if matches!(&slot.value, Some((_, expires_at)) if *expires_at <= Instant::now()) {
            slot.value = None;
        }
        Ok(ViewEntry {
            value: slot.value.as_ref().map(|(bytes, _)| bytes.clone()),
            generation: slot.generation,
        })
    }

    async fn set_view(
        &self,
        uid: Uid,
        view: CachedView,
        value: &[u8],
        ttl: Duration,
        generation: u64,
    ) -> anyhow::Result<bool> {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry((uid, view)).or_default();
        if slot.generation != generation {
            return Ok(false);
        }
        slot.value = Some((value.to_vec(), Instant::now() + ttl));
        Ok(true)
    }

    async fn delete_views(&self, uid: Uid, views: &[CachedView]) -> anyhow::Result<()> {
        let mut slots = self.slots.lock().await;
        for view in views {
            let slot = slots.entry((uid, *view)).or_default();
            slot.value = None;
            slot.generation = slot.generation.wrapping_add(1);
        }
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn expired_views_read_as_miss() {
        let cache = MemoryViewCache::new();
        let uid = Uid(10_000);
        assert!(cache
            .set_view(uid, CachedView::Wallets, b"[]", Duration::from_millis(0), 0)
            .await
            .unwrap());
        assert_eq!(cache.get_view(uid, CachedView::Wallets).await.unwrap().value, None);
    }

    #[tokio::test]
    async fn delete_drops_only_named_views() {
        let cache = MemoryViewCache::new();
        let uid = Uid(10_000);
        cache.set_view(uid, CachedView::Wallets, b"w", TTL, 0).await.unwrap();
        cache.set_view(uid, CachedView::Backpack, b"b", TTL, 0).await.unwrap();
        cache.delete_views(uid, &[CachedView::Backpack]).await.unwrap();

        let wallets = cache.get_view(uid, CachedView::Wallets).await.unwrap();
        assert_eq!(wallets.value.as_deref(), Some(&b"w"[..]));
        assert_eq!(wallets.generation, 0);
        let backpack = cache.get_view(uid, CachedView::Backpack).await.unwrap();
        assert_eq!(backpack.value, None);
        assert_eq!(backpack.generation, 1);
    }

    #[tokio::test]
    async fn fills_from_before_an_invalidation_are_refused() {
        let cache = MemoryViewCache::new();
        let uid = Uid(10_000);
        let seen = cache.get_view(uid, CachedView::Backpack).await.unwrap();
        cache.delete_views(uid, &[CachedView::Backpack]).await.unwrap();

        let stored = cache
            .set_view(uid, CachedView::Backpack, b"stale", TTL, seen.generation)
            .await
            .unwrap();
        assert!(!stored);
        assert_eq!(cache.get_view(uid, CachedView::Backpack).await.unwrap().value, None);

        let current = cache.get_view(uid, CachedView::Backpack).await.unwrap();
        assert!(cache
            .set_view(uid, CachedView::Backpack, b"fresh", TTL, current.generation)
            .await
            .unwrap());
    }
}
