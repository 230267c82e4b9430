// Redis-backed view cache

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, Script};
use tracing::{debug, info};

use backend_domain::ports::{CachedView, ViewCache, ViewEntry};
use backend_domain::{CacheConfig, Uid};

/// Lifetime of a generation counter after its last bump. Far above any view
/// TTL, so a counter cannot lapse under a fill that is still in flight.
const GENERATION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

// KEYS[1] view, KEYS[2] generation; ARGV: expected generation, value, ttl.
const SET_IF_GENERATION: &str = r#"
local current = redis.call('GET', KEYS[2]) or '0'
if current ~= ARGV[1] then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

/// Each view of a user is its own string key with its own TTL, next to a
/// generation counter that invalidations increment.
pub struct RedisViewCache {
    conn: ConnectionManager,
    key_prefix: String,
    set_if_generation: Script,
}

impl RedisViewCache {
    pub async fn connect(config: &CacheConfig) -> anyhow::Result<Self> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("redis_url is not configured"))?;
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!(prefix = %config.key_prefix, "connected to redis view cache");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            set_if_generation: Script::new(SET_IF_GENERATION),
        })
    }

    fn view_key(&self, uid: Uid, view: CachedView) -> String {
        format!("{}:user:{}:view:{}", self.key_prefix, uid, view.field())
    }

    fn generation_key(&self, uid: Uid, view: CachedView) -> String {
        format!("{}:user:{}:gen:{}", self.key_prefix, uid, view.field())
    }
}

#[async_trait]
impl ViewCache for RedisViewCache {
    async fn get_view(&self, uid: Uid, view: CachedView) -> anyhow::Result<ViewEntry> {
        let mut conn = self.conn.clone();
        let (value, generation): (Option<Vec<u8>>, Option<u64>) = redis::cmd("MGET")
            .arg(self.view_key(uid, view))
            .arg(self.generation_key(uid, view))
            .query_async(&mut conn)
            .await?;
        Ok(ViewEntry {
            value,
            generation: generation.unwrap_or(0),
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
        let mut conn = self.conn.clone();
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);
        let stored: i64 = self
            .set_if_generation
            .key(self.view_key(uid, view))
            .key(self.generation_key(uid, view))
            .arg(generation)
            .arg(value)
            .arg(seconds)
            .invoke_async(&mut conn)
            .await?;
        debug!(%uid, field = view.field(), generation, stored, "conditional view write");
        Ok(stored == 1)
    }

    async fn delete_views(&self, uid: Uid, views: &[CachedView]) -> anyhow::Result<()> {
        if views.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for view in views {
            let generation_key = self.generation_key(uid, *view);
            pipe.incr(&generation_key, 1)
                .ignore()
                .expire(&generation_key, GENERATION_TTL_SECS)
                .ignore()
                .del(self.view_key(uid, *view))
                .ignore();
        }
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_cache() -> Option<RedisViewCache> {
        let Ok(url) = std::env::var("HOARD_TEST_REDIS_URL") else {
            eprintln!("HOARD_TEST_REDIS_URL not set, skipping redis test");
            return None;
        };
        let prefix = format!("hoard-test-{}", chrono::Utc::now().timestamp_micros());
        let cache = RedisViewCache::connect(&CacheConfig {
            redis_url: Some(url),
            key_prefix: prefix,
        })
        .await
        .expect("connect to redis");
        Some(cache)
    }

    async fn ttl(cache: &RedisViewCache, key: String) -> i64 {
        let mut conn = cache.conn.clone();
        redis::cmd("TTL").arg(key).query_async(&mut conn).await.unwrap()
    }

    #[tokio::test]
    async fn each_view_keeps_its_own_expiry() {
        let Some(cache) = test_cache().await else {
            return;
        };
        let uid = Uid(10_000);
        cache
            .set_view(uid, CachedView::Backpack, b"b", Duration::from_secs(60), 0)
            .await
            .unwrap();
        cache
            .set_view(uid, CachedView::Wallets, b"w", Duration::from_secs(3600), 0)
            .await
            .unwrap();
        // Rewriting one view leaves the other's expiry alone.
        cache
            .set_view(uid, CachedView::Wallets, b"w2", Duration::from_secs(3600), 0)
            .await
            .unwrap();

        assert!(ttl(&cache, cache.view_key(uid, CachedView::Backpack)).await <= 60);
        assert!(ttl(&cache, cache.view_key(uid, CachedView::Wallets)).await > 60);
    }

    #[tokio::test]
    async fn stale_generation_is_refused_after_invalidation() {
        let Some(cache) = test_cache().await else {
            return;
        };
        let uid = Uid(10_000);
        let seen = cache.get_view(uid, CachedView::Backpack).await.unwrap();
        assert_eq!(seen, ViewEntry::default());

        cache
            .delete_views(uid, &[CachedView::Backpack])
            .await
            .unwrap();
        let stored = cache
            .set_view(uid, CachedView::Backpack, b"stale", Duration::from_secs(60), seen.generation)
            .await
            .unwrap();
        assert!(!stored);

        let current = cache.get_view(uid, CachedView::Backpack).await.unwrap();
        assert_eq!(current.value, None);
        assert_eq!(current.generation, 1);
        assert!(cache
            .set_view(uid, CachedView::Backpack, b"fresh", Duration::from_secs(60), 1)
            .await
            .unwrap());
        let wallets = cache.get_view(uid, CachedView::Wallets).await.unwrap();
        assert_eq!(wallets.generation, 0);
    }
}
