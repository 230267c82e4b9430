use std::time::Duration;

use async_trait::async_trait;

use crate::value_objects::Uid;

/// Per-user read views memoized in the cache. Each view is one field of the
/// user's cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CachedView {
    Backpack,
    Wallets,
}

impl CachedView {
    pub fn field(&self) -> &'static str {
        match self {
            CachedView::Backpack => "backpack",
            CachedView::Wallets => "wallets",
        }
    }
}

/// One read of a cached view. `generation` counts the invalidations of the
/// view; a fill computed after this read is only stored while it is current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewEntry {
    pub value: Option<Vec<u8>>,
    pub generation: u64,
}

/// Side-channel cache. Never authoritative: a miss is an entry without a
/// value and any error is treated by callers as a miss.
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn get_view(&self, uid: Uid, view: CachedView) -> anyhow::Result<ViewEntry>;
    /// Stores `value` only if the view is still at `generation`. Returns
    /// whether the value was stored.
    async fn set_view(
        &self,
        uid: Uid,
        view: CachedView,
        value: &[u8],
        ttl: Duration,
        generation: u64,
    ) -> anyhow::Result<bool>;
    /// Drops the views and advances their generations.
    async fn delete_views(&self, uid: Uid, views: &[CachedView]) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
}
