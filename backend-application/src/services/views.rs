// JSON encoding of cached read views

use std::time::Duration;

use backend_domain::ports::{CachedView, ViewCache, ViewEntry};
use backend_domain::Uid;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub enum ViewRead<T> {
    Hit(T),
    /// Generation seen by the read, `None` when the cache was unreachable.
    Miss(Option<u64>),
}

/// A view computed from the store, waiting for its unit of work to end.
pub struct ViewFill {
    pub uid: Uid,
    pub view: CachedView,
    pub bytes: Vec<u8>,
    pub generation: u64,
    pub ttl: Duration,
}

/// Any cache fault or undecodable payload counts as a miss.
pub async fn read_view<T: DeserializeOwned>(
    cache: &dyn ViewCache,
    uid: Uid,
    view: CachedView,
) -> ViewRead<T> {
    match cache.get_view(uid, view).await {
        Ok(ViewEntry {
            value: Some(bytes),
            generation,
        }) => match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(%uid, ?view, "cache hit");
                ViewRead::Hit(value)
            }
            Err(err) => {
                warn!(%uid, ?view, error = %err, "discarding undecodable cached view");
                ViewRead::Miss(Some(generation))
            }
        },
        Ok(ViewEntry {
            value: None,
            generation,
        }) => {
            debug!(%uid, ?view, generation, "cache miss");
            ViewRead::Miss(Some(generation))
        }
        Err(err) => {
            warn!(%uid, ?view, error = %err, "cache read failed");
            ViewRead::Miss(None)
        }
    }
}

pub fn encode_view<T: Serialize>(uid: Uid, view: CachedView, value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(%uid, ?view, error = %err, "failed to encode view for cache");
            None
        }
    }
}

pub async fn store_view(cache: &dyn ViewCache, fill: &ViewFill) {
    match cache
        .set_view(fill.uid, fill.view, &fill.bytes, fill.ttl, fill.generation)
        .await
    {
        Ok(true) => debug!(uid = %fill.uid, view = ?fill.view, "view cached"),
        Ok(false) => debug!(
            uid = %fill.uid,
            view = ?fill.view,
            generation = fill.generation,
            "view invalidated since it was read, not caching"
        ),
        Err(err) => warn!(uid = %fill.uid, view = ?fill.view, error = %err, "cache write failed"),
    }
}
