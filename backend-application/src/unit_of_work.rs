// Transaction boundary shared by every economy entry point

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::{CachedView, LedgerStore, LedgerTx, ViewCache};
use backend_domain::{EconomyError, EconomyResult, Uid};
use serde::Serialize;
use tracing::{debug, warn};

use crate::services::views::{encode_view, store_view, ViewFill};

/// One open ledger transaction plus the cache fields it has dirtied.
///
/// Services never commit; the caller that opened the unit decides with
/// [`UnitOfWork::finish`]. Cache fields registered through
/// [`UnitOfWork::invalidate`] are deleted only after a successful commit.
/// Views read from the store are cached through [`UnitOfWork::fill_view`]
/// after the invalidations, and only if no writer invalidated them since
/// they were read. Dropping an unfinished unit rolls the transaction back.
pub struct UnitOfWork {
    tx: Option<Box<dyn LedgerTx>>,
    cache: Arc<dyn ViewCache>,
    dirty: BTreeSet<(Uid, CachedView)>,
    fills: Vec<ViewFill>,
}

impl UnitOfWork {
    pub async fn begin(store: &dyn LedgerStore, cache: Arc<dyn ViewCache>) -> EconomyResult<Self> {
        let tx = store.begin().await?;
        Ok(Self {
            tx: Some(tx),
            cache,
            dirty: BTreeSet::new(),
            fills: Vec::new(),
        })
    }

    pub fn tx(&mut self) -> EconomyResult<&mut (dyn LedgerTx + 'static)> {
        match self.tx.as_deref_mut() {
            Some(tx) => Ok(tx),
            None => Err(EconomyError::Persistence(anyhow::anyhow!(
                "unit of work already finished"
            ))),
        }
    }

    pub fn invalidate(&mut self, uid: Uid, view: CachedView) {
        self.dirty.insert((uid, view));
    }

    /// Queues `value` for the cache. `generation` is the one seen by the
    /// cache read that missed; `None` skips the fill.
    pub fn fill_view<T: Serialize>(
        &mut self,
        uid: Uid,
        view: CachedView,
        value: &T,
        generation: Option<u64>,
        ttl: Duration,
    ) {
        let Some(generation) = generation else {
            return;
        };
        if let Some(bytes) = encode_view(uid, view, value) {
            self.fills.push(ViewFill {
                uid,
                view,
                bytes,
                generation,
                ttl,
            });
        }
    }

    /// Commits on `Ok` and then drops the dirtied cache fields; rolls back on
    /// `Err` and hands the error back untouched.
    pub async fn finish<T>(mut self, result: EconomyResult<T>) -> EconomyResult<T> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                return Err(EconomyError::Persistence(anyhow::anyhow!(
                    "unit of work already finished"
                )))
            }
        };
        match result {
            Ok(value) => {
                tx.commit().await?;
                self.flush_invalidations().await;
                self.flush_fills().await;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn flush_invalidations(&mut self) {
        let dirty = std::mem::take(&mut self.dirty);
        let mut by_user: Vec<(Uid, Vec<CachedView>)> = Vec::new();
        for (uid, view) in dirty {
            match by_user.last_mut() {
                Some((last, views)) if *last == uid => views.push(view),
                _ => by_user.push((uid, vec![view])),
            }
        }
        for (uid, views) in by_user {
            match self.cache.delete_views(uid, &views).await {
                Ok(()) => debug!(%uid, ?views, "cache views invalidated"),
                Err(err) => warn!(%uid, ?views, error = %err, "cache invalidation failed"),
            }
        }
    }

    async fn flush_fills(&mut self) {
        for fill in std::mem::take(&mut self.fills) {
            store_view(self.cache.as_ref(), &fill).await;
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("unit of work dropped without finish, rolling back");
        }
    }
}
