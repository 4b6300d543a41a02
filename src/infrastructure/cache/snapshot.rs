use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use parking_lot::RwLock;

use crate::{entities::gallery::GalleryDocument, errors::AppError};

pub type GallerySnapshot = Arc<Vec<GalleryDocument>>;

#[derive(Debug)]
struct CachedSnapshot {
    loaded_at: Instant,
    documents: GallerySnapshot,
}

/// Time-bounded copy of the full gallery set, shared by the read and write
/// paths. Writers call [`SnapshotCache::invalidate`] after every successful
/// create or delete. A zero TTL disables caching.
///
/// A load that straddles an invalidation is returned to its caller but not
/// cached.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    generation: AtomicU64,
    slot: RwLock<Option<CachedSnapshot>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        SnapshotCache {
            ttl,
            generation: AtomicU64::new(0),
            slot: RwLock::new(None),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached snapshot while fresh, otherwise runs `load` and
    /// caches its result. Load failures are not cached.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<GallerySnapshot, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<GalleryDocument>, AppError>>,
    {
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let documents = Arc::new(load().await?);

        if !self.ttl.is_zero() {
            let mut slot = self.slot.write();
            if self.generation.load(Ordering::Acquire) == generation {
                *slot = Some(CachedSnapshot {
                    loaded_at: Instant::now(),
                    documents: Arc::clone(&documents),
                });
            }
        }

        Ok(documents)
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
    }

    fn fresh(&self) -> Option<GallerySnapshot> {
        if self.ttl.is_zero() {
            return None;
        }

        self.slot
            .read()
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.documents))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    async fn load_counting(counter: &AtomicUsize) -> Result<Vec<GalleryDocument>, AppError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    #[tokio::test]
    async fn serves_from_cache_until_invalidated() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate();
        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_always_reloads() {
        let cache = SnapshotCache::disabled();
        let loads = AtomicUsize::new(0);

        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_racing_an_invalidation_is_not_cached() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        cache
            .get_or_load(|| async {
                cache.invalidate();
                Ok(Vec::new())
            })
            .await
            .unwrap();

        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = SnapshotCache::new(Duration::from_secs(60));

        let err = cache
            .get_or_load(|| async { Err(AppError::fetch("store offline")) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FetchError(_)));

        let loads = AtomicUsize::new(0);
        cache.get_or_load(|| load_counting(&loads)).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
