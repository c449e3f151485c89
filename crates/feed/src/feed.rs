use crate::error::{FeedError, Result};
use crate::signature::QuerySignature;
use crate::state::{FeedSnapshot, FetchPhase, FetchState};
use kalem_model::Entity;
use kalem_store::{DataStore, RowRange};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Tuning for one collection's feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Items per range fetch.
    pub page_size: usize,
    /// Age after which a cached first page is refetched on `query`.
    pub stale_after: Duration,
    /// Inactivity after which a signature's state is evicted entirely.
    pub evict_after: Duration,
    /// Upper bound on concurrently cached signatures.
    pub max_signatures: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            page_size: 12,
            stale_after: Duration::from_secs(5 * 60),
            evict_after: Duration::from_secs(30 * 60),
            max_signatures: 32,
        }
    }
}

/// Result of a `fetch_next` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was fetched and merged; count of newly appended items.
    Fetched(usize),
    /// A fetch for this signature was already in flight; call dropped.
    AlreadyInFlight,
    /// The stream is exhausted; nothing to fetch.
    Exhausted,
    /// The signature was invalidated while the fetch was in flight; the
    /// result was discarded.
    Discarded,
}

/// Infinitely-scrollable, filterable, cached view over one remote collection.
///
/// One `Feed` serves every query signature for its item type. Per signature
/// it keeps an accumulated, de-duplicated, order-stable page list and allows
/// at most one fetch in flight; concurrent triggers are dropped, and results
/// arriving for an invalidated generation are discarded rather than merged.
pub struct Feed<T: Entity, S: DataStore> {
    store: Arc<S>,
    config: FeedConfig,
    cache: Mutex<LruCache<QuerySignature, FetchState<T>>>,
    generations: AtomicU64,
}

impl<T: Entity, S: DataStore> Feed<T, S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, FeedConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: FeedConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_signatures.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Feed {
            store,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
            generations: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Current state for a signature, fetching the first page if none is
    /// cached or the cached one is stale. A call arriving while a fetch is
    /// in flight shares it and returns the current snapshot immediately.
    pub async fn query(&self, signature: &QuerySignature) -> Result<FeedSnapshot<T>> {
        self.validate(signature)?;

        let generation = {
            let mut cache = self.cache.lock().await;
            self.sweep(&mut cache);

            let generation = self.next_generation();
            let state = cache
                .get_or_insert_mut(signature.clone(), || FetchState::new(generation));

            if state.is_in_flight() {
                return Ok(state.snapshot());
            }
            if state.phase() != FetchPhase::Empty && !state.is_stale(self.config.stale_after) {
                state.touch();
                return Ok(state.snapshot());
            }

            // Fresh signature or stale data: restart from page zero under a
            // new generation so any in-flight result for the old one is
            // discarded on arrival.
            let generation = self.next_generation();
            let mut fresh = FetchState::new(generation);
            fresh.set_phase(FetchPhase::FetchingFirst);
            *state = fresh;
            generation
        };

        log::debug!("feed {}: fetching first page", signature.collection());
        let result = self.fetch_page(signature, 0).await;
        let (snapshot, _) = self.complete(signature, generation, 0, result).await?;
        Ok(snapshot)
    }

    /// Fetch the next page using the stored cursor. No-op when the stream is
    /// exhausted or a fetch is already in flight; never an error for either.
    pub async fn fetch_next(&self, signature: &QuerySignature) -> Result<FetchOutcome> {
        self.validate(signature)?;

        let (generation, page_index) = {
            let mut cache = self.cache.lock().await;
            self.sweep(&mut cache);

            let generation = self.next_generation();
            let state = cache
                .get_or_insert_mut(signature.clone(), || FetchState::new(generation));

            if state.is_in_flight() {
                log::debug!(
                    "feed {}: fetch already in flight, dropping trigger",
                    signature.collection()
                );
                return Ok(FetchOutcome::AlreadyInFlight);
            }
            if !state.has_more() {
                return Ok(FetchOutcome::Exhausted);
            }

            let page_index = state.next_page();
            state.set_phase(if page_index == 0 {
                FetchPhase::FetchingFirst
            } else {
                FetchPhase::FetchingNext
            });
            (state.generation(), page_index)
        };

        log::debug!(
            "feed {}: fetching page {}",
            signature.collection(),
            page_index
        );
        let result = self.fetch_page(signature, page_index).await;
        let (_, outcome) = self
            .complete(signature, generation, page_index, result)
            .await?;
        Ok(outcome)
    }

    /// Scroll-sentinel observer: the last rendered item became visible.
    /// Idempotent under rapid re-triggering; in-flight and exhausted cases
    /// are silently dropped.
    pub async fn on_sentinel_reached(&self, signature: &QuerySignature) -> Result<()> {
        self.fetch_next(signature).await.map(|_| ())
    }

    /// Drop cached pages and fetch state for a signature, forcing a clean
    /// refetch on the next `query`.
    pub async fn invalidate(&self, signature: &QuerySignature) {
        let mut cache = self.cache.lock().await;
        if cache.pop(signature).is_some() {
            log::debug!("feed {}: invalidated", signature.collection());
        }
    }

    /// Number of signatures currently cached.
    pub async fn cached_signatures(&self) -> usize {
        self.cache.lock().await.len()
    }

    fn validate(&self, signature: &QuerySignature) -> Result<()> {
        signature.validate()?;
        if signature.collection() != T::COLLECTION {
            return Err(FeedError::InvalidSignature(format!(
                "signature targets '{}' but this feed serves '{}'",
                signature.collection(),
                T::COLLECTION
            )));
        }
        Ok(())
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, AtomicOrdering::Relaxed)
    }

    fn sweep(&self, cache: &mut LruCache<QuerySignature, FetchState<T>>) {
        let expired: Vec<QuerySignature> = cache
            .iter()
            .filter(|(_, state)| state.is_expired(self.config.evict_after))
            .map(|(sig, _)| sig.clone())
            .collect();
        for signature in expired {
            log::debug!("feed {}: evicting inactive signature", signature.collection());
            cache.pop(&signature);
        }
    }

    async fn fetch_page(&self, signature: &QuerySignature, index: usize) -> Result<Vec<T>> {
        let range = RowRange::page(index, self.config.page_size);
        let rows = self
            .store
            .select(T::COLLECTION, signature.filters(), signature.order(), range)
            .await?;
        rows.into_iter()
            .map(|row| T::from_row(row).map_err(FeedError::from))
            .collect()
    }

    /// Merge a finished fetch back into the cache. The result is discarded
    /// when the entry was invalidated or replaced while the fetch was in
    /// flight (generation mismatch): last signature wins.
    async fn complete(
        &self,
        signature: &QuerySignature,
        generation: u64,
        page_index: usize,
        result: Result<Vec<T>>,
    ) -> Result<(FeedSnapshot<T>, FetchOutcome)> {
        let mut cache = self.cache.lock().await;

        let Some(state) = cache.get_mut(signature) else {
            log::debug!(
                "feed {}: discarding result for invalidated signature",
                signature.collection()
            );
            return Ok((FeedSnapshot::empty(), FetchOutcome::Discarded));
        };
        if state.generation() != generation {
            log::debug!(
                "feed {}: discarding result from superseded generation",
                signature.collection()
            );
            return Ok((state.snapshot(), FetchOutcome::Discarded));
        }

        match result {
            Ok(items) => {
                let appended = state.absorb_page(
                    page_index,
                    items,
                    self.config.page_size,
                    signature.order(),
                );
                log::debug!(
                    "feed {}: page {} merged, {} new items, has_more={}",
                    signature.collection(),
                    page_index,
                    appended,
                    state.has_more()
                );
                Ok((state.snapshot(), FetchOutcome::Fetched(appended)))
            }
            Err(err) => {
                log::warn!(
                    "feed {}: page {} fetch failed: {err}",
                    signature.collection(),
                    page_index
                );
                state.record_error(&err);
                Err(err)
            }
        }
    }
}
