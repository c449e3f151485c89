use crate::error::FeedError;
use kalem_model::Entity;
use kalem_store::Order;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Per-signature lifecycle of a paginated result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// No fetch has happened yet.
    Empty,
    /// First page is in flight.
    FetchingFirst,
    /// At least one page is cached and more may exist.
    Idle,
    /// A follow-up page is in flight.
    FetchingNext,
    /// The stream reported a short page; no more data.
    Exhausted,
    /// The last fetch failed; accumulated pages are still valid.
    Errored,
}

/// One bounded batch of items returned by a single range fetch.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub index: usize,
    pub items: Vec<T>,
}

/// Read-only view of a fetch state, cloned out for the consumer.
#[derive(Debug, Clone)]
pub struct FeedSnapshot<T> {
    pub items: Vec<T>,
    pub page_count: usize,
    pub has_more: bool,
    pub phase: FetchPhase,
    pub last_error: Option<String>,
}

impl<T> FeedSnapshot<T> {
    pub(crate) fn empty() -> Self {
        FeedSnapshot {
            items: Vec::new(),
            page_count: 0,
            has_more: true,
            phase: FetchPhase::Empty,
            last_error: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FetchState<T> {
    pages: Vec<Page<T>>,
    seen: HashSet<String>,
    next_page: usize,
    has_more: bool,
    phase: FetchPhase,
    generation: u64,
    fetched_at: Option<Instant>,
    last_used: Instant,
    last_error: Option<String>,
}

impl<T: Entity> FetchState<T> {
    pub(crate) fn new(generation: u64) -> Self {
        FetchState {
            pages: Vec::new(),
            seen: HashSet::new(),
            next_page: 0,
            has_more: true,
            phase: FetchPhase::Empty,
            generation,
            fetched_at: None,
            last_used: Instant::now(),
            last_error: None,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: FetchPhase) {
        self.phase = phase;
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        matches!(self.phase, FetchPhase::FetchingFirst | FetchPhase::FetchingNext)
    }

    pub(crate) fn has_more(&self) -> bool {
        self.has_more
    }

    pub(crate) fn next_page(&self) -> usize {
        self.next_page
    }

    /// Data age, for the first-page refetch decision. A state that never
    /// completed a fetch counts as stale.
    pub(crate) fn is_stale(&self, stale_after: Duration) -> bool {
        self.fetched_at.map_or(true, |at| at.elapsed() > stale_after)
    }

    /// Inactivity age, for cache eviction.
    pub(crate) fn is_expired(&self, evict_after: Duration) -> bool {
        self.last_used.elapsed() > evict_after
    }

    pub(crate) fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// Merge a fetched page into the accumulated stream.
    ///
    /// Duplicate ids (overlapping ranges under concurrent writes) are
    /// dropped, as is any item that would sort before the current tail;
    /// the accumulated order never changes once rendered.
    ///
    /// Continuation is the raw-page-length heuristic: a full page means more
    /// data may exist. When the true count is an exact multiple of the page
    /// size this yields one extra empty fetch before exhaustion is detected.
    pub(crate) fn absorb_page(
        &mut self,
        index: usize,
        items: Vec<T>,
        page_size: usize,
        order: &Order,
    ) -> usize {
        let raw_len = items.len();
        let mut kept: Vec<T> = Vec::with_capacity(raw_len);

        for item in items {
            if self.seen.contains(item.id()) {
                log::debug!("dropping duplicate item '{}'", item.id());
                continue;
            }
            let tail = kept
                .last()
                .or_else(|| self.pages.last().and_then(|p| p.items.last()));
            if let Some(tail) = tail {
                if compare_items(order, tail, &item) == Ordering::Greater {
                    log::debug!(
                        "dropping out-of-order item '{}' (offset shift)",
                        item.id()
                    );
                    continue;
                }
            }
            self.seen.insert(item.id().to_string());
            kept.push(item);
        }

        let appended = kept.len();
        self.pages.push(Page { index, items: kept });
        self.has_more = raw_len == page_size;
        self.next_page = index + 1;
        self.phase = if self.has_more {
            FetchPhase::Idle
        } else {
            FetchPhase::Exhausted
        };
        self.fetched_at = Some(Instant::now());
        self.last_used = Instant::now();
        self.last_error = None;
        appended
    }

    /// A failed fetch clears the in-flight flag and keeps everything else:
    /// accumulated pages stay visible and the cursor is unchanged, so a
    /// later fetch retries the same page.
    pub(crate) fn record_error(&mut self, err: &FeedError) {
        self.phase = FetchPhase::Errored;
        self.last_error = Some(err.to_string());
        self.last_used = Instant::now();
    }

    pub(crate) fn snapshot(&self) -> FeedSnapshot<T> {
        FeedSnapshot {
            items: self
                .pages
                .iter()
                .flat_map(|p| p.items.iter().cloned())
                .collect(),
            page_count: self.pages.len(),
            has_more: self.has_more,
            phase: self.phase,
            last_error: self.last_error.clone(),
        }
    }
}

/// Total order over items for a declared sort: the sort field first
/// (direction-aware, missing timestamps last), ties broken by id.
pub(crate) fn compare_items<T: Entity>(order: &Order, a: &T, b: &T) -> Ordering {
    let key = match (a.timestamp(&order.field), b.timestamp(&order.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let cmp = x.cmp(&y);
            if order.ascending {
                cmp
            } else {
                cmp.reverse()
            }
        }
    };
    key.then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use kalem_model::{Article, PublishStatus};
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn article(id: &str, published_at: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Makale {id}"),
            excerpt: String::new(),
            content: String::new(),
            category: "Tarih".to_string(),
            image_url: None,
            status: PublishStatus::Published,
            kind: "article".to_string(),
            published_at: Some(ts(published_at)),
            created_at: ts(published_at),
            updated_at: ts(published_at),
            views: 0,
        }
    }

    fn desc() -> Order {
        Order::desc("published_at")
    }

    #[test]
    fn full_page_keeps_stream_open() {
        let mut state: FetchState<Article> = FetchState::new(1);
        let appended = state.absorb_page(
            0,
            vec![
                article("a1", "2024-03-01T00:00:00Z"),
                article("a2", "2024-02-01T00:00:00Z"),
            ],
            2,
            &desc(),
        );
        assert_eq!(appended, 2);
        assert!(state.has_more());
        assert_eq!(state.phase(), FetchPhase::Idle);
        assert_eq!(state.next_page(), 1);
    }

    #[test]
    fn short_page_exhausts_stream() {
        let mut state: FetchState<Article> = FetchState::new(1);
        state.absorb_page(0, vec![article("a1", "2024-03-01T00:00:00Z")], 2, &desc());
        assert!(!state.has_more());
        assert_eq!(state.phase(), FetchPhase::Exhausted);
    }

    #[test]
    fn duplicate_ids_across_pages_are_dropped() {
        let mut state: FetchState<Article> = FetchState::new(1);
        state.absorb_page(
            0,
            vec![
                article("a1", "2024-03-01T00:00:00Z"),
                article("a2", "2024-02-01T00:00:00Z"),
            ],
            2,
            &desc(),
        );
        // Offset shifted by a concurrent insert: a2 comes back again.
        let appended = state.absorb_page(
            1,
            vec![
                article("a2", "2024-02-01T00:00:00Z"),
                article("a3", "2024-01-01T00:00:00Z"),
            ],
            2,
            &desc(),
        );
        assert_eq!(appended, 1);

        let ids: Vec<String> = state.snapshot().items.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn out_of_order_arrival_does_not_reorder_stream() {
        let mut state: FetchState<Article> = FetchState::new(1);
        state.absorb_page(0, vec![article("a2", "2024-02-01T00:00:00Z")], 1, &desc());
        // A newer item surfacing in a later page would have to be inserted
        // above already-rendered rows; it is dropped instead.
        let appended =
            state.absorb_page(1, vec![article("a9", "2024-06-01T00:00:00Z")], 1, &desc());
        assert_eq!(appended, 0);

        let ids: Vec<String> = state.snapshot().items.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["a2"]);
    }

    #[test]
    fn error_keeps_pages_and_cursor() {
        let mut state: FetchState<Article> = FetchState::new(1);
        state.absorb_page(0, vec![article("a1", "2024-03-01T00:00:00Z")], 1, &desc());
        let cursor = state.next_page();

        state.record_error(&FeedError::Store(kalem_store::StoreError::Other(
            "boom".to_string(),
        )));
        assert_eq!(state.phase(), FetchPhase::Errored);
        assert_eq!(state.next_page(), cursor);
        assert_eq!(state.snapshot().items.len(), 1);
        assert!(state.snapshot().last_error.is_some());
    }

    #[test]
    fn ties_break_by_id() {
        let a = article("a1", "2024-03-01T00:00:00Z");
        let b = article("a2", "2024-03-01T00:00:00Z");
        assert_eq!(compare_items(&desc(), &a, &b), Ordering::Less);
    }
}
