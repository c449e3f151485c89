//! # Kalem Feed
//!
//! Paginated collection view: the engine behind every infinite-scroll list
//! on the site (articles, videos, reader questions).
//!
//! ## Architecture
//!
//! ```text
//! QuerySignature (collection, filters, order)
//!     │
//!     ├──> Feed cache (per signature, recency-bounded)
//!     │      └─> FetchState: pages + cursor + phase machine
//!     │
//!     └──> DataStore.select(collection, filters, order, range)
//!            └─> validated items, de-duplicated, order-stable
//! ```
//!
//! ## Guarantees
//!
//! - At most one fetch in flight per signature; extra triggers are dropped.
//! - Accumulated items never re-order and never repeat an id.
//! - Changing any filter produces a new signature; results never mix.
//! - A failed fetch is retryable and keeps accumulated pages visible.
//!
//! ## Example
//!
//! ```no_run
//! use kalem_feed::{Feed, QuerySignature};
//! use kalem_model::{Article, Collection};
//! use kalem_store::RestStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(RestStore::new("http://localhost:3000/rest/v1"));
//!     let feed: Feed<Article, _> = Feed::new(store);
//!
//!     let sig = QuerySignature::new(Collection::Articles).category("Tarih");
//!     let snapshot = feed.query(&sig).await?;
//!     println!("{} articles, more: {}", snapshot.items.len(), snapshot.has_more);
//!
//!     feed.on_sentinel_reached(&sig).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod feed;
mod signature;
mod state;

pub use error::{FeedError, Result};
pub use feed::{Feed, FeedConfig, FetchOutcome};
pub use signature::QuerySignature;
pub use state::{FeedSnapshot, FetchPhase, Page};
