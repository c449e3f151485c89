//! # Kalem Store
//!
//! Abstract remote row store and its two implementations.
//!
//! ## Architecture
//!
//! ```text
//! DataStore (trait)
//!     │
//!     ├──> RestStore    (hosted backend, REST rows)
//!     │      └─> filters/order as query params, Range header
//!     │
//!     └──> MemoryStore  (deterministic in-memory tables)
//!            └─> test substitute with identical semantics
//! ```
//!
//! The store is always constructed explicitly and passed down; there is no
//! module-level client singleton, so every consumer can be pointed at a fake.

mod error;
mod memory;
mod query;
mod rest;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use query::{Filter, Order, RowRange};
pub use rest::RestStore;

use async_trait::async_trait;
use kalem_model::Collection;

/// A raw row as the remote store returns it, before model validation.
pub type Row = serde_json::Value;

/// Remote tabular store: filters, ordering, and ranges apply server-side.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch rows in `range` (inclusive offsets) matching all `filters`,
    /// sorted by `order`.
    async fn select(
        &self,
        collection: Collection,
        filters: &[Filter],
        order: &Order,
        range: RowRange,
    ) -> Result<Vec<Row>>;

    /// Insert a row, returning the stored representation (with generated id).
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row>;

    /// Merge `patch` fields into the row with the given id.
    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;
}
