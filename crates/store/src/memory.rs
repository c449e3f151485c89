use crate::error::{Result, StoreError};
use crate::query::{Filter, Order, RowRange};
use crate::{DataStore, Row};
use async_trait::async_trait;
use kalem_model::Collection;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

/// In-memory row store with the same filter/order/range semantics as the
/// remote backend. Deterministic, so tests can assert exact page contents.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Collection, Vec<Row>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with fixture rows, replacing existing contents.
    pub fn seed(&self, collection: Collection, rows: Vec<Row>) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.insert(collection, rows);
    }

    pub fn row_count(&self, collection: Collection) -> usize {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables.get(&collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(
        &self,
        collection: Collection,
        filters: &[Filter],
        order: &Order,
        range: RowRange,
    ) -> Result<Vec<Row>> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        let mut rows: Vec<Row> = tables
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| compare_rows(a, b, order));

        let end = rows.len().min(range.to + 1);
        let start = rows.len().min(range.from);
        Ok(rows[start..end].to_vec())
    }

    async fn insert(&self, collection: Collection, mut row: Row) -> Result<Row> {
        let obj = row
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidRequest("insert body must be an object".into()))?;
        if !obj.contains_key("id") {
            let n = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
            obj.insert("id".to_string(), Value::String(format!("mem-{n}")));
        }

        let mut tables = self.tables.lock().expect("store mutex poisoned");
        tables.entry(collection).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()> {
        let fields = patch
            .as_object()
            .ok_or_else(|| StoreError::InvalidRequest("update body must be an object".into()))?
            .clone();

        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let rows = tables
            .get_mut(&collection)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        let row = rows
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        let obj = row
            .as_object_mut()
            .ok_or_else(|| StoreError::Other("stored row is not an object".into()))?;
        for (key, value) in fields {
            obj.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        if let Some(rows) = tables.get_mut(&collection) {
            rows.retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }
}

/// Order rows by the sort field, nulls last, ties broken by id so pagination
/// over equal keys stays stable.
fn compare_rows(a: &Row, b: &Row, order: &Order) -> Ordering {
    let key = match (cell_rank(a.get(&order.field)), cell_rank(b.get(&order.field))) {
        (None, None) => Ordering::Equal,
        // Missing/null keys sort after present ones regardless of direction.
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
    key.then_with(|| {
        let ida = a.get("id").and_then(Value::as_str).unwrap_or("");
        let idb = b.get("id").and_then(Value::as_str).unwrap_or("");
        ida.cmp(idb)
    })
}

fn cell_rank(cell: Option<&Value>) -> Option<String> {
    match cell {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(format!("{:020}", n.as_u64().unwrap_or(0))),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn article(id: &str, category: &str, published_at: &str) -> Row {
        json!({
            "id": id,
            "category": category,
            "published_at": published_at,
            "title": format!("Makale {id}")
        })
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(
            Collection::Articles,
            vec![
                article("a1", "Tarih", "2024-01-01T00:00:00Z"),
                article("a2", "Edebiyat", "2024-02-01T00:00:00Z"),
                article("a3", "Tarih", "2024-03-01T00:00:00Z"),
                article("a4", "Tarih", "2024-03-01T00:00:00Z"),
            ],
        );
        store
    }

    #[tokio::test]
    async fn select_filters_orders_and_slices() {
        let store = seeded();
        let rows = store
            .select(
                Collection::Articles,
                &[Filter::eq("category", "Tarih")],
                &Order::desc("published_at"),
                RowRange::page(0, 2),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = rows
            .iter()
            .map(|r| r.get("id").and_then(Value::as_str).unwrap())
            .collect();
        // Equal timestamps break ties by id.
        assert_eq!(ids, vec!["a3", "a4"]);
    }

    #[tokio::test]
    async fn select_past_the_end_returns_empty() {
        let store = seeded();
        let rows = store
            .select(
                Collection::Articles,
                &[],
                &Order::desc("published_at"),
                RowRange::page(3, 2),
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn insert_assigns_id_when_missing() {
        let store = MemoryStore::new();
        let row = store
            .insert(Collection::Questions, json!({ "title": "Soru" }))
            .await
            .unwrap();
        assert!(row.get("id").and_then(Value::as_str).is_some());
        assert_eq!(store.row_count(Collection::Questions), 1);
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let store = seeded();
        store
            .update(
                Collection::Articles,
                "a1",
                json!({ "category": "Kültür" }),
            )
            .await
            .unwrap();

        let rows = store
            .select(
                Collection::Articles,
                &[Filter::eq("id", "a1")],
                &Order::desc("published_at"),
                RowRange::page(0, 1),
            )
            .await
            .unwrap();
        assert_eq!(rows[0].get("category").and_then(Value::as_str), Some("Kültür"));
        // Untouched fields survive the patch.
        assert_eq!(rows[0].get("title").and_then(Value::as_str), Some("Makale a1"));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = seeded();
        let err = store
            .update(Collection::Articles, "nope", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = seeded();
        store.delete(Collection::Articles, "a1").await.unwrap();
        assert_eq!(store.row_count(Collection::Articles), 3);
    }
}
