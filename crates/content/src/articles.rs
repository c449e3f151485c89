use crate::error::{ContentError, Result};
use chrono::{SecondsFormat, Utc};
use kalem_model::{Article, Collection, Entity};
use kalem_store::{DataStore, Filter, Order, RowRange};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Upper bound for writer-panel listings; the public site paginates through
/// the feed engine instead.
const MAX_LISTING_ROWS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub image_url: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Writer-panel article operations.
pub struct Articles<S> {
    store: Arc<S>,
}

impl<S: DataStore> Articles<S> {
    pub fn new(store: Arc<S>) -> Self {
        Articles { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Article>> {
        let rows = self
            .store
            .select(
                Collection::Articles,
                &[Filter::eq("id", id)],
                &Order::desc("created_at"),
                RowRange::page(0, 1),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(Article::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// All articles, drafts included, newest creation first.
    pub async fn list_all(&self) -> Result<Vec<Article>> {
        let rows = self
            .store
            .select(
                Collection::Articles,
                &[],
                &Order::desc("created_at"),
                RowRange::page(0, MAX_LISTING_ROWS),
            )
            .await?;
        rows.into_iter()
            .map(|row| Article::from_row(row).map_err(ContentError::from))
            .collect()
    }

    /// Create a new draft. It stays invisible to public listings until
    /// `publish` stamps it.
    pub async fn create(&self, draft: ArticleDraft) -> Result<Article> {
        if draft.title.trim().is_empty() {
            return Err(ContentError::InvalidInput(
                "article title must not be blank".to_string(),
            ));
        }
        let now = now_stamp();
        let row = json!({
            "title": draft.title.trim(),
            "excerpt": draft.excerpt,
            "content": draft.content,
            "category": draft.category,
            "image_url": draft.image_url,
            "status": "draft",
            "type": "article",
            "created_at": now,
            "updated_at": now,
            "views": 0,
        });

        let stored = self.store.insert(Collection::Articles, row).await?;
        let article = Article::from_row(stored)?;
        log::info!("created draft article '{}'", article.id);
        Ok(article)
    }

    pub async fn update(&self, id: &str, patch: ArticlePatch) -> Result<()> {
        self.require(id).await?;

        let mut fields = Map::new();
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(ContentError::InvalidInput(
                    "article title must not be blank".to_string(),
                ));
            }
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(excerpt) = patch.excerpt {
            fields.insert("excerpt".to_string(), Value::String(excerpt));
        }
        if let Some(content) = patch.content {
            fields.insert("content".to_string(), Value::String(content));
        }
        if let Some(category) = patch.category {
            fields.insert("category".to_string(), Value::String(category));
        }
        if let Some(image_url) = patch.image_url {
            fields.insert("image_url".to_string(), Value::String(image_url));
        }
        if fields.is_empty() {
            return Ok(());
        }
        fields.insert("updated_at".to_string(), Value::String(now_stamp()));

        self.store
            .update(Collection::Articles, id, Value::Object(fields))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(Collection::Articles, id).await?;
        log::info!("deleted article '{id}'");
        Ok(())
    }

    /// Publish a draft: sets the status and stamps `published_at`, which is
    /// the public feed's sort key.
    pub async fn publish(&self, id: &str) -> Result<()> {
        self.require(id).await?;
        let now = now_stamp();
        self.store
            .update(
                Collection::Articles,
                id,
                json!({
                    "status": "published",
                    "published_at": now,
                    "updated_at": now,
                }),
            )
            .await?;
        log::info!("published article '{id}'");
        Ok(())
    }

    /// Bump the view counter, returning the new count.
    ///
    /// Read-modify-write, not atomic; a lost increment under concurrent
    /// readers is tolerated for a toy counter.
    pub async fn record_view(&self, id: &str) -> Result<u64> {
        let article = self.require(id).await?;
        let views = article.views + 1;
        self.store
            .update(Collection::Articles, id, json!({ "views": views }))
            .await?;
        Ok(views)
    }

    async fn require(&self, id: &str) -> Result<Article> {
        self.get(id).await?.ok_or_else(|| ContentError::NotFound {
            collection: Collection::Articles.table(),
            id: id.to_string(),
        })
    }
}

pub(crate) fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
