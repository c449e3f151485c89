use crate::articles::now_stamp;
use crate::error::{ContentError, Result};
use kalem_model::{Collection, Entity, Video};
use kalem_store::{DataStore, Filter, Order, RowRange};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const MAX_LISTING_ROWS: usize = 500;

// Accepted YouTube URL shapes, first match wins.
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"[?&]v=([A-Za-z0-9_-]{6,})").expect("valid regex"),
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]{6,})").expect("valid regex"),
        Regex::new(r"/embed/([A-Za-z0-9_-]{6,})").expect("valid regex"),
    ]
});

/// Extract the video id from a YouTube URL (watch, short, or embed form).
pub fn youtube_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Default)]
pub struct VideoDraft {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Writer-panel video operations.
pub struct Videos<S> {
    store: Arc<S>,
}

impl<S: DataStore> Videos<S> {
    pub fn new(store: Arc<S>) -> Self {
        Videos { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Video>> {
        let rows = self
            .store
            .select(
                Collection::Videos,
                &[Filter::eq("id", id)],
                &Order::desc("created_at"),
                RowRange::page(0, 1),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(Video::from_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Video>> {
        let rows = self
            .store
            .select(
                Collection::Videos,
                &[],
                &Order::desc("created_at"),
                RowRange::page(0, MAX_LISTING_ROWS),
            )
            .await?;
        rows.into_iter()
            .map(|row| Video::from_row(row).map_err(ContentError::from))
            .collect()
    }

    /// Create a draft video. The id is parsed out of the URL up front so a
    /// bad link fails here, not at render time.
    pub async fn create(&self, draft: VideoDraft) -> Result<Video> {
        if draft.title.trim().is_empty() {
            return Err(ContentError::InvalidInput(
                "video title must not be blank".to_string(),
            ));
        }
        let video_id = youtube_video_id(&draft.video_url)
            .ok_or_else(|| ContentError::InvalidVideoUrl(draft.video_url.clone()))?;

        let now = now_stamp();
        let row = json!({
            "title": draft.title.trim(),
            "description": draft.description,
            "video_url": draft.video_url,
            "video_id": video_id,
            "thumbnail_url": draft.thumbnail_url,
            "status": "draft",
            "created_at": now,
            "updated_at": now,
        });

        let stored = self.store.insert(Collection::Videos, row).await?;
        let video = Video::from_row(stored)?;
        log::info!("created draft video '{}'", video.id);
        Ok(video)
    }

    pub async fn update(&self, id: &str, patch: VideoPatch) -> Result<()> {
        self.require(id).await?;

        let mut fields = Map::new();
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(ContentError::InvalidInput(
                    "video title must not be blank".to_string(),
                ));
            }
            fields.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = patch.description {
            fields.insert("description".to_string(), Value::String(description));
        }
        if let Some(url) = patch.video_url {
            // Changing the URL re-derives the id.
            let video_id =
                youtube_video_id(&url).ok_or_else(|| ContentError::InvalidVideoUrl(url.clone()))?;
            fields.insert("video_url".to_string(), Value::String(url));
            fields.insert("video_id".to_string(), Value::String(video_id));
        }
        if let Some(thumb) = patch.thumbnail_url {
            fields.insert("thumbnail_url".to_string(), Value::String(thumb));
        }
        if fields.is_empty() {
            return Ok(());
        }
        fields.insert("updated_at".to_string(), Value::String(now_stamp()));

        self.store
            .update(Collection::Videos, id, Value::Object(fields))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(Collection::Videos, id).await?;
        log::info!("deleted video '{id}'");
        Ok(())
    }

    pub async fn publish(&self, id: &str) -> Result<()> {
        self.require(id).await?;
        self.store
            .update(
                Collection::Videos,
                id,
                json!({ "status": "published", "updated_at": now_stamp() }),
            )
            .await?;
        log::info!("published video '{id}'");
        Ok(())
    }

    async fn require(&self, id: &str) -> Result<Video> {
        self.get(id).await?.ok_or_else(|| ContentError::NotFound {
            collection: Collection::Videos.table(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_id_from_watch_urls() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?t=10&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_short_and_embed_urls() {
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn rejects_non_video_urls() {
        assert_eq!(youtube_video_id("https://example.com/watch"), None);
        assert_eq!(youtube_video_id("not a url"), None);
    }
}
