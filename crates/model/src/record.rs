use crate::collection::Collection;
use crate::error::{ModelError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Pending,
    Answered,
}

/// A typed record backed by one remote collection.
///
/// Rows cross the store boundary as raw JSON and are validated here; nothing
/// downstream of `from_row` handles loosely-shaped data.
pub trait Entity: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    /// Timestamp value for a named sort field, if the record carries one.
    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>>;

    fn from_row(row: serde_json::Value) -> Result<Self> {
        serde_json::from_value(row).map_err(|source| ModelError::InvalidRow {
            collection: Self::COLLECTION.table(),
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: PublishStatus,
    #[serde(rename = "type", default = "article_kind")]
    pub kind: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
}

fn article_kind() -> String {
    "article".to_string()
}

impl Entity for Article {
    const COLLECTION: Collection = Collection::Articles;

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match field {
            "published_at" => self.published_at,
            "created_at" => Some(self.created_at),
            "updated_at" => Some(self.updated_at),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_url: String,
    pub video_id: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub status: PublishStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Video {
    const COLLECTION: Collection = Collection::Videos;

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match field {
            "created_at" => Some(self.created_at),
            "updated_at" => Some(self.updated_at),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub name: String,
    pub email: String,
    pub title: String,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    pub status: QuestionStatus,
    #[serde(default)]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Question {
    const COLLECTION: Collection = Collection::Questions;

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match field {
            "created_at" => Some(self.created_at),
            _ => None,
        }
    }
}
