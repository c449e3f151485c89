use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A remote table the site reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Articles,
    Videos,
    Questions,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Articles => "articles",
            Collection::Videos => "videos",
            Collection::Questions => "questions",
        }
    }

    /// Default sort field for public listings (newest first).
    ///
    /// Articles sort by publication time; videos and questions have no
    /// separate publication timestamp and sort by creation time.
    pub fn default_sort_field(self) -> &'static str {
        match self {
            Collection::Articles => "published_at",
            Collection::Videos | Collection::Questions => "created_at",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "articles" => Ok(Collection::Articles),
            "videos" => Ok(Collection::Videos),
            "questions" => Ok(Collection::Questions),
            other => Err(ModelError::UnknownCollection(other.to_string())),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
