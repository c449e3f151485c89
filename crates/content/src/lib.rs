//! # Kalem Content
//!
//! Content operations behind the writer panel and the Ask page: article and
//! video management, reader question submission and answering, and
//! table-of-contents extraction for article bodies.
//!
//! Every service takes its `DataStore` at construction; nothing here owns a
//! global client.

mod articles;
mod error;
mod questions;
mod toc;
mod videos;

pub use articles::{ArticleDraft, ArticlePatch, Articles};
pub use error::{ContentError, Result};
pub use questions::{NewQuestion, Questions};
pub use toc::{extract_toc, TocEntry};
pub use videos::{youtube_video_id, VideoDraft, VideoPatch, Videos};
