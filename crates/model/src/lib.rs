//! # Kalem Model
//!
//! Typed records for the site's remote collections.
//!
//! Rows arrive from the remote store as loosely-shaped JSON; this crate is
//! the validation boundary that turns them into `Article`, `Video`, and
//! `Question` values. Downstream crates (feed, content) only see typed
//! records.

mod collection;
mod error;
mod record;

pub use collection::Collection;
pub use error::{ModelError, Result};
pub use record::{Article, Entity, PublishStatus, Question, QuestionStatus, Video};
