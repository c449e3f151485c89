use crate::articles::now_stamp;
use crate::error::{ContentError, Result};
use kalem_model::{Collection, Entity, Question};
use kalem_store::{DataStore, Filter, Order, RowRange};
use serde_json::json;
use std::sync::Arc;

const MAX_LISTING_ROWS: usize = 500;

/// A reader's submission from the Ask page.
#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub name: String,
    pub email: String,
    pub title: String,
    pub question: String,
}

/// Reader Q&A: public submission plus writer-panel answering.
pub struct Questions<S> {
    store: Arc<S>,
}

impl<S: DataStore> Questions<S> {
    pub fn new(store: Arc<S>) -> Self {
        Questions { store }
    }

    /// Submit a reader question. It enters the writer's queue as pending
    /// and unpublished.
    pub async fn submit(&self, new: NewQuestion) -> Result<Question> {
        for (label, value) in [
            ("name", &new.name),
            ("email", &new.email),
            ("title", &new.title),
            ("question", &new.question),
        ] {
            if value.trim().is_empty() {
                return Err(ContentError::InvalidInput(format!(
                    "{label} must not be blank"
                )));
            }
        }
        if !new.email.contains('@') {
            return Err(ContentError::InvalidInput(
                "email address is malformed".to_string(),
            ));
        }

        let row = json!({
            "name": new.name.trim(),
            "email": new.email.trim(),
            "title": new.title.trim(),
            "question": new.question.trim(),
            "answer": null,
            "status": "pending",
            "is_published": false,
            "created_at": now_stamp(),
        });

        let stored = self.store.insert(Collection::Questions, row).await?;
        let question = Question::from_row(stored)?;
        log::info!("reader question '{}' submitted", question.id);
        Ok(question)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Question>> {
        let rows = self
            .store
            .select(
                Collection::Questions,
                &[Filter::eq("id", id)],
                &Order::desc("created_at"),
                RowRange::page(0, 1),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(Question::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Every question, answered or not. This is the writer panel's queue.
    pub async fn list_all(&self) -> Result<Vec<Question>> {
        let rows = self
            .store
            .select(
                Collection::Questions,
                &[],
                &Order::desc("created_at"),
                RowRange::page(0, MAX_LISTING_ROWS),
            )
            .await?;
        rows.into_iter()
            .map(|row| Question::from_row(row).map_err(ContentError::from))
            .collect()
    }

    /// Answer a question. `publish` controls whether it appears in the
    /// public Q&A listing.
    pub async fn answer(&self, id: &str, answer: &str, publish: bool) -> Result<()> {
        if answer.trim().is_empty() {
            return Err(ContentError::InvalidInput(
                "answer must not be blank".to_string(),
            ));
        }
        self.require(id).await?;

        self.store
            .update(
                Collection::Questions,
                id,
                json!({
                    "answer": answer,
                    "status": "answered",
                    "is_published": publish,
                }),
            )
            .await?;
        log::info!("question '{id}' answered (published: {publish})");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(Collection::Questions, id).await?;
        log::info!("deleted question '{id}'");
        Ok(())
    }

    async fn require(&self, id: &str) -> Result<Question> {
        self.get(id).await?.ok_or_else(|| ContentError::NotFound {
            collection: Collection::Questions.table(),
            id: id.to_string(),
        })
    }
}
