use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

// Append-only log of questions the persona could not answer. `created_at`
// doubles as the flagged-at timestamp. Duplicate question texts are expected
// and retained.
stored_object!(UnknownQuestion, "unknown_question", {
    question: String
});

impl UnknownQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            question: question.into(),
        }
    }

    pub async fn log(question: &str, db: &SurrealDbClient) -> Result<(), AppError> {
        db.store_item(Self::new(question)).await?;
        Ok(())
    }

    pub async fn list(db: &SurrealDbClient) -> Result<Vec<Self>, AppError> {
        Ok(db.get_all_stored_items().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> SurrealDbClient {
        SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn test_log_and_list() {
        let db = memory_db().await;

        UnknownQuestion::log("What is your shoe size?", &db)
            .await
            .expect("Log failed");

        let logged = UnknownQuestion::list(&db).await.expect("List failed");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].question, "What is your shoe size?");
    }

    #[tokio::test]
    async fn test_duplicate_questions_are_retained() {
        let db = memory_db().await;

        UnknownQuestion::log("Same question", &db)
            .await
            .expect("First log failed");
        UnknownQuestion::log("Same question", &db)
            .await
            .expect("Second log failed");

        let logged = UnknownQuestion::list(&db).await.expect("List failed");
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().all(|entry| entry.question == "Same question"));
    }
}
