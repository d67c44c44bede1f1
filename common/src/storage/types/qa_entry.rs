use sha2::{Digest, Sha256};

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

// Exact-match answer cache. The record id is the SHA-256 of the question
// text, which gives one stored answer per question without a separate
// uniqueness constraint.
stored_object!(QaEntry, "qa_entry", {
    question: String,
    answer: String
});

impl QaEntry {
    pub fn record_id(question: &str) -> String {
        format!("{:x}", Sha256::digest(question.as_bytes()))
    }

    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question = question.into();
        let now = Utc::now();
        Self {
            id: Self::record_id(&question),
            created_at: now,
            updated_at: now,
            question,
            answer: answer.into(),
        }
    }

    /// Exact string match lookup of a previously stored answer.
    pub async fn find_answer(
        question: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<String>, AppError> {
        let entry: Option<Self> = db.get_item(&Self::record_id(question)).await?;
        Ok(entry.map(|entry| entry.answer))
    }

    /// Insert if the question is unseen, otherwise overwrite the stored
    /// answer. Single statement, atomic per record.
    pub async fn upsert(
        question: &str,
        answer: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        db.client
            .query(
                "UPSERT type::thing('qa_entry', $id) \
                 SET question = $question, answer = $answer, \
                     updated_at = time::now(), created_at ??= time::now()",
            )
            .bind(("id", Self::record_id(question)))
            .bind(("question", question.to_owned()))
            .bind(("answer", answer.to_owned()))
            .await?
            .check()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn memory_db() -> SurrealDbClient {
        SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn test_lookup_miss_returns_none() {
        let db = memory_db().await;

        let answer = QaEntry::find_answer("Never asked", &db)
            .await
            .expect("Lookup failed");
        assert!(answer.is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_lookup() {
        let db = memory_db().await;

        QaEntry::upsert("What is your name?", "I'm Alex.", &db)
            .await
            .expect("Upsert failed");

        let answer = QaEntry::find_answer("What is your name?", &db)
            .await
            .expect("Lookup failed");
        assert_eq!(answer.as_deref(), Some("I'm Alex."));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_answer() {
        let db = memory_db().await;

        QaEntry::upsert("Q1", "A", &db).await.expect("First upsert");
        QaEntry::upsert("Q1", "B", &db)
            .await
            .expect("Second upsert");

        let answer = QaEntry::find_answer("Q1", &db).await.expect("Lookup");
        assert_eq!(answer.as_deref(), Some("B"));

        // Still exactly one row for the question.
        let all = db
            .get_all_stored_items::<QaEntry>()
            .await
            .expect("Failed to fetch all");
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_for_identical_pairs() {
        let db = memory_db().await;

        QaEntry::upsert("Q1", "A", &db).await.expect("First upsert");
        QaEntry::upsert("Q1", "A", &db)
            .await
            .expect("Repeated identical upsert must not error");

        let answer = QaEntry::find_answer("Q1", &db).await.expect("Lookup");
        assert_eq!(answer.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_distinct_questions_do_not_collide() {
        let db = memory_db().await;

        QaEntry::upsert("Q1", "A1", &db).await.expect("Upsert Q1");
        QaEntry::upsert("Q2", "A2", &db).await.expect("Upsert Q2");

        assert_eq!(
            QaEntry::find_answer("Q1", &db)
                .await
                .expect("Lookup")
                .as_deref(),
            Some("A1")
        );
        assert_eq!(
            QaEntry::find_answer("Q2", &db)
                .await
                .expect("Lookup")
                .as_deref(),
            Some("A2")
        );
    }
}
