use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

// One row per visitor session. The record id is the session identifier
// itself, so duplicate creation maps onto the same record.
stored_object!(Session, "session", {
    questions_asked: u32
});

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: session_id.into(),
            created_at: now,
            updated_at: now,
            questions_asked: 0,
        }
    }

    pub async fn get(session_id: &str, db: &SurrealDbClient) -> Result<Option<Self>, AppError> {
        Ok(db.get_item(session_id).await?)
    }

    /// Idempotent creation. A session id that already exists resolves to the
    /// existing row rather than an error, including under concurrent creates.
    pub async fn create(session_id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        match db.store_item(Self::new(session_id)).await {
            Ok(Some(created)) => Ok(created),
            Ok(None) => Self::get(session_id, db).await?.ok_or_else(|| {
                AppError::NotFound(format!("session {session_id} missing after create"))
            }),
            Err(err) => match Self::get(session_id, db).await? {
                Some(existing) => Ok(existing),
                None => Err(err.into()),
            },
        }
    }

    /// Atomically bumps the question counter. Silent no-op when the session
    /// row is absent.
    pub async fn increment_questions(
        session_id: &str,
        db: &SurrealDbClient,
    ) -> Result<(), AppError> {
        db.client
            .query(
                "UPDATE type::thing('session', $session_id) \
                 SET questions_asked += 1, updated_at = time::now()",
            )
            .bind(("session_id", session_id.to_owned()))
            .await?
            .check()?;
        Ok(())
    }
}
