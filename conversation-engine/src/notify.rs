use async_trait::async_trait;
use tracing::debug;

use common::error::AppError;

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Fire-and-forget delivery of owner notifications (new lead, flagged
/// question). Callers treat delivery as best-effort; failures are theirs to
/// swallow.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), AppError>;
}

/// Pushes notifications to the owner's phone via the Pushover message API.
pub struct PushoverSink {
    client: reqwest::Client,
    token: String,
    user: String,
}

impl PushoverSink {
    pub fn new(token: String, user: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            user,
        }
    }
}

#[async_trait]
impl NotificationSink for PushoverSink {
    async fn notify(&self, text: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("message", text),
            ])
            .send()
            .await?;

        response.error_for_status()?;
        Ok(())
    }
}

/// Sink used when no notification credentials are configured.
pub struct DisabledSink;

#[async_trait]
impl NotificationSink for DisabledSink {
    async fn notify(&self, text: &str) -> Result<(), AppError> {
        debug!(text, "notification sink disabled, dropping message");
        Ok(())
    }
}
