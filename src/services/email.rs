use async_trait::async_trait;
use tracing::info;

use crate::jobs::Job;

/// Outbound mail is an external collaborator; this service only decides
/// when to send. The default sender records the send in the log stream.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!("Email to {}: {} ({} bytes)", to, subject, body.len());
        Ok(())
    }
}

/// Welcome email for a freshly onboarded client, delivered as a tracked
/// background job with retry.
pub struct WelcomeEmailJob {
    pub email: String,
    pub temporary_password: Option<String>,
}

#[async_trait]
impl Job for WelcomeEmailJob {
    fn name(&self) -> &'static str {
        "welcome-email"
    }

    async fn run(&self) -> anyhow::Result<()> {
        let body = match &self.temporary_password {
            Some(password) => format!(
                "Welcome aboard! Your account is ready. Temporary password: {}",
                password
            ),
            None => "Welcome aboard! Your account is ready.".to_string(),
        };
        LogEmailSender
            .send(&self.email, "Welcome to LedgerDesk", &body)
            .await
    }
}
