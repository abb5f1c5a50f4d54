use crate::email_client::Mailer;
use crate::geolocation::GeolocationClient;
use crate::template::render_email_body;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(Stage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRecipients,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Render,
    Send,
}

/// One fetch → render → send cycle. Failures are logged and never propagated; the next
/// scheduled run starts from scratch.
pub struct Task<M> {
    recipients: String,
    geolocation: GeolocationClient,
    mailer: M,
    running: Mutex<()>,
}

impl<M: Mailer> Task<M> {
    pub fn new(recipients: &str, geolocation: GeolocationClient, mailer: M) -> Self {
        Self {
            recipients: recipients.to_string(),
            geolocation,
            mailer,
            running: Mutex::new(()),
        }
    }

    /// The mailer this task sends through; lets callers inspect a test double after a run.
    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    #[tracing::instrument(name = "ip report task", skip(self))]
    pub async fn run(&self) -> TaskOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("previous run still in progress, skipping this one");
            return TaskOutcome::Skipped(SkipReason::AlreadyRunning);
        };

        tracing::info!("fetching IP information and sending emails");
        if self.recipients.trim().is_empty() {
            tracing::info!("no email addresses provided");
            return TaskOutcome::Skipped(SkipReason::NoRecipients);
        }

        let record = match self.geolocation.fetch().await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "failed to get IP information");
                return TaskOutcome::Failed(Stage::Fetch);
            }
        };

        let body = match render_email_body(&record) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "error rendering email template");
                return TaskOutcome::Failed(Stage::Render);
            }
        };

        match self.mailer.send_mail(&body, &self.recipients).await {
            Ok(()) => {
                tracing::info!(query = %record.query, "email sent successfully");
                TaskOutcome::Sent
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to send email");
                TaskOutcome::Failed(Stage::Send)
            }
        }
    }
}
