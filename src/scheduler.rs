use crate::email_client::Mailer;
use crate::errors::AppError;
use crate::task::Task;
use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;

/// Fires a [`Task`] on every occurrence of a cron expression, in local time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    expression: String,
    schedule: Schedule,
}

impl Scheduler {
    /// Accepts standard 5-field expressions as well as the 6/7-field form with seconds.
    pub fn parse(expression: &str) -> Result<Self, AppError> {
        let schedule = Schedule::from_str(&normalize_cron_expr(expression))
            .map_err(|e| AppError::ScheduleError(format!("{expression}: {e}")))?;
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(after).next()
    }

    /// Never returns. Each tick runs the task on its own tokio task so a stuck
    /// invocation cannot hold back later ticks.
    pub async fn run<M: Mailer + 'static>(self, task: Arc<Task<M>>) {
        tracing::info!(
            schedule = %self.expression,
            "service started, IP information will be fetched and emailed on schedule"
        );

        let mut cursor = Local::now();
        loop {
            let Some(next) = self.next_after(&cursor) else {
                tracing::warn!(schedule = %self.expression, "schedule has no upcoming runs");
                return std::future::pending().await;
            };
            let wait = (next - Local::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            tracing::info!(tick = %next, "schedule fired");
            let task = Arc::clone(&task);
            tokio::spawn(async move {
                task.run().await;
            });

            cursor = next.max(Local::now());
        }
    }
}

/// The `cron` crate wants a leading seconds field; pin it to zero for 5-field input.
fn normalize_cron_expr(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}
