pub mod cli;
pub mod configuration;
pub mod email_client;
pub mod errors;
pub mod geolocation;
pub mod scheduler;
pub mod task;
pub mod telemetry;
pub mod template;
pub mod validation;

use crate::cli::Cli;
use crate::configuration::{Settings, get_configuration};
use crate::email_client::SmtpMailer;
use crate::errors::AppError;
use crate::geolocation::GeolocationClient;
use crate::scheduler::Scheduler;
use crate::task::Task;
use anyhow::Context;
use std::sync::Arc;

pub async fn run(cli: Cli) -> Result<(), AppError> {
    telemetry::init_subscriber(telemetry::get_subscriber("info"));

    let conf = get_configuration(&cli)?;
    let (scheduler, task) = build(&conf)?;

    // immediate run so a fresh deployment reports right away
    task.run().await;

    scheduler.run(task).await;
    Ok(())
}

/// Validates the schedule before anything else so a bad expression never lets a task run.
pub fn build(conf: &Settings) -> Result<(Scheduler, Arc<Task<SmtpMailer>>), AppError> {
    let scheduler = Scheduler::parse(&conf.cron.schedule)?;

    let geolocation = GeolocationClient::new(&conf.geolocation.url, conf.geolocation.timeout())
        .context("error building geolocation client")?;
    let mailer = SmtpMailer::new(&conf.smtp, &conf.email).context("error building SMTP mailer")?;
    tracing::info!(
        schedule = %scheduler.expression(),
        smtp_host = %conf.smtp.host,
        smtp_port = conf.smtp.port,
        "configuration loaded"
    );

    let task = Task::new(&conf.emails, geolocation, mailer);
    Ok((scheduler, Arc::new(task)))
}
