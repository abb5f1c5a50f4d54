use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_CRON: &str = "0 6,12,18,0 * * *";

/// Periodically mails the host's public IP details to a list of recipients.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Path to config file
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Cron specification for how often to fetch IP info and send emails
    #[arg(long, default_value = DEFAULT_CRON)]
    pub cron: String,

    /// Comma-separated list of email addresses to send IP information to
    #[arg(long, default_value = "")]
    pub emails: String,
}
