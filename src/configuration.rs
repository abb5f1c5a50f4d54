use crate::cli::Cli;
use crate::errors::AppError;
use config::{Config, Environment, File, Map};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time::Duration;

pub const DEFAULT_GEOLOCATION_URL: &str = "http://ip-api.com/json/";
const DEFAULT_TIMEOUT_MILLISECONDS: i64 = 10_000;

/// Environment variables bound onto configuration keys (`.` becomes `_`).
const BOUND_ENV_KEYS: [&str; 7] = [
    "EMAILS",
    "CRON_SCHEDULE",
    "EMAIL_FROM",
    "EMAIL_PASSWORD",
    "SMTP_HOST",
    "SMTP_PORT",
    "GEOLOCATION_URL",
];

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    /// Comma-separated recipient list.
    pub emails: String,
    pub cron: CronSettings,
    pub email: EmailSettings,
    pub smtp: SmtpSettings,
    pub geolocation: GeolocationSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct CronSettings {
    pub schedule: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    pub from: String,
    pub password: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct GeolocationSettings {
    pub url: String,
    pub timeout_milliseconds: u64,
}

impl Settings {
    pub fn has_recipients(&self) -> bool {
        !self.emails.trim().is_empty()
    }
}

impl SmtpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

impl GeolocationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Loads settings from the file named on the command line, overridden by the process
/// environment. Flag values only fill in keys that neither source sets.
pub fn get_configuration(cli: &Cli) -> Result<Settings, AppError> {
    load_configuration(cli, bound_environment(std::env::vars()))
}

pub fn load_configuration(cli: &Cli, env: Map<String, String>) -> Result<Settings, AppError> {
    let settings = Config::builder()
        .set_default("cron.schedule", cli.cron.as_str())
        .and_then(|b| b.set_default("emails", cli.emails.as_str()))
        .and_then(|b| b.set_default("geolocation.url", DEFAULT_GEOLOCATION_URL))
        .and_then(|b| b.set_default("geolocation.timeout_milliseconds", DEFAULT_TIMEOUT_MILLISECONDS))
        .and_then(|b| b.set_default("smtp.timeout_milliseconds", DEFAULT_TIMEOUT_MILLISECONDS))
        .map_err(|e| AppError::ConfigError(e.to_string()))?
        .add_source(File::from(cli.config.as_path()))
        .add_source(
            Environment::default()
                .separator("_")
                .ignore_empty(true)
                .source(Some(env)),
        )
        .build()
        .map_err(|e| AppError::ConfigError(e.to_string()))?;
    settings
        .try_deserialize::<Settings>()
        .map_err(|e| AppError::ConfigError(e.to_string()))
}

/// Picks the variables that name a configuration key, matching case-insensitively.
pub fn bound_environment<I>(vars: I) -> Map<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| {
            let upper = key.to_uppercase();
            BOUND_ENV_KEYS
                .contains(&upper.as_str())
                .then(|| (upper.to_lowercase(), value))
        })
        .collect()
}
