use tracing::Subscriber;
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

pub fn get_subscriber(env_filter: &str) -> impl Subscriber + Send + Sync {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let fmt_layer = fmt::layer().with_target(false).json();

    Registry::default().with(filter_layer).with(fmt_layer)
}

/// Installs `subscriber` as the process-wide default. Only the first call wins.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    if set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
