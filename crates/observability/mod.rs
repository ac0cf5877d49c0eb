mod alerts;
mod config;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use alerts::{AlertDispatcher, AlertLayer};
use config::AlertConfig;

/// Installs the global subscriber: env-filtered local-time fmt output plus optional
/// Discord alerts. Must run inside a Tokio runtime.
pub fn init_observability(component: &str) -> Result<()> {
    let config = AlertConfig::from_env(component);

    let alert_layer = config.discord.as_ref().map(|discord| {
        let dispatcher = AlertDispatcher::spawn(
            discord.webhook_url.clone(),
            config.service.clone(),
            config.environment.clone(),
        );
        AlertLayer::new(dispatcher, discord.min_level)
            .with_filter(LevelFilter::from_level(discord.min_level))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(service = %config.service, warning = %warning, "observability: config warning");
    }

    info!(
        service = %config.service,
        environment = %config.environment,
        alerts = config.discord.is_some(),
        "observability: initialized"
    );

    Ok(())
}
