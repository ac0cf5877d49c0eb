use std::env;

use tracing::Level;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct DiscordTarget {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct AlertConfig {
    pub(crate) service: String,
    pub(crate) environment: String,
    pub(crate) discord: Option<DiscordTarget>,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl AlertConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut warnings = Vec::new();

        let service = value("SERVICE_NAME").unwrap_or_else(|| component.trim().to_string());
        let environment = value("STAGE").unwrap_or_else(|| "unknown".to_string());

        let enabled = match value("DISCORD_NOTIFY_ENABLED") {
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                warnings.push(format!("DISCORD_NOTIFY_ENABLED is not a boolean ({raw}); treating as enabled"));
                true
            }),
            None => true,
        };

        let webhook_url = match value("DISCORD_WEBHOOK_URL") {
            Some(raw) if enabled => match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(err) => {
                    warnings.push(format!("DISCORD_WEBHOOK_URL is invalid ({err}); alerts disabled"));
                    None
                }
            },
            _ => None,
        };

        let discord = webhook_url.map(|webhook_url| {
            let min_level = match value("DISCORD_NOTIFY_LEVEL") {
                Some(raw) => parse_level(&raw).unwrap_or_else(|| {
                    warnings.push(format!("DISCORD_NOTIFY_LEVEL is invalid ({raw}); using error"));
                    Level::ERROR
                }),
                None => Level::ERROR,
            };
            DiscordTarget {
                webhook_url,
                min_level,
            }
        });

        Self {
            service,
            environment,
            discord,
            warnings,
        }
    }
}

fn parse_level(input: &str) -> Option<Level> {
    match input.to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn parse_flag(input: &str) -> Option<bool> {
    match input.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> AlertConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AlertConfig::from_lookup("backend", |key| vars.get(key).cloned())
    }

    #[test]
    fn alerts_are_off_without_webhook() {
        let config = config(&[]);
        assert!(config.discord.is_none());
        assert_eq!(config.service, "backend");
        assert_eq!(config.environment, "unknown");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn level_defaults_to_error_and_bad_values_warn() {
        let config = config(&[
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
            ("DISCORD_NOTIFY_LEVEL", "loud"),
        ]);

        let discord = config.discord.unwrap();
        assert_eq!(discord.min_level, Level::ERROR);
        assert_eq!(config.warnings.len(), 1);
    }

    #[test]
    fn disabled_flag_wins_over_webhook() {
        let config = config(&[
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
            ("DISCORD_NOTIFY_ENABLED", "off"),
        ]);
        assert!(config.discord.is_none());
    }

    #[test]
    fn invalid_webhook_is_reported_without_echoing_it() {
        let config = config(&[("DISCORD_WEBHOOK_URL", "not a url")]);
        assert!(config.discord.is_none());
        assert!(!config.warnings[0].contains("not a url"));
    }
}
