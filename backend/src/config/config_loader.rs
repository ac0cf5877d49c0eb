use anyhow::{Context, Result};
use crates::{
    notifications::brevo_client::BrevoConfig,
    payments::appypay_client::{AppyPayConfig, DEFAULT_BASE_URL, DEFAULT_TOKEN_URL},
};

use super::config_model::{App, BackendServer, Database, DotEnvyConfig, Supabase};

const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    load_from(|key| std::env::var(key).ok())
}

/// Builds the configuration from any key lookup; blank values count as unset.
pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let required = |key: &str| optional(key).with_context(|| format!("{key} is invalid"));

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let supabase = Supabase {
        project_url: required("SUPABASE_PROJECT_URL")?,
        service_key: required("SUPABASE_SERVICE_KEY")?,
    };

    let appypay = AppyPayConfig {
        base_url: optional("APPYPAY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        token_url: optional("APPYPAY_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        client_id: required("APPYPAY_CLIENT_ID")?,
        client_secret: required("APPYPAY_CLIENT_SECRET")?,
        resource: optional("APPYPAY_RESOURCE"),
        gpo_method_id: optional("APPYPAY_GPO_METHOD_ID"),
        ref_method_id: optional("APPYPAY_REF_METHOD_ID"),
    };

    let brevo = BrevoConfig {
        api_key: optional("BREVO_API_KEY"),
        sender_email: required("BREVO_SENDER_EMAIL")?,
        sender_name: required("BREVO_SENDER_NAME")?,
    };

    let app = App {
        dashboard_url: required("DASHBOARD_URL")?,
        payment_events_keep_alive_secs: match optional("PAYMENT_EVENTS_KEEP_ALIVE_SECS") {
            Some(raw) => raw
                .parse()
                .context("PAYMENT_EVENTS_KEEP_ALIVE_SECS is invalid")?,
            None => DEFAULT_KEEP_ALIVE_SECS,
        },
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        appypay,
        brevo,
        app,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(overrides: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = [
            ("SERVER_PORT_BACKEND", "8080"),
            ("SERVER_BODY_LIMIT", "10"),
            ("SERVER_TIMEOUT", "90"),
            ("DATABASE_URL", "postgres://localhost/vibe"),
            ("SUPABASE_PROJECT_URL", "https://abc.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "service-key"),
            ("APPYPAY_CLIENT_ID", "client"),
            ("APPYPAY_CLIENT_SECRET", "secret"),
            ("BREVO_SENDER_EMAIL", "noreply@example.com"),
            ("BREVO_SENDER_NAME", "Vibe Coding"),
            ("DASHBOARD_URL", "https://app.example.com/dashboard"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (key, value) in overrides {
            vars.insert(key.to_string(), value.to_string());
        }
        vars
    }

    #[test]
    fn applies_defaults_for_optional_keys() {
        let vars = env(&[]);
        let config = load_from(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.backend_server.port, 8080);
        assert_eq!(config.appypay.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.appypay.gpo_method_id, None);
        assert_eq!(config.brevo.api_key, None);
        assert_eq!(config.app.payment_events_keep_alive_secs, 30);
    }

    #[test]
    fn blank_required_key_is_reported_by_name() {
        let vars = env(&[("SUPABASE_SERVICE_KEY", "  ")]);
        let err = load_from(|key| vars.get(key).cloned()).unwrap_err();

        assert!(err.to_string().contains("SUPABASE_SERVICE_KEY"));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let vars = env(&[("SERVER_PORT_BACKEND", "http")]);

        assert!(load_from(|key| vars.get(key).cloned()).is_err());
    }
}
