use crates::{notifications::brevo_client::BrevoConfig, payments::appypay_client::AppyPayConfig};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub appypay: AppyPayConfig,
    pub brevo: BrevoConfig,
    pub app: App,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct App {
    /// Linked from the welcome email.
    pub dashboard_url: String,
    pub payment_events_keep_alive_secs: u64,
}
