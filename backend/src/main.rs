use anyhow::Result;
use backend::{
    axum_http::http_serve::{self, AppServices},
    config::config_loader,
    services::payment_broadcaster::PaymentBroadcaster,
};
use crates::{
    infra::{db::postgres::postgres_connection, identity::supabase_auth::SupabaseAuthAdmin},
    notifications::brevo_client::BrevoClient,
    payments::appypay_client::AppyPayClient,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let services = AppServices {
        gateway: Arc::new(AppyPayClient::new(dotenvy_env.appypay.clone())?),
        email_sender: Arc::new(BrevoClient::new(dotenvy_env.brevo.clone())),
        identity_provider: Arc::new(SupabaseAuthAdmin::new(
            dotenvy_env.supabase.project_url.clone(),
            dotenvy_env.supabase.service_key.clone(),
        )),
        broadcaster: Arc::new(PaymentBroadcaster::new()),
    };

    http_serve::start(Arc::new(dotenvy_env), Arc::new(postgres_pool), services).await?;

    Ok(())
}
