use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    services::payment_broadcaster::PaymentBroadcaster,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::{db::postgres::postgres_connection::PgPoolSquad, identity::supabase_auth::IdentityProvider},
    notifications::EmailSender,
    payments::PaymentGateway,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

/// Outbound clients and the in-process broadcaster shared by every router.
#[derive(Clone)]
pub struct AppServices {
    pub gateway: Arc<dyn PaymentGateway>,
    pub email_sender: Arc<dyn EmailSender>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub broadcaster: Arc<PaymentBroadcaster>,
}

pub fn app(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>, services: AppServices) -> Result<Router> {
    let api = Router::new()
        .nest(
            "/payments",
            routers::payments::routes(Arc::clone(&db_pool), services.clone(), Arc::clone(&config)),
        )
        .nest(
            "/webhooks",
            routers::webhooks::routes(Arc::clone(&db_pool), services.clone(), Arc::clone(&config)),
        )
        .nest("/users", routers::users::routes(Arc::clone(&db_pool), services))
        .nest("/progress", routers::progress::routes(Arc::clone(&db_pool)))
        .route("/health-check", get(default_routers::health_check));

    Ok(Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http()))
}

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    services: AppServices,
) -> Result<()> {
    let app = app(Arc::clone(&config), db_pool, services)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
