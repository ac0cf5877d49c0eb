use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::{
        repositories::payments::PaymentRepository,
        value_objects::gateway_webhook::GatewayWebhook,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            entitlements::EntitlementPostgres, payments::PaymentPostgres, users::UserPostgres,
        },
    },
};
use tracing::info;

use crate::{
    axum_http::http_serve::AppServices,
    config::config_model::DotEnvyConfig,
    usecases::{
        UseCaseError, account_provisioner::AccountProvisioner,
        payment_completion::PaymentCompletion, payment_reconciliation::PaymentReconciliationUseCase,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, services: AppServices, config: Arc<DotEnvyConfig>) -> Router {
    let payment_repository: Arc<dyn PaymentRepository> =
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool)));
    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let entitlement_repository = Arc::new(EntitlementPostgres::new(Arc::clone(&db_pool)));

    let account_provisioner =
        AccountProvisioner::new(user_repository.clone(), services.identity_provider);
    let completion = PaymentCompletion::new(
        Arc::clone(&payment_repository),
        user_repository,
        entitlement_repository,
        Arc::new(account_provisioner),
        Arc::clone(&services.email_sender),
        config.app.dashboard_url.clone(),
    );
    let usecase = PaymentReconciliationUseCase::new(
        payment_repository,
        Arc::new(completion),
        services.email_sender,
        services.broadcaster,
    );

    Router::new()
        .route("/gateway", post(gateway_webhook))
        .with_state(Arc::new(usecase))
}

/// Answers 200 once the payment is known, whatever happened downstream, so the gateway
/// stops retrying.
pub async fn gateway_webhook(
    State(usecase): State<Arc<PaymentReconciliationUseCase>>,
    payload: Result<Json<GatewayWebhook>, JsonRejection>,
) -> Result<impl IntoResponse, UseCaseError> {
    let Json(webhook) = payload?;
    let outcome = usecase.handle_webhook(webhook).await?;
    info!(?outcome, "gateway_webhook: acknowledged");

    Ok((StatusCode::OK, "OK"))
}
