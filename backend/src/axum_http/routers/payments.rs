use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use crates::{
    domain::value_objects::payments::{CreatePaymentModel, CreatePaymentResponse, PaymentDto},
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::payments::PaymentPostgres},
};
use futures_util::StreamExt;
use tracing::{info, warn};

use crate::{
    axum_http::http_serve::AppServices,
    config::config_model::DotEnvyConfig,
    usecases::{UseCaseError, payments::PaymentUseCase},
};

pub struct PaymentsState {
    pub usecase: PaymentUseCase,
    pub keep_alive: Duration,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, services: AppServices, config: Arc<DotEnvyConfig>) -> Router {
    let payment_repository = PaymentPostgres::new(Arc::clone(&db_pool));
    let usecase = PaymentUseCase::new(
        Arc::new(payment_repository),
        services.gateway,
        services.broadcaster,
    );

    Router::new()
        .route("/", post(create_payment))
        .route("/subscribe/:id", get(subscribe_payment))
        .route("/:id", get(get_payment))
        .with_state(Arc::new(PaymentsState {
            usecase,
            keep_alive: Duration::from_secs(config.app.payment_events_keep_alive_secs),
        }))
}

pub async fn create_payment(
    State(state): State<Arc<PaymentsState>>,
    payload: Result<Json<CreatePaymentModel>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, UseCaseError> {
    let Json(model) = payload?;
    let created = state.usecase.create_payment(model).await?;

    if created.dispatch.is_some() {
        info!(
            payment_id = %created.response.payment_id,
            "payments: gateway dispatch continues in background"
        );
    }
    Ok(Json(created.response))
}

pub async fn get_payment(
    State(state): State<Arc<PaymentsState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentDto>, UseCaseError> {
    Ok(Json(state.usecase.get_payment(&id).await?))
}

pub async fn subscribe_payment(
    State(state): State<Arc<PaymentsState>>,
    Path(id): Path<String>,
) -> Response {
    let events = state.usecase.subscribe(&id).await.map(|event| {
        Ok::<_, Infallible>(Event::default().json_data(&event).unwrap_or_else(|err| {
            warn!(error = ?err, "payments: event serialization failed");
            Event::default().comment("serialization-error")
        }))
    });

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(state.keep_alive))
        .into_response()
}
