use std::sync::Arc;

use anyhow::Error;
use chrono::Utc;
use crates::{
    domain::{
        entities::payments::{InsertPaymentEntity, PaymentEntity},
        repositories::payments::PaymentRepository,
        value_objects::{
            enums::{payment_methods::PaymentMethod, payment_statuses::PaymentStatus},
            payments::{
                CreatePaymentModel, CreatePaymentResponse, DEFAULT_CURRENCY, PaymentChanges,
                PaymentDraft, PaymentDto, amount_to_minor, generate_external_id, minor_to_major,
            },
        },
    },
    payments::{ChargeRequest, PaymentGateway},
};
use futures_util::stream::BoxStream;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    services::{
        payment_broadcaster::PaymentBroadcaster,
        payment_stream::{PaymentStreamEvent, open_payment_stream},
    },
    usecases::{UseCaseError, UseCaseResult},
};

pub const PUSH_PENDING_MESSAGE: &str = "Aguardando confirmação no telemóvel";

/// Result of a create request. `dispatch` is set for push-confirmation payments, whose
/// gateway call keeps running after the response was sent.
pub struct CreatedPayment {
    pub response: CreatePaymentResponse,
    pub dispatch: Option<JoinHandle<()>>,
}

pub struct PaymentUseCase {
    payment_repository: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    broadcaster: Arc<PaymentBroadcaster>,
}

impl PaymentUseCase {
    pub fn new(
        payment_repository: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        broadcaster: Arc<PaymentBroadcaster>,
    ) -> Self {
        Self {
            payment_repository,
            gateway,
            broadcaster,
        }
    }

    pub async fn create_payment(&self, model: CreatePaymentModel) -> UseCaseResult<CreatedPayment> {
        let draft = model.validate().map_err(|err| {
            warn!(error = %err, "payments: create request rejected");
            UseCaseError::Validation(err.to_string())
        })?;

        let external_id = generate_external_id(Utc::now(), &mut rand::thread_rng());
        let insert = InsertPaymentEntity {
            external_id,
            user_id: draft.user_id,
            customer_name: draft.customer_name.clone(),
            customer_email: draft.customer_email.clone(),
            customer_phone: draft.customer_phone.clone(),
            amount_minor: amount_to_minor(draft.amount),
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method: draft.method.to_string(),
            status: PaymentStatus::Pending.to_string(),
            metadata: draft.metadata.to_value(),
        };

        let payment = self.payment_repository.create(insert).await.map_err(|err| {
            error!(db_error = ?err, "payments: insert failed");
            UseCaseError::Store(err)
        })?;
        info!(
            payment_id = %payment.id,
            external_id = %payment.external_id,
            method = %draft.method,
            amount_minor = payment.amount_minor,
            "payments: payment created"
        );

        let charge = ChargeRequest::new(
            minor_to_major(payment.amount_minor),
            &payment.external_id,
            draft.method,
            draft.description(),
        );

        match draft.method {
            PaymentMethod::Multicaixa => Ok(self.start_push_charge(payment, charge, &draft)),
            PaymentMethod::Reference => self.create_reference_charge(payment, charge).await,
        }
    }

    fn start_push_charge(
        &self,
        payment: PaymentEntity,
        charge: ChargeRequest,
        draft: &PaymentDraft,
    ) -> CreatedPayment {
        let phone_number = draft
            .multicaixa_phone
            .clone()
            .or_else(|| draft.customer_phone.clone());
        let charge = charge.with_phone_number(phone_number);

        let response = CreatePaymentResponse {
            payment_id: payment.id,
            merchant_transaction_id: payment.external_id.clone(),
            status: "processing".to_string(),
            message: Some(PUSH_PENDING_MESSAGE.to_string()),
            reference_code: None,
            entity: None,
            appy_response: None,
        };

        let payment_repository = Arc::clone(&self.payment_repository);
        let gateway = Arc::clone(&self.gateway);
        let broadcaster = Arc::clone(&self.broadcaster);
        let dispatch = tokio::spawn(async move {
            match gateway.create_charge(charge).await {
                Ok(charge_response) => {
                    let changes = PaymentChanges::default()
                        .with_metadata("appyResponse", charge_response.raw);
                    match payment_repository.update(payment.id, changes).await {
                        Ok(_) => info!(
                            payment_id = %payment.id,
                            external_id = %payment.external_id,
                            "payments: push charge sent to customer phone"
                        ),
                        Err(err) => error!(
                            payment_id = %payment.id,
                            db_error = ?err,
                            "payments: saving gateway response failed"
                        ),
                    }
                }
                Err(err) => {
                    error!(
                        payment_id = %payment.id,
                        external_id = %payment.external_id,
                        error = ?err,
                        "payments: push charge failed"
                    );
                    mark_failed(payment_repository.as_ref(), &broadcaster, &payment, &err).await;
                }
            }
        });

        CreatedPayment {
            response,
            dispatch: Some(dispatch),
        }
    }

    async fn create_reference_charge(
        &self,
        payment: PaymentEntity,
        charge: ChargeRequest,
    ) -> UseCaseResult<CreatedPayment> {
        let charge_response = match self.gateway.create_charge(charge).await {
            Ok(charge_response) => charge_response,
            Err(err) => {
                error!(
                    payment_id = %payment.id,
                    external_id = %payment.external_id,
                    error = ?err,
                    "payments: reference charge failed"
                );
                mark_failed(
                    self.payment_repository.as_ref(),
                    &self.broadcaster,
                    &payment,
                    &err,
                )
                .await;
                return Err(UseCaseError::Upstream(err));
            }
        };

        let reference_code = charge_response.reference_number();
        let entity = charge_response.entity();

        let mut changes = PaymentChanges::default()
            .with_reference(reference_code.clone(), entity.clone())
            .with_metadata("appyResponse", charge_response.raw.clone());
        if let Some(entity) = &entity {
            changes = changes.with_metadata("entity", Value::String(entity.clone()));
        }
        if let Err(err) = self.payment_repository.update(payment.id, changes).await {
            error!(payment_id = %payment.id, db_error = ?err, "payments: saving reference failed");
        }

        info!(
            payment_id = %payment.id,
            external_id = %payment.external_id,
            reference_code = reference_code.as_deref().unwrap_or_default(),
            "payments: reference issued"
        );

        Ok(CreatedPayment {
            response: CreatePaymentResponse {
                payment_id: payment.id,
                merchant_transaction_id: payment.external_id,
                status: PaymentStatus::Pending.to_string(),
                message: None,
                reference_code,
                entity,
                appy_response: Some(charge_response.raw),
            },
            dispatch: None,
        })
    }

    pub async fn get_payment(&self, id: &str) -> UseCaseResult<PaymentDto> {
        self.payment_repository
            .find_by_any_id(id)
            .await
            .map_err(|err| {
                error!(payment_id = %id, db_error = ?err, "payments: lookup failed");
                UseCaseError::Store(err)
            })?
            .map(PaymentDto::from)
            .ok_or(UseCaseError::NotFound("payment"))
    }

    pub async fn subscribe(&self, id: &str) -> BoxStream<'static, PaymentStreamEvent> {
        open_payment_stream(&self.broadcaster, &self.payment_repository, id).await
    }
}

/// Moves a still-pending payment to `failed` and tells any watcher.
async fn mark_failed(
    payment_repository: &dyn PaymentRepository,
    broadcaster: &PaymentBroadcaster,
    payment: &PaymentEntity,
    err: &Error,
) {
    let changes = PaymentChanges::status(PaymentStatus::Failed)
        .with_metadata("error", Value::String(format!("{err:#}")));

    match payment_repository
        .transition(payment.id, PaymentStatus::Pending, changes)
        .await
    {
        Ok(Some(failed)) => {
            broadcaster.publish_payment(&failed);
        }
        Ok(None) => info!(
            payment_id = %payment.id,
            "payments: payment left pending before the failure was recorded"
        ),
        Err(db_err) => error!(
            payment_id = %payment.id,
            db_error = ?db_err,
            "payments: marking payment failed did not persist"
        ),
    }
}
