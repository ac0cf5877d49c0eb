use std::sync::Arc;

use crates::{
    domain::{
        entities::payments::PaymentEntity,
        repositories::payments::PaymentRepository,
        value_objects::{
            enums::{payment_methods::PaymentMethod, payment_statuses::PaymentStatus},
            gateway_webhook::{
                DEFAULT_REFERENCE_ENTITY, GatewayOutcome, GatewayReference, GatewayWebhook,
            },
            payments::PaymentChanges,
        },
    },
    notifications::{EmailSender, PaymentPendingEmail},
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    services::payment_broadcaster::PaymentBroadcaster,
    usecases::{UseCaseError, UseCaseResult, payment_completion::PaymentCompletion},
};

/// How a webhook delivery was resolved. Every variant is acknowledged with 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Completed { side_effects_ok: bool },
    Transitioned(PaymentStatus),
    /// The row had already left `pending`; another delivery got there first.
    AlreadyTransitioned,
    Unchanged,
    /// A store call failed after the payment was found; logged and acknowledged.
    Deferred,
}

pub struct PaymentReconciliationUseCase {
    payment_repository: Arc<dyn PaymentRepository>,
    completion: Arc<PaymentCompletion>,
    email_sender: Arc<dyn EmailSender>,
    broadcaster: Arc<PaymentBroadcaster>,
}

impl PaymentReconciliationUseCase {
    pub fn new(
        payment_repository: Arc<dyn PaymentRepository>,
        completion: Arc<PaymentCompletion>,
        email_sender: Arc<dyn EmailSender>,
        broadcaster: Arc<PaymentBroadcaster>,
    ) -> Self {
        Self {
            payment_repository,
            completion,
            email_sender,
            broadcaster,
        }
    }

    pub async fn handle_webhook(&self, webhook: GatewayWebhook) -> UseCaseResult<WebhookOutcome> {
        let Some(external_id) = webhook.merchant_transaction_id() else {
            warn!("gateway_webhook: delivery without merchantTransactionId");
            return Err(UseCaseError::Validation(
                "merchantTransactionId is required".to_string(),
            ));
        };

        let payment = self
            .payment_repository
            .find_by_external_id(external_id)
            .await
            .map_err(|err| {
                error!(%external_id, db_error = ?err, "gateway_webhook: payment lookup failed");
                UseCaseError::Store(err)
            })?
            .ok_or_else(|| {
                warn!(%external_id, "gateway_webhook: unknown merchantTransactionId");
                UseCaseError::NotFound("payment")
            })?;

        let outcome = webhook.outcome();
        let stored = payment.status();
        let target = outcome.target_status(stored);
        info!(
            payment_id = %payment.id,
            %external_id,
            ?outcome,
            %stored,
            %target,
            "gateway_webhook: delivery received"
        );

        if outcome == GatewayOutcome::Pending
            && stored == PaymentStatus::Pending
            && payment.method() == Some(PaymentMethod::Reference)
        {
            if let Some(reference) = webhook.reference_details() {
                self.record_reference(&payment, reference).await;
            }
        }

        let result = if target == PaymentStatus::Completed && stored != PaymentStatus::Completed {
            self.complete(&payment).await
        } else if target != stored {
            self.move_to(&payment, target).await
        } else {
            Ok(WebhookOutcome::Unchanged)
        };

        Ok(result.unwrap_or_else(|err| {
            error!(
                payment_id = %payment.id,
                external_id = %payment.external_id,
                db_error = ?err,
                "gateway_webhook: transition failed"
            );
            WebhookOutcome::Deferred
        }))
    }

    async fn complete(&self, payment: &PaymentEntity) -> anyhow::Result<WebhookOutcome> {
        let Some(completed) = self
            .payment_repository
            .transition(
                payment.id,
                PaymentStatus::Pending,
                PaymentChanges::status(PaymentStatus::Completed),
            )
            .await?
        else {
            info!(payment_id = %payment.id, "gateway_webhook: completion already claimed");
            return Ok(WebhookOutcome::AlreadyTransitioned);
        };

        let side_effects_ok = self.completion.complete(&completed).await;

        let latest = match self
            .payment_repository
            .find_by_external_id(&completed.external_id)
            .await
        {
            Ok(Some(latest)) => latest,
            Ok(None) => completed,
            Err(err) => {
                warn!(payment_id = %completed.id, db_error = ?err, "gateway_webhook: re-read failed");
                completed
            }
        };
        self.broadcaster.publish_payment(&latest);

        Ok(WebhookOutcome::Completed { side_effects_ok })
    }

    async fn move_to(
        &self,
        payment: &PaymentEntity,
        target: PaymentStatus,
    ) -> anyhow::Result<WebhookOutcome> {
        match self
            .payment_repository
            .transition(payment.id, PaymentStatus::Pending, PaymentChanges::status(target))
            .await?
        {
            Some(updated) => {
                self.broadcaster.publish_payment(&updated);
                Ok(WebhookOutcome::Transitioned(target))
            }
            None => Ok(WebhookOutcome::AlreadyTransitioned),
        }
    }

    /// Mails the payment data and keeps the reference on the row. Failures are only logged.
    async fn record_reference(&self, payment: &PaymentEntity, reference: &GatewayReference) {
        let Some(reference_number) = reference.reference_number.clone() else {
            return;
        };
        let entity = reference
            .entity
            .clone()
            .unwrap_or_else(|| DEFAULT_REFERENCE_ENTITY.to_string());

        let email = PaymentPendingEmail {
            to: payment.customer_email.clone(),
            name: payment.customer_name.clone(),
            reference_number: reference_number.clone(),
            entity: entity.clone(),
            amount_minor: payment.amount_minor,
        };
        if let Err(err) = self.email_sender.send_payment_pending(email).await {
            error!(payment_id = %payment.id, error = ?err, "gateway_webhook: payment data email failed");
        }

        let mut changes = PaymentChanges::default()
            .with_reference(Some(reference_number), Some(entity.clone()))
            .with_metadata("entity", Value::String(entity));
        if let Some(due_date) = reference.due_date.clone() {
            changes = changes.with_metadata("dueDate", Value::String(due_date));
        }
        if let Err(err) = self.payment_repository.update(payment.id, changes).await {
            error!(payment_id = %payment.id, db_error = ?err, "gateway_webhook: saving reference failed");
        }
    }
}
