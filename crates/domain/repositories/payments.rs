use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity},
    value_objects::{enums::payment_statuses::PaymentStatus, payments::PaymentChanges},
};

#[automock]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: InsertPaymentEntity) -> Result<PaymentEntity>;
    /// Looks the payment up by internal UUID or by gateway transaction id.
    async fn find_by_any_id(&self, id: &str) -> Result<Option<PaymentEntity>>;
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<PaymentEntity>>;
    async fn update(&self, payment_id: Uuid, changes: PaymentChanges) -> Result<PaymentEntity>;
    /// Applies `changes` only while the stored status still equals `from`.
    /// `None` means another writer moved the payment first.
    async fn transition(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        changes: PaymentChanges,
    ) -> Result<Option<PaymentEntity>>;
}
