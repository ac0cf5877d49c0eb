use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        enums::{payment_methods::PaymentMethod, payment_statuses::PaymentStatus},
        payments::PaymentMetadata,
    },
    infra::db::postgres::schema::payments,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub external_id: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub reference_code: Option<String>,
    pub entity_code: Option<String>,
    pub metadata: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentEntity {
    /// Unknown stored values are treated as pending so they can still be resolved by a webhook.
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_str(&self.status).unwrap_or_default()
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        PaymentMethod::from_str(&self.payment_method)
    }

    pub fn purchase_metadata(&self) -> PaymentMetadata {
        PaymentMetadata::from_value(&self.metadata)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub external_id: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub metadata: serde_json::Value,
}

/// Full-row write used after `PaymentChanges` were applied to a locked row.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payments, treat_none_as_null = true)]
pub struct PaymentRowUpdate {
    pub user_id: Option<Uuid>,
    pub status: String,
    pub reference_code: Option<String>,
    pub entity_code: Option<String>,
    pub metadata: serde_json::Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PaymentEntity> for PaymentRowUpdate {
    fn from(value: &PaymentEntity) -> Self {
        Self {
            user_id: value.user_id,
            status: value.status.clone(),
            reference_code: value.reference_code.clone(),
            entity_code: value.entity_code.clone(),
            metadata: value.metadata.clone(),
            paid_at: value.paid_at,
            updated_at: value.updated_at,
        }
    }
}
