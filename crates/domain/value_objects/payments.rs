use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::enums::{
        payment_methods::PaymentMethod, payment_statuses::PaymentStatus,
        purchase_types::PurchaseType,
    },
};

pub const DEFAULT_CURRENCY: &str = "AOA";
pub const PAYMENT_PROVIDER: &str = "appypay";
/// Gateway identifiers are capped at 15 alphanumeric characters.
pub const EXTERNAL_ID_MAX_LEN: usize = 15;

/// `T` + `YYMMDDhhmmss` + two random digits.
pub fn generate_external_id<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: u8 = rng.gen_range(0..100);
    format!("T{}{:02}", now.format("%y%m%d%H%M%S"), suffix)
}

pub fn is_valid_external_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= EXTERNAL_ID_MAX_LEN
        && value.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn amount_to_minor(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn minor_to_major(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

/// Product the payment unlocks once it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementTarget {
    Course(Uuid),
    Project(Uuid),
}

/// Typed view over the purchase fields of the payment metadata object. Both the camelCase
/// keys written by this service and the snake_case keys of older rows are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub purchase_type: Option<PurchaseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl PaymentMetadata {
    pub fn from_value(value: &Value) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::to_owned)
        };
        let uuid = |keys: &[&str]| text(keys).and_then(|raw| Uuid::parse_str(&raw).ok());

        let purchase_type = match text(&["type"]).as_deref() {
            Some("course") => Some(PurchaseType::Course),
            Some("project") => Some(PurchaseType::Project),
            _ => None,
        };

        Self {
            purchase_type,
            course_id: uuid(&["courseId", "course_id"]),
            project_id: uuid(&["projectId", "project_id"]),
            provider: text(&["provider"]),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    pub fn entitlement_target(&self) -> Option<EntitlementTarget> {
        match self.purchase_type? {
            PurchaseType::Course => self.course_id.map(EntitlementTarget::Course),
            PurchaseType::Project => self.project_id.map(EntitlementTarget::Project),
        }
    }
}

/// Mutation applied to a payment row. Metadata is merged key by key into the stored object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentChanges {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
    pub reference_code: Option<String>,
    pub entity_code: Option<String>,
    pub metadata: Map<String, Value>,
}

impl PaymentChanges {
    pub fn status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_owned(), value);
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_reference(mut self, reference_code: Option<String>, entity_code: Option<String>) -> Self {
        self.reference_code = reference_code;
        self.entity_code = entity_code;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.user_id.is_none()
            && self.reference_code.is_none()
            && self.entity_code.is_none()
            && self.metadata.is_empty()
    }

    /// Applies the changes to an in-memory row. `paid_at` is stamped only on the first move
    /// into `completed`.
    pub fn apply(&self, payment: &mut PaymentEntity, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            if status == PaymentStatus::Completed && payment.paid_at.is_none() {
                payment.paid_at = Some(now);
            }
            payment.status = status.as_str().to_owned();
        }
        if let Some(user_id) = self.user_id {
            payment.user_id = Some(user_id);
        }
        if let Some(reference_code) = &self.reference_code {
            payment.reference_code = Some(reference_code.clone());
        }
        if let Some(entity_code) = &self.entity_code {
            payment.entity_code = Some(entity_code.clone());
        }
        if !self.metadata.is_empty() {
            let mut merged = match payment.metadata.take() {
                Value::Object(existing) => existing,
                _ => Map::new(),
            };
            for (key, value) in &self.metadata {
                merged.insert(key.clone(), value.clone());
            }
            payment.metadata = Value::Object(merged);
        }
        payment.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentModel {
    pub amount: Option<f64>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: Option<String>,
    pub course_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub purchase_type: Option<PurchaseType>,
    pub user_id: Option<Uuid>,
    pub multicaixa_phone: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum CreatePaymentModelError {
    #[error("missing required fields: {0}")]
    MissingFields(String),
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("unsupported payment method: {0}")]
    UnsupportedMethod(String),
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub amount: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub method: PaymentMethod,
    pub user_id: Option<Uuid>,
    pub multicaixa_phone: Option<String>,
    pub metadata: PaymentMetadata,
}

impl PaymentDraft {
    pub fn description(&self) -> String {
        let target = self
            .metadata
            .course_id
            .or(self.metadata.project_id)
            .map(|id| id.to_string())
            .unwrap_or_default();
        format!("Vibe Coding - Curso {target}")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl CreatePaymentModel {
    pub fn validate(self) -> Result<PaymentDraft, CreatePaymentModelError> {
        let customer_name = non_blank(self.customer_name);
        let customer_email = non_blank(self.customer_email);
        let payment_method = non_blank(self.payment_method);

        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("amount");
        }
        if customer_name.is_none() {
            missing.push("customerName");
        }
        if customer_email.is_none() {
            missing.push("customerEmail");
        }
        if payment_method.is_none() {
            missing.push("paymentMethod");
        }

        let (Some(amount), Some(customer_name), Some(customer_email), Some(payment_method)) =
            (self.amount, customer_name, customer_email, payment_method)
        else {
            return Err(CreatePaymentModelError::MissingFields(missing.join(", ")));
        };

        if !amount.is_finite() || amount_to_minor(amount) <= 0 {
            return Err(CreatePaymentModelError::InvalidAmount);
        }

        let method = PaymentMethod::from_str(&payment_method)
            .ok_or(CreatePaymentModelError::UnsupportedMethod(payment_method))?;

        let purchase_type = self.purchase_type.unwrap_or(if self.course_id.is_some() {
            PurchaseType::Course
        } else {
            PurchaseType::Project
        });

        Ok(PaymentDraft {
            amount,
            customer_name,
            customer_email,
            customer_phone: non_blank(self.customer_phone),
            method,
            user_id: self.user_id,
            multicaixa_phone: non_blank(self.multicaixa_phone),
            metadata: PaymentMetadata {
                purchase_type: Some(purchase_type),
                course_id: self.course_id,
                project_id: self.project_id,
                provider: Some(PAYMENT_PROVIDER.to_owned()),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub payment_id: Uuid,
    pub merchant_transaction_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appy_response: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentDto {
    pub id: Uuid,
    pub external_id: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub reference_code: Option<String>,
    pub entity_code: Option<String>,
    pub metadata: Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentEntity> for PaymentDto {
    fn from(value: PaymentEntity) -> Self {
        let status = value.status();
        Self {
            id: value.id,
            external_id: value.external_id,
            user_id: value.user_id,
            customer_name: value.customer_name,
            customer_email: value.customer_email,
            customer_phone: value.customer_phone,
            amount_minor: value.amount_minor,
            currency: value.currency,
            payment_method: value.payment_method,
            status,
            reference_code: value.reference_code,
            entity_code: value.entity_code,
            metadata: value.metadata,
            paid_at: value.paid_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
