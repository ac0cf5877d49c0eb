pub mod appypay_client;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::domain::value_objects::{
    enums::payment_methods::PaymentMethod, gateway_webhook::GatewayReference,
    payments::DEFAULT_CURRENCY,
};

/// Charge the gateway is asked to create for a local payment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    /// Major units, as the gateway expects.
    pub amount: f64,
    pub currency: String,
    pub merchant_transaction_id: String,
    pub method: PaymentMethod,
    pub description: String,
    pub phone_number: Option<String>,
}

impl ChargeRequest {
    pub fn new(
        amount: f64,
        merchant_transaction_id: &str,
        method: PaymentMethod,
        description: String,
    ) -> Self {
        Self {
            amount,
            currency: DEFAULT_CURRENCY.to_owned(),
            merchant_transaction_id: merchant_transaction_id.to_owned(),
            method,
            description,
            phone_number: None,
        }
    }

    pub fn with_phone_number(mut self, phone_number: Option<String>) -> Self {
        self.phone_number = phone_number;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeResponse {
    pub status: Option<String>,
    pub reference: Option<GatewayReference>,
    /// Full gateway body, kept on the payment metadata as `appyResponse`.
    pub raw: Value,
}

impl ChargeResponse {
    pub fn from_raw(raw: Value) -> Self {
        let status = raw
            .pointer("/responseStatus/status")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let reference = raw
            .pointer("/responseStatus/reference")
            .cloned()
            .and_then(|value| serde_json::from_value::<GatewayReference>(value).ok());

        Self {
            status,
            reference,
            raw,
        }
    }

    pub fn reference_number(&self) -> Option<String> {
        self.reference
            .as_ref()
            .and_then(|reference| reference.reference_number.clone())
    }

    pub fn entity(&self) -> Option<String> {
        self.reference
            .as_ref()
            .and_then(|reference| reference.entity.clone())
    }
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, charge: ChargeRequest) -> Result<ChargeResponse>;
}
