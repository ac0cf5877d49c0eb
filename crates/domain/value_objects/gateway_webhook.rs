use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::value_objects::enums::payment_statuses::PaymentStatus;

/// Entity code AppyPay uses for reference payments when the callback omits it.
pub const DEFAULT_REFERENCE_ENTITY: &str = "11424";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayWebhook {
    #[serde(default, deserialize_with = "lenient_string")]
    pub merchant_transaction_id: Option<String>,
    #[serde(default)]
    pub response_status: Option<GatewayResponseStatus>,
    #[serde(default)]
    pub reference: Option<GatewayReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponseStatus {
    #[serde(default)]
    pub status: Option<String>,
    /// Reported but not trusted: the gateway sends `true` for pending charges too.
    #[serde(default)]
    pub successful: Option<bool>,
    #[serde(default)]
    pub reference: Option<GatewayReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayReference {
    #[serde(default, alias = "reference", deserialize_with = "lenient_string")]
    pub reference_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub entity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub due_date: Option<String>,
}

/// Accepts strings or numbers, since the gateway is not consistent about reference types.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// What a gateway status string means for the local payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    Pending,
    Completed,
    Failed,
    Unrecognized,
}

impl GatewayOutcome {
    /// Status the payment should end up in. Unrecognized statuses leave it untouched.
    pub fn target_status(&self, current: PaymentStatus) -> PaymentStatus {
        match self {
            GatewayOutcome::Pending => PaymentStatus::Pending,
            GatewayOutcome::Completed => PaymentStatus::Completed,
            GatewayOutcome::Failed => PaymentStatus::Failed,
            GatewayOutcome::Unrecognized => current,
        }
    }
}

/// Classifies on the status text alone; `pending` is checked before anything else.
pub fn classify_gateway_status(status: Option<&str>) -> GatewayOutcome {
    let status = status.unwrap_or_default().trim().to_lowercase();
    match status.as_str() {
        "pending" => GatewayOutcome::Pending,
        "success" | "completed" | "paid" => GatewayOutcome::Completed,
        "failed" | "expired" | "cancelled" => GatewayOutcome::Failed,
        _ => GatewayOutcome::Unrecognized,
    }
}

impl GatewayWebhook {
    pub fn outcome(&self) -> GatewayOutcome {
        classify_gateway_status(
            self.response_status
                .as_ref()
                .and_then(|status| status.status.as_deref()),
        )
    }

    pub fn merchant_transaction_id(&self) -> Option<&str> {
        self.merchant_transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Reference details with a usable reference number. The top-level block wins over the
    /// one nested in `responseStatus`.
    pub fn reference_details(&self) -> Option<&GatewayReference> {
        let usable = |reference: &&GatewayReference| reference.reference_number.is_some();
        self.reference.as_ref().filter(usable).or_else(|| {
            self.response_status
                .as_ref()
                .and_then(|status| status.reference.as_ref())
                .filter(usable)
        })
    }
}
