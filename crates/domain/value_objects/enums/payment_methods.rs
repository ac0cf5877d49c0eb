use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Multicaixa Express: the customer confirms on their phone and the outcome only
    /// arrives through the webhook.
    Multicaixa,
    /// Bank reference the customer pays later at an ATM or in home banking.
    Reference,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Multicaixa => "multicaixa",
            PaymentMethod::Reference => "reference",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "multicaixa" | "express" => Some(PaymentMethod::Multicaixa),
            "reference" | "referencia" => Some(PaymentMethod::Reference),
            _ => None,
        }
    }

    /// Method family code the gateway expects in front of the configured method id.
    pub fn gateway_code(&self) -> &'static str {
        match self {
            PaymentMethod::Multicaixa => "GPO",
            PaymentMethod::Reference => "REF",
        }
    }

    pub fn is_push_confirmation(&self) -> bool {
        matches!(self, PaymentMethod::Multicaixa)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
