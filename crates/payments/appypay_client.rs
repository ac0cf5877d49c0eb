use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{sync::Mutex, time::Instant};
use tracing::{error, info};

use crate::{
    domain::value_objects::enums::payment_methods::PaymentMethod,
    payments::{ChargeRequest, ChargeResponse, PaymentGateway},
};

pub const DEFAULT_BASE_URL: &str = "https://gwy-api.appypay.co.ao/v2.0";
pub const DEFAULT_TOKEN_URL: &str =
    "https://login.microsoftonline.com/auth.appypay.co.ao/oauth2/token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Tokens are refreshed this long before the issuer's expiry.
const TOKEN_REFRESH_MARGIN_SECS: u64 = 300;
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct AppyPayConfig {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub resource: Option<String>,
    pub gpo_method_id: Option<String>,
    pub ref_method_id: Option<String>,
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// AppyPay charges API client. The OAuth client-credentials token is cached and shared.
pub struct AppyPayClient {
    http: reqwest::Client,
    config: AppyPayConfig,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

impl TokenResponse {
    /// The v1 token endpoint returns `expires_in` as a string.
    fn expires_in_secs(&self) -> u64 {
        match &self.expires_in {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS)
    }
}

/// Builds the `/charges` body. Fails when the method id for the requested family is unset.
pub fn build_charge_payload(config: &AppyPayConfig, charge: &ChargeRequest) -> Result<Value> {
    let method_id = match charge.method {
        PaymentMethod::Multicaixa => config
            .gpo_method_id
            .as_deref()
            .context("APPYPAY_GPO_METHOD_ID not configured")?,
        PaymentMethod::Reference => config
            .ref_method_id
            .as_deref()
            .context("APPYPAY_REF_METHOD_ID not configured")?,
    };

    let mut payload = json!({
        "amount": charge.amount,
        "currency": charge.currency,
        "description": charge.description,
        "merchantTransactionId": charge.merchant_transaction_id,
        "paymentMethod": format!("{}_{}", charge.method.gateway_code(), method_id),
    });

    if charge.method.is_push_confirmation() {
        let mut payment_info = json!({});
        if let Some(phone_number) = &charge.phone_number {
            payment_info["phoneNumber"] = json!(phone_number);
        }
        payload["paymentInfo"] = payment_info;
    }

    Ok(payload)
}

impl AppyPayClient {
    pub fn new(config: AppyPayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build AppyPay http client")?;

        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "appypay: api request failed"
        );

        anyhow::bail!("AppyPay request failed: {} (status {})", context, status);
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
        ];
        match &self.config.resource {
            Some(resource) => form.push(("resource", resource.clone())),
            None => form.push(("scope", format!("{}/.default", self.config.client_id))),
        }

        let resp = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .context("failed to authenticate with AppyPay")?;
        let resp = Self::ensure_success(resp, "oauth token").await?;
        let token: TokenResponse = resp.json().await?;

        let ttl = token
            .expires_in_secs()
            .saturating_sub(TOKEN_REFRESH_MARGIN_SECS);
        info!(ttl_secs = ttl, "appypay: access token refreshed");

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            refresh_at: Instant::now() + Duration::from_secs(ttl),
        });

        Ok(access_token)
    }
}

#[async_trait]
impl PaymentGateway for AppyPayClient {
    async fn create_charge(&self, charge: ChargeRequest) -> Result<ChargeResponse> {
        let payload = build_charge_payload(&self.config, &charge)?;
        let token = self.access_token().await?;

        info!(
            external_id = %charge.merchant_transaction_id,
            method = %charge.method,
            "appypay: creating charge"
        );

        let resp = self
            .http
            .post(format!("{}/charges", self.config.base_url.trim_end_matches('/')))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "pt-PT")
            .header(USER_AGENT, "VibeCoding/1.0")
            .json(&payload)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create charge").await?;

        let raw: Value = resp.json().await?;
        Ok(ChargeResponse::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppyPayConfig {
        AppyPayConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            resource: None,
            gpo_method_id: Some("1111".to_string()),
            ref_method_id: Some("2222".to_string()),
        }
    }

    #[test]
    fn push_charge_carries_phone_number() {
        let charge = ChargeRequest::new(
            15000.0,
            "T26011008000042",
            PaymentMethod::Multicaixa,
            "Vibe Coding - Curso ".to_string(),
        )
        .with_phone_number(Some("923000000".to_string()));

        let payload = build_charge_payload(&config(), &charge).unwrap();

        assert_eq!(payload["paymentMethod"], "GPO_1111");
        assert_eq!(payload["currency"], "AOA");
        assert_eq!(payload["paymentInfo"]["phoneNumber"], "923000000");
    }

    #[test]
    fn push_charge_without_phone_omits_phone_number() {
        let charge = ChargeRequest::new(
            15000.0,
            "T26011008000042",
            PaymentMethod::Multicaixa,
            "Vibe Coding - Curso ".to_string(),
        );

        let payload = build_charge_payload(&config(), &charge).unwrap();

        assert!(payload["paymentInfo"].is_object());
        assert!(payload["paymentInfo"].get("phoneNumber").is_none());
    }

    #[test]
    fn reference_charge_has_no_payment_info() {
        let charge = ChargeRequest::new(
            15000.0,
            "T26011008000042",
            PaymentMethod::Reference,
            "Vibe Coding - Curso ".to_string(),
        );

        let payload = build_charge_payload(&config(), &charge).unwrap();

        assert_eq!(payload["paymentMethod"], "REF_2222");
        assert!(payload.get("paymentInfo").is_none());
    }

    #[test]
    fn missing_method_id_is_a_configuration_error() {
        let mut config = config();
        config.ref_method_id = None;
        let charge = ChargeRequest::new(
            100.0,
            "T26011008000042",
            PaymentMethod::Reference,
            String::new(),
        );

        let err = build_charge_payload(&config, &charge).unwrap_err();
        assert!(err.to_string().contains("APPYPAY_REF_METHOD_ID"));
    }

    #[test]
    fn token_ttl_accepts_string_values() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":"3599"}"#).unwrap();
        assert_eq!(token.expires_in_secs(), 3599);

        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.expires_in_secs(), DEFAULT_TOKEN_TTL_SECS);
    }
}
