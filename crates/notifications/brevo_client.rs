use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::notifications::{
    EmailSender, PaymentPendingEmail, WelcomeEmail,
    templates::{PAYMENT_PENDING_SUBJECT, WELCOME_SUBJECT, payment_pending_html, welcome_html},
};

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Clone)]
pub struct BrevoConfig {
    /// Without a key every send is skipped with a warning.
    pub api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
}

pub struct BrevoClient {
    http: reqwest::Client,
    config: BrevoConfig,
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendSmtpEmail<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: String,
}

impl BrevoClient {
    pub fn new(config: BrevoConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn send(&self, to: &str, name: &str, subject: &str, html_content: String) -> Result<()> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!(to = %to, subject = %subject, "email: brevo api key not configured, skipping send");
            return Ok(());
        };

        let message = SendSmtpEmail {
            sender: Contact {
                email: &self.config.sender_email,
                name: &self.config.sender_name,
            },
            to: vec![Contact { email: to, name }],
            subject,
            html_content,
        };

        let resp = self
            .http
            .post(BREVO_SEND_URL)
            .header("api-key", api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&message)
            .send()
            .await
            .context("brevo unreachable")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(%status, response_body = %body, to = %to, "email: brevo rejected message");
            anyhow::bail!("brevo rejected message (status {status})");
        }

        info!(to = %to, subject = %subject, "email: sent");
        Ok(())
    }
}

#[async_trait]
impl EmailSender for BrevoClient {
    async fn send_welcome(&self, email: WelcomeEmail) -> Result<()> {
        self.send(&email.to, &email.name, WELCOME_SUBJECT, welcome_html(&email))
            .await
    }

    async fn send_payment_pending(&self, email: PaymentPendingEmail) -> Result<()> {
        self.send(
            &email.to,
            &email.name,
            PAYMENT_PENDING_SUBJECT,
            payment_pending_html(&email),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_send_without_api_key() {
        let client = BrevoClient::new(BrevoConfig {
            api_key: None,
            sender_email: "noreply@example.com".to_string(),
            sender_name: "Vibe Coding".to_string(),
        });

        let result = client
            .send_welcome(WelcomeEmail {
                to: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                password: "vibeana@1234".to_string(),
                dashboard_url: "https://app.example.com/dashboard".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn message_uses_brevo_field_names() {
        let message = SendSmtpEmail {
            sender: Contact {
                email: "noreply@example.com",
                name: "Vibe Coding",
            },
            to: vec![Contact {
                email: "ana@example.com",
                name: "Ana",
            }],
            subject: WELCOME_SUBJECT,
            html_content: "<p>hi</p>".to_string(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["htmlContent"], "<p>hi</p>");
        assert_eq!(value["to"][0]["email"], "ana@example.com");
    }
}
