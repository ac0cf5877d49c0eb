pub mod brevo_client;
pub mod templates;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeEmail {
    pub to: String,
    pub name: String,
    pub password: String,
    pub dashboard_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPendingEmail {
    pub to: String,
    pub name: String,
    pub reference_number: String,
    pub entity: String,
    pub amount_minor: i64,
}

/// Transactional email delivery. Callers log failures and move on.
#[automock]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_welcome(&self, email: WelcomeEmail) -> Result<()>;
    async fn send_payment_pending(&self, email: PaymentPendingEmail) -> Result<()>;
}
