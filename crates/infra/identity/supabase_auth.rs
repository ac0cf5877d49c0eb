use anyhow::{Context, Result};
use async_trait::async_trait;
use mockall::automock;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

/// Hosted identity provider that owns passwords and login.
#[automock]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates a confirmed auth user and returns its id.
    async fn create_auth_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<String>,
    ) -> Result<Uuid>;
}

pub struct SupabaseAuthAdmin {
    http: reqwest::Client,
    project_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct AdminUserResponse {
    id: Uuid,
}

impl SupabaseAuthAdmin {
    pub fn new(project_url: String, service_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            project_url: project_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthAdmin {
    async fn create_auth_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<String>,
    ) -> Result<Uuid> {
        let body = json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": {
                "full_name": full_name,
                "phone": phone,
            },
        });

        let resp = self
            .http
            .post(format!("{}/auth/v1/admin/users", self.project_url))
            .header("apikey", &self.service_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .context("identity provider unreachable")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(%status, response_body = %body, "identity: create auth user failed");
            anyhow::bail!("identity provider rejected user creation (status {status})");
        }

        let created: AdminUserResponse = resp.json().await?;
        info!(user_id = %created.id, "identity: auth user created");

        Ok(created.id)
    }
}
