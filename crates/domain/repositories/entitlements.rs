use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::entitlements::{InsertEnrollmentEntity, InsertProjectPurchaseEntity};

/// Grants return `true` when a new row was written and `false` when it already existed.
#[automock]
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    async fn grant_project(&self, purchase: InsertProjectPurchaseEntity) -> Result<bool>;
    async fn enroll_course(&self, enrollment: InsertEnrollmentEntity) -> Result<bool>;
}
