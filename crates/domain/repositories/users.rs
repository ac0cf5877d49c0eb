use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::users::{InsertUserEntity, UpdateUserProfileEntity, UserEntity},
    value_objects::enums::user_roles::UserRole,
};

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user already exists")]
    DuplicateKey,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[automock]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;
    /// Case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;
    async fn insert(&self, user: InsertUserEntity) -> std::result::Result<UserEntity, UserStoreError>;
    async fn grant_access(&self, user_id: Uuid) -> Result<()>;
    async fn set_role(&self, user_id: Uuid, role: UserRole) -> Result<()>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        profile: UpdateUserProfileEntity,
    ) -> Result<Option<UserEntity>>;
}
