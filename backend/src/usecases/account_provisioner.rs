use std::sync::Arc;

use anyhow::{Result, anyhow};
use crates::{
    domain::{
        entities::users::{InsertUserEntity, UserEntity},
        repositories::users::{UserRepository, UserStoreError},
        value_objects::users::AccountRequest,
    },
    infra::identity::supabase_auth::IdentityProvider,
};
use rand::{Rng, seq::SliceRandom};
use tracing::{info, warn};

const PASSWORD_PREFIX: &str = "vibe";
const PASSWORD_SYMBOLS: [char; 5] = ['@', '#', '$', '!', '*'];

#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionedAccount {
    Existing(UserEntity),
    Created { user: UserEntity, password: String },
}

impl ProvisionedAccount {
    pub fn user(&self) -> &UserEntity {
        match self {
            ProvisionedAccount::Existing(user) => user,
            ProvisionedAccount::Created { user, .. } => user,
        }
    }
}

/// `vibe` + alphabetic part of the lowercased first name + a symbol + four digits.
pub fn generate_password<R: Rng>(full_name: &str, rng: &mut R) -> String {
    let first_name: String = full_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    let symbol = PASSWORD_SYMBOLS.choose(rng).copied().unwrap_or('@');
    let digits: u16 = rng.gen_range(1000..=9999);

    format!("{PASSWORD_PREFIX}{first_name}{symbol}{digits}")
}

/// Finds the account for an email or mints one in the identity provider and the user table.
pub struct AccountProvisioner {
    user_repository: Arc<dyn UserRepository>,
    identity_provider: Arc<dyn IdentityProvider>,
}

impl AccountProvisioner {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            user_repository,
            identity_provider,
        }
    }

    pub async fn provision(&self, request: &AccountRequest) -> Result<ProvisionedAccount> {
        let password = generate_password(&request.full_name, &mut rand::thread_rng());
        self.provision_with_password(request, password).await
    }

    pub async fn provision_with_password(
        &self,
        request: &AccountRequest,
        password: String,
    ) -> Result<ProvisionedAccount> {
        if let Some(user) = self.user_repository.find_by_email(&request.email).await? {
            info!(user_id = %user.id, "account_provisioner: account already exists");
            return Ok(ProvisionedAccount::Existing(user));
        }

        let user_id = self
            .identity_provider
            .create_auth_user(
                &request.email,
                &password,
                &request.full_name,
                request.phone.clone(),
            )
            .await?;

        let insert = InsertUserEntity {
            id: user_id,
            email: request.email.clone(),
            full_name: Some(request.full_name.clone()).filter(|name| !name.is_empty()),
            phone: request.phone.clone(),
            role: request.role.to_string(),
            has_access: true,
        };

        let user = match self.user_repository.insert(insert).await {
            Ok(user) => user,
            Err(UserStoreError::DuplicateKey) => {
                warn!(%user_id, "account_provisioner: user row already present, reusing it");
                self.user_repository
                    .find_by_id(user_id)
                    .await?
                    .ok_or_else(|| anyhow!("user {user_id} vanished after duplicate insert"))?
            }
            Err(UserStoreError::Store(err)) => return Err(err),
        };

        info!(user_id = %user.id, role = %request.role, "account_provisioner: account created");
        Ok(ProvisionedAccount::Created { user, password })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crates::{
        domain::{
            repositories::users::MockUserRepository,
            value_objects::enums::user_roles::UserRole,
        },
        infra::identity::supabase_auth::MockIdentityProvider,
    };
    use mockall::predicate::eq;
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    use super::*;

    fn user(id: Uuid, email: &str) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id,
            email: email.to_string(),
            full_name: Some("Ana Silva".to_string()),
            phone: None,
            avatar_url: None,
            role: "student".to_string(),
            has_access: true,
            email_notifications: true,
            sms_notifications: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn password_follows_the_house_format() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let password = generate_password("João-Maria Silva", &mut rng);
            let rest = password.strip_prefix("vibejoomaria").unwrap();
            let mut chars = rest.chars();
            let symbol = chars.next().unwrap();
            let digits: String = chars.collect();

            assert!(PASSWORD_SYMBOLS.contains(&symbol));
            let number: u16 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&number));
        }
    }

    #[test]
    fn password_handles_blank_names() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_password("   ", &mut rng).starts_with("vibe"));
    }

    #[tokio::test]
    async fn existing_email_is_reused() {
        let existing = user(Uuid::new_v4(), "ana@example.com");
        let mut users = MockUserRepository::new();
        let found = existing.clone();
        users
            .expect_find_by_email()
            .with(eq("ANA@example.com"))
            .returning(move |_| Ok(Some(found.clone())));
        let mut identity = MockIdentityProvider::new();
        identity.expect_create_auth_user().never();

        let provisioner = AccountProvisioner::new(Arc::new(users), Arc::new(identity));
        let account = provisioner
            .provision(&AccountRequest::student("ANA@example.com", "Ana Silva", None))
            .await
            .unwrap();

        assert_eq!(account, ProvisionedAccount::Existing(existing));
    }

    #[tokio::test]
    async fn duplicate_insert_falls_back_to_lookup_by_id() {
        let user_id = Uuid::new_v4();
        let stored = user(user_id, "ana@example.com");

        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_insert()
            .returning(|_| Err(UserStoreError::DuplicateKey));
        let found = stored.clone();
        users
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |_| Ok(Some(found.clone())));

        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_auth_user()
            .returning(move |_, _, _, _| Ok(user_id));

        let provisioner = AccountProvisioner::new(Arc::new(users), Arc::new(identity));
        let account = provisioner
            .provision_with_password(
                &AccountRequest::student("ana@example.com", "Ana Silva", None),
                "vibeana@1234".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(
            account,
            ProvisionedAccount::Created {
                user: stored,
                password: "vibeana@1234".to_string()
            }
        );
    }

    #[tokio::test]
    async fn store_errors_are_not_mistaken_for_duplicates() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_insert()
            .returning(|_| Err(UserStoreError::Store(anyhow!("connection reset"))));
        users.expect_find_by_id().never();

        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_auth_user()
            .returning(|_, _, _, _| Ok(Uuid::new_v4()));

        let provisioner = AccountProvisioner::new(Arc::new(users), Arc::new(identity));
        let result = provisioner
            .provision(&AccountRequest {
                email: "ana@example.com".to_string(),
                full_name: "Ana Silva".to_string(),
                phone: None,
                role: UserRole::Admin,
            })
            .await;

        assert!(result.is_err());
    }
}
