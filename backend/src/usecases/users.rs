use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::users::UpdateUserProfileEntity,
    repositories::{lesson_progress::LessonProgressRepository, users::UserRepository},
    value_objects::{
        enums::user_roles::UserRole,
        users::{
            AccountRequest, UpdateUserProfileModel, UserDto, UserSettingsDto, UserStats,
            UserStatsDto, days_since,
        },
    },
};
use tracing::{error, info};
use uuid::Uuid;

use crate::usecases::{
    UseCaseError, UseCaseResult,
    account_provisioner::{AccountProvisioner, ProvisionedAccount},
};

pub struct UserUseCase {
    user_repository: Arc<dyn UserRepository>,
    lesson_progress_repository: Arc<dyn LessonProgressRepository>,
    account_provisioner: Arc<AccountProvisioner>,
}

impl UserUseCase {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        lesson_progress_repository: Arc<dyn LessonProgressRepository>,
        account_provisioner: Arc<AccountProvisioner>,
    ) -> Self {
        Self {
            user_repository,
            lesson_progress_repository,
            account_provisioner,
        }
    }

    pub async fn get_stats(&self, user_id: Uuid) -> UseCaseResult<UserStatsDto> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(UseCaseError::NotFound("user"))?;

        let lessons = self
            .lesson_progress_repository
            .count_completed_lessons(user_id)
            .await?;
        let courses = self
            .lesson_progress_repository
            .count_started_courses(user_id)
            .await?;

        Ok(UserStatsDto {
            stats: UserStats {
                lessons,
                courses,
                days: days_since(user.created_at, Utc::now()),
            },
            settings: UserSettingsDto {
                phone: user.phone,
                email_notifications: user.email_notifications,
                sms_notifications: user.sms_notifications,
            },
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        model: UpdateUserProfileModel,
    ) -> UseCaseResult<UserDto> {
        let profile = UpdateUserProfileEntity {
            full_name: model.full_name,
            phone: model.phone,
            avatar_url: model.avatar_url,
            email_notifications: model.email_notifications,
            sms_notifications: model.sms_notifications,
            updated_at: Some(Utc::now()),
        };

        let user = self
            .user_repository
            .update_profile(user_id, profile)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "users: profile update failed");
                UseCaseError::Store(err)
            })?
            .ok_or(UseCaseError::NotFound("user"))?;

        info!(%user_id, "users: profile updated");
        Ok(UserDto::from(user))
    }

    /// Creates an admin account with the given password, or promotes the existing account
    /// registered under `email`.
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> UseCaseResult<UserDto> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(UseCaseError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let request = AccountRequest {
            role: UserRole::Admin,
            ..AccountRequest::student(email, full_name, None)
        };

        let user = match self
            .account_provisioner
            .provision_with_password(&request, password.to_string())
            .await?
        {
            ProvisionedAccount::Created { user, .. } => user,
            ProvisionedAccount::Existing(user) => {
                self.user_repository.set_role(user.id, UserRole::Admin).await?;
                self.user_repository.grant_access(user.id).await?;
                info!(user_id = %user.id, "users: existing account promoted to admin");
                self.user_repository
                    .find_by_id(user.id)
                    .await?
                    .ok_or(UseCaseError::NotFound("user"))?
            }
        };

        Ok(UserDto::from(user))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crates::{
        domain::{
            entities::users::UserEntity,
            repositories::{
                lesson_progress::MockLessonProgressRepository, users::MockUserRepository,
            },
        },
        infra::identity::supabase_auth::MockIdentityProvider,
    };
    use mockall::predicate::eq;

    use super::*;

    fn user(id: Uuid, role: &str) -> UserEntity {
        let joined = Utc::now() - Duration::days(10) - Duration::hours(2);
        UserEntity {
            id,
            email: "ana@example.com".to_string(),
            full_name: Some("Ana Silva".to_string()),
            phone: Some("923000000".to_string()),
            avatar_url: None,
            role: role.to_string(),
            has_access: true,
            email_notifications: true,
            sms_notifications: false,
            created_at: joined,
            updated_at: joined,
        }
    }

    fn use_case(
        users: MockUserRepository,
        progress: MockLessonProgressRepository,
        identity: MockIdentityProvider,
    ) -> UserUseCase {
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let provisioner = AccountProvisioner::new(Arc::clone(&users), Arc::new(identity));
        UserUseCase::new(users, Arc::new(progress), Arc::new(provisioner))
    }

    #[tokio::test]
    async fn stats_count_lessons_courses_and_days() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(user_id))
            .returning(move |id| Ok(Some(user(id, "student"))));
        let mut progress = MockLessonProgressRepository::new();
        progress.expect_count_completed_lessons().returning(|_| Ok(12));
        progress.expect_count_started_courses().returning(|_| Ok(2));

        let stats = use_case(users, progress, MockIdentityProvider::new())
            .get_stats(user_id)
            .await
            .unwrap();

        assert_eq!(stats.stats, UserStats { lessons: 12, courses: 2, days: 11 });
        assert_eq!(stats.settings.phone.as_deref(), Some("923000000"));
    }

    #[tokio::test]
    async fn stats_for_unknown_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let result = use_case(
            users,
            MockLessonProgressRepository::new(),
            MockIdentityProvider::new(),
        )
        .get_stats(Uuid::new_v4())
        .await;

        assert!(matches!(result, Err(UseCaseError::NotFound("user"))));
    }

    #[tokio::test]
    async fn profile_update_stamps_updated_at() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users
            .expect_update_profile()
            .withf(|_, profile| {
                profile.updated_at.is_some() && profile.full_name.as_deref() == Some("Ana M. Silva")
            })
            .returning(|id, _| Ok(Some(user(id, "student"))));

        let updated = use_case(
            users,
            MockLessonProgressRepository::new(),
            MockIdentityProvider::new(),
        )
        .update_profile(
            user_id,
            UpdateUserProfileModel {
                full_name: Some("Ana M. Silva".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, user_id);
    }

    #[tokio::test]
    async fn create_admin_promotes_existing_account() {
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user(user_id, "student"))));
        users
            .expect_set_role()
            .with(eq(user_id), eq(UserRole::Admin))
            .times(1)
            .returning(|_, _| Ok(()));
        users.expect_grant_access().times(1).returning(|_| Ok(()));
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id, "admin"))));
        let mut identity = MockIdentityProvider::new();
        identity.expect_create_auth_user().never();

        let admin = use_case(users, MockLessonProgressRepository::new(), identity)
            .create_admin("ana@example.com", "s3cret!", "Ana Silva")
            .await
            .unwrap();

        assert_eq!(admin.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn create_admin_mints_account_with_given_password() {
        let new_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_insert()
            .withf(|insert| insert.role == "admin" && insert.has_access)
            .returning(move |_| Ok(user(new_id, "admin")));
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_auth_user()
            .withf(|_, password, _, _| password == "s3cret!")
            .returning(move |_, _, _, _| Ok(new_id));

        let admin = use_case(users, MockLessonProgressRepository::new(), identity)
            .create_admin("admin@example.com", "s3cret!", "Admin")
            .await
            .unwrap();

        assert_eq!(admin.id, new_id);
    }
}
