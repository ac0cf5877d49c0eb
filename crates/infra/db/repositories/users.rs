use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{
    RunQueryDsl, define_sql_function, insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    sql_types::Text,
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users},
};
use domain::{
    entities::users::{InsertUserEntity, UpdateUserProfileEntity, UserEntity},
    repositories::users::{UserRepository, UserStoreError},
    value_objects::enums::user_roles::UserRole,
};

define_sql_function!(fn lower(x: Text) -> Text);

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .filter(users::id.eq(user_id))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .filter(lower(users::email).eq(email.trim().to_lowercase()))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert(&self, user: InsertUserEntity) -> std::result::Result<UserEntity, UserStoreError> {
        let mut conn = Arc::clone(&self.db_pool)
            .get()
            .map_err(anyhow::Error::from)?;

        insert_into(users::table)
            .values(&user)
            .returning(UserEntity::as_select())
            .get_result::<UserEntity>(&mut conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    UserStoreError::DuplicateKey
                }
                other => UserStoreError::Store(other.into()),
            })
    }

    async fn grant_access(&self, user_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(users::table.find(user_id))
            .set((users::has_access.eq(true), users::updated_at.eq(Utc::now())))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn set_role(&self, user_id: Uuid, role: UserRole) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(users::table.find(user_id))
            .set((
                users::role.eq(role.to_string()),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        profile: UpdateUserProfileEntity,
    ) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(users::table.find(user_id))
            .set(&profile)
            .returning(UserEntity::as_select())
            .get_result::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
