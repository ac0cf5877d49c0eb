use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{enrollments, project_purchases},
    },
};
use domain::{
    entities::entitlements::{InsertEnrollmentEntity, InsertProjectPurchaseEntity},
    repositories::entitlements::EntitlementRepository,
};

pub struct EntitlementPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EntitlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EntitlementRepository for EntitlementPostgres {
    async fn grant_project(&self, purchase: InsertProjectPurchaseEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(project_purchases::table)
            .values(&purchase)
            .on_conflict((project_purchases::user_id, project_purchases::project_id))
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }

    async fn enroll_course(&self, enrollment: InsertEnrollmentEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(enrollments::table)
            .values(&enrollment)
            .on_conflict((enrollments::user_id, enrollments::course_id))
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }
}
