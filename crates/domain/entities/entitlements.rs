use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{enrollments, project_purchases};

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = project_purchases)]
pub struct InsertProjectPurchaseEntity {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub payment_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = enrollments)]
pub struct InsertEnrollmentEntity {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub payment_id: Option<Uuid>,
}
