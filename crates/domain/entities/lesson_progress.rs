use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::lesson_progress;

#[derive(Debug, Clone, PartialEq, Selectable, Queryable)]
#[diesel(table_name = lesson_progress)]
pub struct LessonProgressEntity {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = lesson_progress)]
pub struct InsertLessonProgressEntity {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub completed_at: DateTime<Utc>,
}
