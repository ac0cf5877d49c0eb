use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, dsl::count_distinct, insert_into, prelude::*, upsert::excluded};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::lesson_progress},
};
use domain::{
    entities::lesson_progress::{InsertLessonProgressEntity, LessonProgressEntity},
    repositories::lesson_progress::LessonProgressRepository,
};

pub struct LessonProgressPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LessonProgressPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LessonProgressRepository for LessonProgressPostgres {
    async fn mark_completed(
        &self,
        progress: InsertLessonProgressEntity,
    ) -> Result<LessonProgressEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(lesson_progress::table)
            .values(&progress)
            .on_conflict((lesson_progress::user_id, lesson_progress::lesson_id))
            .do_update()
            .set((
                lesson_progress::course_id.eq(excluded(lesson_progress::course_id)),
                lesson_progress::completed_at.eq(excluded(lesson_progress::completed_at)),
            ))
            .returning(LessonProgressEntity::as_select())
            .get_result::<LessonProgressEntity>(&mut conn)?;

        Ok(result)
    }

    async fn unmark(&self, user_id: Uuid, lesson_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(
            lesson_progress::table
                .filter(lesson_progress::user_id.eq(user_id))
                .filter(lesson_progress::lesson_id.eq(lesson_id)),
        )
        .execute(&mut conn)?;

        Ok(deleted)
    }

    async fn list_for_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<LessonProgressEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = lesson_progress::table
            .filter(lesson_progress::user_id.eq(user_id))
            .filter(lesson_progress::course_id.eq(course_id))
            .order(lesson_progress::completed_at.asc())
            .select(LessonProgressEntity::as_select())
            .load::<LessonProgressEntity>(&mut conn)?;

        Ok(results)
    }

    async fn count_completed_lessons(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = lesson_progress::table
            .filter(lesson_progress::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_started_courses(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = lesson_progress::table
            .filter(lesson_progress::user_id.eq(user_id))
            .select(count_distinct(lesson_progress::course_id))
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }
}
