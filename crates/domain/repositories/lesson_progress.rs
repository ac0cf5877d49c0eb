use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::lesson_progress::{InsertLessonProgressEntity, LessonProgressEntity};

#[automock]
#[async_trait]
pub trait LessonProgressRepository: Send + Sync {
    async fn mark_completed(&self, progress: InsertLessonProgressEntity)
    -> Result<LessonProgressEntity>;
    async fn unmark(&self, user_id: Uuid, lesson_id: Uuid) -> Result<usize>;
    async fn list_for_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<LessonProgressEntity>>;
    async fn count_completed_lessons(&self, user_id: Uuid) -> Result<i64>;
    async fn count_started_courses(&self, user_id: Uuid) -> Result<i64>;
}
