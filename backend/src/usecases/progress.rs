use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::lesson_progress::InsertLessonProgressEntity,
    repositories::lesson_progress::LessonProgressRepository,
    value_objects::progress::{
        LessonProgressDto, ToggleLessonProgressModel, ToggleLessonProgressResponse,
    },
};
use tracing::debug;
use uuid::Uuid;

use crate::usecases::UseCaseResult;

pub struct ProgressUseCase {
    lesson_progress_repository: Arc<dyn LessonProgressRepository>,
}

impl ProgressUseCase {
    pub fn new(lesson_progress_repository: Arc<dyn LessonProgressRepository>) -> Self {
        Self {
            lesson_progress_repository,
        }
    }

    /// Marking is an upsert and unmarking a delete, so repeating either is harmless.
    pub async fn toggle(
        &self,
        model: ToggleLessonProgressModel,
    ) -> UseCaseResult<ToggleLessonProgressResponse> {
        if model.completed {
            let row = self
                .lesson_progress_repository
                .mark_completed(InsertLessonProgressEntity {
                    user_id: model.user_id,
                    lesson_id: model.lesson_id,
                    course_id: model.course_id,
                    completed_at: Utc::now(),
                })
                .await?;

            return Ok(ToggleLessonProgressResponse {
                success: true,
                completed: true,
                data: Some(LessonProgressDto::from(row)),
            });
        }

        let removed = self
            .lesson_progress_repository
            .unmark(model.user_id, model.lesson_id)
            .await?;
        debug!(user_id = %model.user_id, lesson_id = %model.lesson_id, removed, "progress: lesson unmarked");

        Ok(ToggleLessonProgressResponse {
            success: true,
            completed: false,
            data: None,
        })
    }

    pub async fn list_course_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> UseCaseResult<Vec<LessonProgressDto>> {
        let rows = self
            .lesson_progress_repository
            .list_for_course(user_id, course_id)
            .await?;

        Ok(rows.into_iter().map(LessonProgressDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use crates::domain::{
        entities::lesson_progress::LessonProgressEntity,
        repositories::lesson_progress::MockLessonProgressRepository,
    };
    use mockall::predicate::eq;

    use super::*;

    fn toggle(completed: bool) -> ToggleLessonProgressModel {
        ToggleLessonProgressModel {
            user_id: Uuid::new_v4(),
            lesson_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            completed,
        }
    }

    #[tokio::test]
    async fn completing_a_lesson_returns_the_row() {
        let mut repository = MockLessonProgressRepository::new();
        repository.expect_mark_completed().times(1).returning(|row| {
            Ok(LessonProgressEntity {
                user_id: row.user_id,
                lesson_id: row.lesson_id,
                course_id: row.course_id,
                completed_at: row.completed_at,
            })
        });
        repository.expect_unmark().never();
        let model = toggle(true);
        let lesson_id = model.lesson_id;

        let response = ProgressUseCase::new(Arc::new(repository))
            .toggle(model)
            .await
            .unwrap();

        assert!(response.completed);
        assert_eq!(response.data.map(|row| row.lesson_id), Some(lesson_id));
    }

    #[tokio::test]
    async fn uncompleting_a_lesson_deletes_it() {
        let model = toggle(false);
        let mut repository = MockLessonProgressRepository::new();
        repository
            .expect_unmark()
            .with(eq(model.user_id), eq(model.lesson_id))
            .times(1)
            .returning(|_, _| Ok(0));

        let response = ProgressUseCase::new(Arc::new(repository))
            .toggle(model)
            .await
            .unwrap();

        assert!(response.success);
        assert!(!response.completed);
        assert!(response.data.is_none());
    }
}
