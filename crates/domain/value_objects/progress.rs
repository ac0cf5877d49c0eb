use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::lesson_progress::LessonProgressEntity;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLessonProgressModel {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonProgressDto {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

impl From<LessonProgressEntity> for LessonProgressDto {
    fn from(value: LessonProgressEntity) -> Self {
        Self {
            lesson_id: value.lesson_id,
            course_id: value.course_id,
            completed_at: value.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToggleLessonProgressResponse {
    pub success: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<LessonProgressDto>,
}
