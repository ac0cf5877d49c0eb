use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    routing::{get, post},
};
use crates::{
    domain::value_objects::progress::{
        LessonProgressDto, ToggleLessonProgressModel, ToggleLessonProgressResponse,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::lesson_progress::LessonProgressPostgres,
    },
};
use uuid::Uuid;

use crate::usecases::{UseCaseError, progress::ProgressUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let lesson_progress_repository = LessonProgressPostgres::new(Arc::clone(&db_pool));
    let usecase = ProgressUseCase::new(Arc::new(lesson_progress_repository));

    Router::new()
        .route("/toggle", post(toggle_progress))
        .route("/:course_id/:user_id", get(course_progress))
        .with_state(Arc::new(usecase))
}

pub async fn toggle_progress(
    State(usecase): State<Arc<ProgressUseCase>>,
    payload: Result<Json<ToggleLessonProgressModel>, JsonRejection>,
) -> Result<Json<ToggleLessonProgressResponse>, UseCaseError> {
    let Json(model) = payload?;
    Ok(Json(usecase.toggle(model).await?))
}

pub async fn course_progress(
    State(usecase): State<Arc<ProgressUseCase>>,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<Vec<LessonProgressDto>>, UseCaseError> {
    let Path((course_id, user_id)) = ids?;
    Ok(Json(usecase.list_course_progress(course_id, user_id).await?))
}
