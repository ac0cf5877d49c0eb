use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    routing::{get, patch},
};
use crates::{
    domain::value_objects::users::{UpdateUserProfileModel, UserDto, UserStatsDto},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{lesson_progress::LessonProgressPostgres, users::UserPostgres},
    },
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    axum_http::http_serve::AppServices,
    usecases::{UseCaseError, account_provisioner::AccountProvisioner, users::UserUseCase},
};

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub user: UserDto,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, services: AppServices) -> Router {
    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let lesson_progress_repository = LessonProgressPostgres::new(Arc::clone(&db_pool));
    let account_provisioner =
        AccountProvisioner::new(user_repository.clone(), services.identity_provider);

    let usecase = UserUseCase::new(
        user_repository,
        Arc::new(lesson_progress_repository),
        Arc::new(account_provisioner),
    );

    Router::new()
        .route("/:id/stats", get(user_stats))
        .route("/:id/profile", patch(update_profile))
        .with_state(Arc::new(usecase))
}

pub async fn user_stats(
    State(usecase): State<Arc<UserUseCase>>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserStatsDto>, UseCaseError> {
    let Path(user_id) = user_id?;
    Ok(Json(usecase.get_stats(user_id).await?))
}

pub async fn update_profile(
    State(usecase): State<Arc<UserUseCase>>,
    user_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserProfileModel>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>, UseCaseError> {
    let Path(user_id) = user_id?;
    let Json(model) = payload?;
    let user = usecase.update_profile(user_id, model).await?;

    Ok(Json(UpdateProfileResponse {
        success: true,
        user,
    }))
}
