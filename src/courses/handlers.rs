use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateCourseRequest, GetCourseRequest},
    services,
};
use crate::{error::AppError, repo::Course, state::AppState};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", post(create_course))
        .route("/course", get(get_course))
}

#[instrument(skip(state, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = services::create_course(state.repo.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[instrument(skip(state, payload))]
pub async fn get_course(
    State(state): State<AppState>,
    Json(payload): Json<GetCourseRequest>,
) -> Result<Json<Option<Course>>, AppError> {
    let course = services::get_course(state.repo.as_ref(), payload).await?;
    Ok(Json(course))
}
