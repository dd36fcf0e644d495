use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateStudentRequest, GetStudentRequest},
    services,
};
use crate::{error::AppError, repo::Student, state::AppState};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_student))
        .route("/user", get(get_student))
}

#[instrument(skip(state, payload))]
pub async fn create_student(
    State(state): State<AppState>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = services::create_student(state.repo.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Responds `null` when no student has the email.
#[instrument(skip(state, payload))]
pub async fn get_student(
    State(state): State<AppState>,
    Json(payload): Json<GetStudentRequest>,
) -> Result<Json<Option<Student>>, AppError> {
    let student = services::get_student(state.repo.as_ref(), payload).await?;
    Ok(Json(student))
}
