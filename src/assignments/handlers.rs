use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use super::{dto::AssignCourseRequest, services};
use crate::{error::AppError, repo::Student, state::AppState};

pub fn assignment_routes() -> Router<AppState> {
    Router::new().route("/assign_course", post(assign_course))
}

/// Links a course to a student who bought it; responds with the updated student.
#[instrument(skip(state, payload))]
pub async fn assign_course(
    State(state): State<AppState>,
    Json(payload): Json<AssignCourseRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = services::assign_course_to_student(state.repo.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}
