use tracing::{info, warn};

use super::dto::{CreateStudentRequest, GetStudentRequest};
use crate::{
    error::AppError,
    repo::{NewStudent, Repository, Student},
    validate::{required, required_key},
};

fn validate_new_student(req: CreateStudentRequest) -> Result<NewStudent, AppError> {
    let email = required(&req.email, "email")?;
    Ok(NewStudent {
        first_name: required(&req.first_name, "first name")?,
        last_name: required(&req.last_name, "last name")?,
        email,
    })
}

pub async fn create_student(
    repo: &dyn Repository,
    req: CreateStudentRequest,
) -> Result<Student, AppError> {
    let new = validate_new_student(req).map_err(|e| {
        warn!(error = %e, "create_student rejected");
        e
    })?;
    let student = repo.create_student(new).await?;
    info!(student_id = %student.record.id, email = %student.email, "student created");
    Ok(student)
}

/// `Ok(None)` when no student has that email.
pub async fn get_student(
    repo: &dyn Repository,
    req: GetStudentRequest,
) -> Result<Option<Student>, AppError> {
    let email = required_key(req.email.as_deref(), "email")?;
    repo.get_student(&email).await
}
