use tracing::{info, warn};

use super::dto::{CreateCourseRequest, GetCourseRequest};
use crate::{
    error::AppError,
    repo::{Course, NewCourse, Repository},
    validate::{required, required_key},
};

fn validate_new_course(req: CreateCourseRequest) -> Result<NewCourse, AppError> {
    let description = required(&req.description, "course's description")?;
    let instructor = required(&req.instructor, "course's instructor")?;
    if req.price == 0 {
        return Err(AppError::validation("course's price can not be zero"));
    }
    if req.price < 0 {
        return Err(AppError::validation("course's price can not be negative"));
    }
    Ok(NewCourse {
        title: required(&req.title, "course's title")?,
        price: req.price,
        description,
        instructor,
        category: required(&req.category, "course's category")?,
    })
}

pub async fn create_course(
    repo: &dyn Repository,
    req: CreateCourseRequest,
) -> Result<Course, AppError> {
    let new = validate_new_course(req).map_err(|e| {
        warn!(error = %e, "create_course rejected");
        e
    })?;
    let course = repo.create_course(new).await?;
    info!(course_id = %course.record.id, title = %course.title, "course created");
    Ok(course)
}

/// `Ok(None)` when no course has that title.
pub async fn get_course(
    repo: &dyn Repository,
    req: GetCourseRequest,
) -> Result<Option<Course>, AppError> {
    let title = required_key(req.course_title.as_deref(), "course title")?;
    repo.get_course(&title).await
}
