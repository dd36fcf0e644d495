use serde::Deserialize;

/// Body of `POST /assign_course`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignCourseRequest {
    pub email: String,
    pub course_title: String,
}
