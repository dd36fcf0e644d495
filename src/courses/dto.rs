use serde::Deserialize;

/// Body of `POST /courses`. Missing fields read as empty/zero and fail validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateCourseRequest {
    pub title: String,
    pub price: i64,
    pub description: String,
    pub instructor: String,
    pub category: String,
}

/// Body of `GET /course`.
#[derive(Debug, Default, Deserialize)]
pub struct GetCourseRequest {
    #[serde(default)]
    pub course_title: Option<String>,
}
