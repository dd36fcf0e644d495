use serde::Deserialize;

/// Body of `POST /users`. Missing fields read as empty and fail validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Body of `GET /user`.
#[derive(Debug, Default, Deserialize)]
pub struct GetStudentRequest {
    #[serde(default)]
    pub email: Option<String>,
}
