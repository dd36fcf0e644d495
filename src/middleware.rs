use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::error::ErrorBody;

/// Media types a request body may carry.
const ACCEPTED_BODY_TYPES: &[&str] = &["application/json", "application/x-www-form-urlencoded"];

fn is_accepted(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_BODY_TYPES.contains(&essence.as_str())
}

/// Answers 415 to POST/PUT/PATCH requests whose Content-Type is not JSON or a form.
pub async fn require_body_content_type(req: Request, next: Next) -> Response {
    if !matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
        return next.run(req).await;
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if is_accepted(content_type) {
        return next.run(req).await;
    }

    warn!(method = %req.method(), uri = %req.uri(), %content_type, "unsupported content type");
    let body = ErrorBody {
        error: format!(
            "unsupported content type {:?}, expected one of {}",
            content_type,
            ACCEPTED_BODY_TYPES.join(", ")
        ),
    };
    (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(body)).into_response()
}
