use crate::config::AppConfig;
use crate::middleware::require_body_content_type;
use crate::state::AppState;
use crate::{assignments, courses, students};
use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
    CompressionLevel,
};

/// Browsers may only call GET/POST, with credentials, from any origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ACCEPT_CHARSET,
            header::ACCEPT_LANGUAGE,
            header::ACCEPT_ENCODING,
            header::ORIGIN,
            header::HOST,
            header::USER_AGENT,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-authorization"),
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            header::ACCESS_CONTROL_ALLOW_METHODS,
            header::ACCESS_CONTROL_ALLOW_HEADERS,
        ])
}

pub fn build_app(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(students::router())
                .merge(courses::router())
                .merge(assignments::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(middleware::from_fn(require_body_content_type))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new().quality(CompressionLevel::Best))
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use crate::error::ErrorBody;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, json)
    }

    fn error_of(body: Value) -> ErrorBody {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signup_course_and_assignment_scenario() {
        let app = build_app(AppState::fake());

        let (status, student) = call(
            &app,
            Method::POST,
            "/api/v1/users",
            json!({"first_name": "Ada", "last_name": "Lovelace", "email": "ada@x.io"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let student_id = student["id"].as_str().unwrap().to_string();
        assert!(!student_id.is_empty());
        assert!(student["created_at"].is_string());
        assert!(student["updated_at"].is_string());

        let (status, course) = call(
            &app,
            Method::POST,
            "/api/v1/courses",
            json!({
                "title": "Algorithms",
                "price": 20,
                "description": "d",
                "instructor": "i",
                "category": "c"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let course_id = course["id"].as_str().unwrap().to_string();

        let assign = json!({"email": "ada@x.io", "course_title": "Algorithms"});
        let (status, updated) =
            call(&app, Method::POST, "/api/v1/assign_course", assign.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(updated["id"], student_id.as_str());
        assert_eq!(updated["courses"][0]["id"], course_id.as_str());

        let (status, err) = call(&app, Method::POST, "/api/v1/assign_course", assign).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(error_of(err).error.contains(&course_id));

        let (status, found) =
            call(&app, Method::GET, "/api/v1/user", json!({"email": "ada@x.io"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["email"], "ada@x.io");
        assert_eq!(found["courses"].as_array().unwrap().len(), 1);

        let (status, found) = call(
            &app,
            Method::GET,
            "/api/v1/course",
            json!({"course_title": "Algorithms"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["students"][0]["id"], student_id.as_str());
    }

    #[tokio::test]
    async fn unknown_lookups_return_null() {
        let app = build_app(AppState::fake());
        let (status, body) =
            call(&app, Method::GET, "/api/v1/user", json!({"email": "nobody@x.io"})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/v1/course",
            json!({"course_title": "Compilers"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let app = build_app(AppState::fake());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/users",
            json!({"first_name": "", "last_name": "Lovelace", "email": "ada@x.io"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_of(body).error, "first name can not be empty");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/courses",
            json!({"title": "Algorithms", "price": 0, "description": "d", "instructor": "i", "category": "c"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/assign_course",
            json!({"email": "ghost@x.io", "course_title": "Algorithms"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_of(body).error, "student not found");

        let student = json!({"first_name": "Ada", "last_name": "Lovelace", "email": "ada@x.io"});
        let (status, _) = call(&app, Method::POST, "/api/v1/users", student.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = call(&app, Method::POST, "/api/v1/users", student).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(error_of(body).error.contains("ada@x.io"));

        let (status, _) = call(&app, Method::GET, "/api/v1/user", json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn responses_are_gzipped_on_request() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::from(
                json!({"first_name": "Ada", "last_name": "Lovelace", "email": "ada@x.io"})
                    .to_string(),
            ))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[header::CONTENT_ENCODING], "gzip");
    }

    #[tokio::test]
    async fn plain_text_bodies_are_refused() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("first_name=Ada"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.contains("text/plain"));
    }

    #[tokio::test]
    async fn preflight_allows_get_and_post_with_credentials() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/assign_course")
            .header(header::ORIGIN, "https://academy.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let headers = res.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://academy.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("POST"));
        assert!(!methods.contains("DELETE"));
    }
}
