//! Shared helpers for the gatehouse-web integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use gatehouse_web::{create_app, AppState, WebConfig};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-with-enough-bytes";

/// App with in-memory stores and a fixed signing secret
pub async fn memory_app() -> (Router, AppState) {
    let config = WebConfig {
        session_secret: Some(SECRET.to_string()),
        ..WebConfig::default()
    };
    let state = AppState::new(config).await.unwrap();
    (create_app(state.clone()), state)
}

/// App with users and sessions in two SQLite files under `dir`; returns the
/// router, the state and the two database URLs.
pub async fn sqlite_app(dir: &std::path::Path) -> (Router, AppState, String, String) {
    let users_url = format!("sqlite://{}", dir.join("users.db").display());
    let sessions_url = format!("sqlite://{}", dir.join("sessions.db").display());
    let config = WebConfig {
        database_url: Some(users_url.clone()),
        session_database_url: Some(sessions_url.clone()),
        session_secret: Some(SECRET.to_string()),
        ..WebConfig::default()
    };
    let state = AppState::new(config).await.unwrap();
    (create_app(state.clone()), state, users_url, sessions_url)
}

/// Run one statement against a database from outside the app
pub async fn execute_sql(database_url: &str, sql: &str) {
    let pool = gatehouse_web::database::connect(database_url).await.unwrap();
    sqlx::query(sql).execute(&pool).await.unwrap();
    pool.close().await;
}

/// Minimal form encoding for the characters these tests use
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.replace('%', "%25").replace('@', "%40").replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form_body(fields))).unwrap()
}

/// POST with a raw body and no content type
pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// POST an already encoded form body
pub fn post_encoded(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// `name=value` of the first Set-Cookie header, as a browser would send it back
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn ann_signup() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Ann"),
        ("email", "ann@x.com"),
        ("password", "secret1"),
    ]
}
