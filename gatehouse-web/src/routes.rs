//! Route definitions for the Gatehouse web server

use crate::{handlers, AppState};
use axum::{handler::HandlerWithoutStateExt, routing::get, Router};
use tower_http::services::ServeDir;

/// Page routes
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/signup", get(handlers::signup_form).post(handlers::signup))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/members", get(handlers::members))
        .route("/logout", get(handlers::logout))
}

/// Pages, then static files from `static_dir`, then the 404 page.
///
/// A known path hit with the wrong method is also a 404.
pub fn app_routes(static_dir: &str) -> Router<AppState> {
    let static_files = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(handlers::not_found.into_service());

    page_routes()
        .method_not_allowed_fallback(handlers::not_found)
        .fallback_service(static_files)
}
