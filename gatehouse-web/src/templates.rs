//! Server-side rendered pages
//!
//! Each page is a typed view-model; rendering is a plain function call that
//! returns a `String`, so pages can be checked without a running server.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use gatehouse_core::SessionUser;
use tracing::error;

/// Landing page
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub user: Option<SessionUser>,
}

/// Signup form
#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub title: String,
}

/// Login form
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub title: String,
}

/// Members-only page
#[derive(Template)]
#[template(path = "members.html")]
pub struct MembersTemplate {
    pub title: String,
    pub user: SessionUser,
    pub image: String,
}

/// Not-found page
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub title: String,
    pub path: String,
}

/// Inline form error with a link back to the form
#[derive(Template)]
#[template(path = "form_error.html")]
pub struct FormErrorTemplate {
    pub message: String,
    pub retry_href: String,
}

impl IndexTemplate {
    pub fn new(user: Option<SessionUser>) -> Self {
        Self {
            title: "Gatehouse".to_string(),
            user,
        }
    }
}

impl SignupTemplate {
    pub fn new() -> Self {
        Self {
            title: "Sign up - Gatehouse".to_string(),
        }
    }
}

impl Default for SignupTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginTemplate {
    pub fn new() -> Self {
        Self {
            title: "Log in - Gatehouse".to_string(),
        }
    }
}

impl Default for LoginTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl MembersTemplate {
    pub fn new(user: SessionUser, image: &str) -> Self {
        Self {
            title: "Members - Gatehouse".to_string(),
            user,
            image: image.to_string(),
        }
    }
}

impl NotFoundTemplate {
    pub fn new(path: &str) -> Self {
        Self {
            title: "Page not found - Gatehouse".to_string(),
            path: path.to_string(),
        }
    }
}

impl FormErrorTemplate {
    pub fn new(message: impl Into<String>, retry_href: &str) -> Self {
        Self {
            message: message.into(),
            retry_href: retry_href.to_string(),
        }
    }
}

/// Render a page into an HTML response; a template failure becomes a 500
pub fn render_page<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
