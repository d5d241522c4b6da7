//! Sessions and the members-only access gate
//!
//! Each request resolves its [`SessionContext`] once, from the signed
//! session cookie, and handlers receive it as an ordinary extractor.

pub mod database;
pub mod password;
pub mod sessions;
pub mod users;


use crate::{handlers::found, AppState};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use gatehouse_core::{SessionData, SessionUser};
use tracing::{debug, error};

use self::sessions::SESSION_TTL_SECS;

/// Name of the cookie carrying the signed session id
pub const SESSION_COOKIE: &str = "gatehouse.sid";

/// Storage-layer failures shared by the user and session stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Email already in use: {0}")]
    DuplicateEmail(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Session state of the current request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Id from a correctly signed cookie, whether or not the store still has it
    pub session_id: Option<String>,
    /// Identity of a live session
    pub user: Option<SessionUser>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}

/// Outcome of the access gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow(SessionUser),
    DenyRedirect(&'static str),
}

/// Where a denied visitor is sent
pub const DENIED_REDIRECT: &str = "/";

/// Allow when the session carries a non-empty identity
pub fn gate(context: &SessionContext) -> Access {
    match &context.user {
        Some(user) if !user.email.is_empty() => Access::Allow(user.clone()),
        _ => Access::DenyRedirect(DENIED_REDIRECT),
    }
}

/// Session lookup failed at the storage layer
#[derive(Debug)]
pub struct SessionUnavailable;

impl IntoResponse for SessionUnavailable {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.").into_response()
    }
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = SessionUnavailable;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key().clone());

        let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(Self::anonymous());
        };

        let record = state.sessions.load(&session_id).await.map_err(|e| {
            error!("Failed to load session: {}", e);
            SessionUnavailable
        })?;

        let user = record.and_then(|r| r.data.user);
        if user.is_none() {
            debug!("Session cookie present but no live session");
        }

        Ok(Self {
            session_id: Some(session_id),
            user,
        })
    }
}

/// Extractor for gated routes: the identity of a logged-in visitor, or a
/// redirect to the landing page.
#[derive(Debug, Clone)]
pub struct Member(pub SessionUser);

impl FromRequestParts<AppState> for Member {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let context = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match gate(&context) {
            Access::Allow(user) => Ok(Member(user)),
            Access::DenyRedirect(location) => {
                debug!("Access denied, redirecting to {}", location);
                Err(found(location))
            }
        }
    }
}

/// Cookie holding a freshly issued session id
pub fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Cookie that clears the session cookie in the browser
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Store a session for `user`, dropping any session the request already had,
/// and return the jar carrying the new cookie.
pub async fn establish_session(
    state: &AppState,
    jar: SignedCookieJar,
    previous: Option<&str>,
    user: SessionUser,
) -> Result<SignedCookieJar, StoreError> {
    if let Some(previous) = previous {
        state.sessions.destroy(previous).await?;
    }

    let record = state.sessions.create(SessionData::for_user(user)).await?;
    Ok(jar.add(session_cookie(record.id)))
}
