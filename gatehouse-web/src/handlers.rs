//! HTTP request handlers for the Gatehouse web server

use crate::{
    auth::{establish_session, removal_cookie, Member, SessionContext},
    templates::{
        render_page, FormErrorTemplate, IndexTemplate, LoginTemplate, MembersTemplate,
        NotFoundTemplate, SignupTemplate,
    },
    AppState,
};
use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use gatehouse_core::{LoginForm, SignupForm};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, error, info};

/// Images the members page picks from
pub const MEMBER_IMAGES: [&str; 3] = ["cat.jpg", "dog.jpg", "frog.jpg"];

const SIGNUP_FAILED: &str = "Error signing up.";
const LOGIN_FAILED: &str = "Error logging in.";
const LOGOUT_FAILED: &str = "Error logging out.";

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Uniformly random member image
pub fn pick_image<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MEMBER_IMAGES.choose(rng).copied().unwrap_or(MEMBER_IMAGES[0])
}

/// Plain-text message for storage failures; details stay in the log
fn failure(message: &'static str) -> Response {
    message.into_response()
}

/// A body that cannot be decoded is validated as an empty form, so the
/// visitor gets the usual inline message instead of a bare rejection.
fn form_or_empty<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Unreadable form body: {}", rejection);
            T::default()
        }
    }
}

fn form_error(message: String, retry_href: &str) -> Response {
    render_page(&FormErrorTemplate::new(message, retry_href))
}

/// Landing page
pub async fn index(session: SessionContext) -> Response {
    render_page(&IndexTemplate::new(session.user))
}

/// Signup form
pub async fn signup_form() -> Response {
    render_page(&SignupTemplate::new())
}

/// Create an account and log it in
pub async fn signup(
    State(state): State<AppState>,
    session: SessionContext,
    jar: SignedCookieJar,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Response {
    let form = form_or_empty(form);
    let user = match state.accounts.signup(&form).await {
        Ok(user) => user,
        Err(err) => {
            return match err.user_message() {
                Some(message) => {
                    debug!("Signup refused: {}", message);
                    form_error(message, "/signup")
                }
                None => {
                    error!("Signup failed: {}", err);
                    failure(SIGNUP_FAILED)
                }
            };
        }
    };

    match establish_session(&state, jar, session.session_id.as_deref(), user).await {
        Ok(jar) => (jar, found("/members")).into_response(),
        Err(e) => {
            error!("Failed to create session after signup: {}", e);
            failure(SIGNUP_FAILED)
        }
    }
}

/// Login form
pub async fn login_form() -> Response {
    render_page(&LoginTemplate::new())
}

/// Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    jar: SignedCookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = form_or_empty(form);
    let user = match state.accounts.login(&form).await {
        Ok(user) => user,
        Err(err) => {
            return match err.user_message() {
                Some(message) => {
                    debug!("Login refused: {}", message);
                    form_error(message, "/login")
                }
                None => {
                    error!("Login failed: {}", err);
                    failure(LOGIN_FAILED)
                }
            };
        }
    };

    info!("User logged in: {}", user.email);
    match establish_session(&state, jar, session.session_id.as_deref(), user).await {
        Ok(jar) => (jar, found("/")).into_response(),
        Err(e) => {
            error!("Failed to create session after login: {}", e);
            failure(LOGIN_FAILED)
        }
    }
}

/// Members-only page
pub async fn members(Member(user): Member) -> Response {
    let image = pick_image(&mut rand::thread_rng());
    render_page(&MembersTemplate::new(user, image))
}

/// Destroy the session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    session: SessionContext,
    jar: SignedCookieJar,
) -> Response {
    if let Some(session_id) = &session.session_id {
        if let Err(e) = state.sessions.destroy(session_id).await {
            error!("Failed to destroy session: {}", e);
            return failure(LOGOUT_FAILED);
        }
    }

    if let Some(user) = session.user() {
        info!("User logged out: {}", user.email);
    }
    (jar.remove(removal_cookie()), found("/")).into_response()
}

/// 404 page for anything no route or static file answers
pub async fn not_found(uri: Uri) -> Response {
    debug!("No route for {}", uri.path());
    (
        StatusCode::NOT_FOUND,
        render_page(&NotFoundTemplate::new(uri.path())),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_pick_image_stays_in_set_and_covers_it() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked: HashSet<&str> = (0..200).map(|_| pick_image(&mut rng)).collect();
        assert_eq!(picked.len(), MEMBER_IMAGES.len());
        assert!(picked.iter().all(|image| MEMBER_IMAGES.contains(image)));
    }

    #[test]
    fn test_found_is_302() {
        let response = found("/members");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/members");
    }
}
