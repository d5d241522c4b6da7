//! Identity types shared between the stores and the web layer

use serde::{Deserialize, Serialize};

/// The identity recorded in a session once a user signs up or logs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    pub email: String,
}

impl SessionUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Payload persisted by the session store.
///
/// A session without a user is never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: Option<SessionUser>,
}

impl SessionData {
    pub fn for_user(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none()
    }
}
