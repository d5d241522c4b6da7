//! User records, the credential store, and the signup/login flows

use super::{
    database::DatabaseUserStore,
    password::{hash_password, verify_password, PasswordError},
    StoreError,
};
use chrono::{DateTime, Utc};
use gatehouse_core::{LoginForm, SessionUser, SignupForm, ValidationErrors};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A stored account. Created once at signup and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// The identity copied into a session
    pub fn identity(&self) -> SessionUser {
        SessionUser::new(self.name.clone(), self.email.clone())
    }
}

/// Credential store supporting both in-memory and database storage
#[derive(Debug, Clone)]
pub enum UserStore {
    /// In-memory storage keyed by email (development and tests)
    Memory {
        users: Arc<RwLock<HashMap<String, UserRecord>>>,
    },
    /// SQLite storage
    Database(DatabaseUserStore),
}

impl Default for UserStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl UserStore {
    pub fn memory() -> Self {
        Self::Memory {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn database(store: DatabaseUserStore) -> Self {
        Self::Database(store)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Self::Memory { users } => Ok(users.read().await.get(email).cloned()),
            Self::Database(db) => db.find_by_email(email).await,
        }
    }

    /// Insert a new user, failing with [`StoreError::DuplicateEmail`] when
    /// the email is taken. The check and the write are a single step.
    pub async fn insert(&self, user: &UserRecord) -> Result<(), StoreError> {
        match self {
            Self::Memory { users } => {
                let mut users = users.write().await;
                if users.contains_key(&user.email) {
                    return Err(StoreError::DuplicateEmail(user.email.clone()));
                }
                users.insert(user.email.clone(), user.clone());
                Ok(())
            }
            Self::Database(db) => db.insert(user).await,
        }
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        match self {
            Self::Memory { users } => Ok(users.read().await.len() as u64),
            Self::Database(db) => db.count().await,
        }
    }
}

/// Why a signup or login was refused
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("Email already in use.")]
    EmailInUse,
    #[error("User not found.")]
    UserNotFound,
    #[error("Invalid password.")]
    InvalidPassword,
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
    #[error("Password failure: {0}")]
    Password(#[from] PasswordError),
}

impl AccountError {
    /// Message the user can act on, or `None` for infrastructure failures
    /// that must only be reported generically.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Invalid(errors) => Some(errors.first_message()),
            Self::EmailInUse | Self::UserNotFound | Self::InvalidPassword => Some(self.to_string()),
            Self::Store(_) | Self::Password(_) => None,
        }
    }
}

/// Signup and login on top of a [`UserStore`]
#[derive(Debug, Clone, Default)]
pub struct AccountService {
    store: UserStore,
}

impl AccountService {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Validate, reject a taken email, hash, store. Returns the identity to
    /// put in the new session.
    pub async fn signup(&self, form: &SignupForm) -> Result<SessionUser, AccountError> {
        let valid = form.validate()?;
        debug!("Signup attempt for: {}", valid.email);

        if self.store.find_by_email(&valid.email).await?.is_some() {
            debug!("Signup rejected, email in use: {}", valid.email);
            return Err(AccountError::EmailInUse);
        }

        let password_hash = hash_password(&valid.password)?;
        let user = UserRecord::new(valid.name, valid.email, password_hash);

        match self.store.insert(&user).await {
            Ok(()) => {}
            // lost a race with a concurrent signup for the same address
            Err(StoreError::DuplicateEmail(email)) => {
                warn!("Concurrent signup for {} rejected by store", email);
                return Err(AccountError::EmailInUse);
            }
            Err(e) => return Err(e.into()),
        }

        info!("Registered new user: {}", user.email);
        Ok(user.identity())
    }

    pub async fn login(&self, form: &LoginForm) -> Result<SessionUser, AccountError> {
        let valid = form.validate()?;

        let user = self
            .store
            .find_by_email(&valid.email)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        if !verify_password(&valid.password, &user.password_hash)? {
            warn!("Invalid password for user: {}", user.email);
            return Err(AccountError::InvalidPassword);
        }

        debug!("User authenticated: {}", user.email);
        Ok(user.identity())
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }
}
