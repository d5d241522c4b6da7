//! SQLite-backed user and session storage

use super::{sessions::SessionRecord, users::UserRecord, StoreError};
use chrono::{DateTime, TimeZone, Utc};
use gatehouse_core::SessionData;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

/// Database user row
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// Database-backed user store.
///
/// `email` carries a UNIQUE constraint, so two concurrent signups for the
/// same address cannot both be written.
#[derive(Debug, Clone)]
pub struct DatabaseUserStore {
    pool: SqlitePool,
}

impl DatabaseUserStore {
    /// Wrap a pool and create the users table if needed
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create users table: {}", e);
            StoreError::Database(e)
        })?;

        info!("Users table ready");
        Ok(())
    }

    pub async fn insert(&self, user: &UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail(user.email.clone())
            }
            _ => {
                error!("Failed to insert user: {}", e);
                StoreError::Database(e)
            }
        })?;

        debug!("User inserted: {}", user.email);
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to query user by email: {}", e);
            StoreError::Database(e)
        })?;

        Ok(row.map(UserRecord::from))
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

/// Database session row
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    data: String,
    expires_at: i64,
}

impl TryFrom<SessionRow> for SessionRecord {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let data: SessionData = serde_json::from_str(&row.data)
            .map_err(|e| StoreError::Corrupt(format!("session {}: {}", row.id, e)))?;
        let expires_at = Utc
            .timestamp_opt(row.expires_at, 0)
            .single()
            .ok_or_else(|| StoreError::Corrupt(format!("session {}: bad expiry", row.id)))?;

        Ok(Self {
            id: row.id,
            data,
            expires_at,
        })
    }
}

/// Database-backed session store. Session data is kept as JSON, expiry as
/// unix seconds so expired rows can be swept with one comparison.
#[derive(Debug, Clone)]
pub struct DatabaseSessionStore {
    pool: SqlitePool,
}

impl DatabaseSessionStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create sessions table: {}", e);
            StoreError::Database(e)
        })?;

        info!("Sessions table ready");
        Ok(())
    }

    pub async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let data = serde_json::to_string(&record.data)
            .map_err(|e| StoreError::Corrupt(format!("session {}: {}", record.id, e)))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at
            "#,
        )
        .bind(&record.id)
        .bind(data)
        .bind(record.expires_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a live session; expired rows read as absent
    pub async fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, data, expires_at FROM sessions WHERE id = ? AND expires_at > ?",
        )
        .bind(id)
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRecord::try_from).transpose()
    }

    pub async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect;
    use gatehouse_core::SessionUser;

    async fn memory_pool() -> SqlitePool {
        connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_user_roundtrip_and_unique_email() {
        let store = DatabaseUserStore::new(memory_pool().await).await.unwrap();

        let user = UserRecord::new("Ann".into(), "ann@x.com".into(), "$argon2id$hash".into());
        store.insert(&user).await.unwrap();

        let found = store.find_by_email("ann@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.name, "Ann");
        assert_eq!(found.password_hash, "$argon2id$hash");

        let dup = UserRecord::new("Other".into(), "ann@x.com".into(), "x".into());
        assert!(matches!(
            store.insert(&dup).await,
            Err(StoreError::DuplicateEmail(email)) if email == "ann@x.com"
        ));
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_by_email("bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tables_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("users.db").display());

        {
            let store = DatabaseUserStore::new(connect(&url).await.unwrap())
                .await
                .unwrap();
            let user = UserRecord::new("Ann".into(), "ann@x.com".into(), "h".into());
            store.insert(&user).await.unwrap();
        }

        let store = DatabaseUserStore::new(connect(&url).await.unwrap())
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = DatabaseSessionStore::new(memory_pool().await).await.unwrap();
        let record = SessionRecord::new(SessionData::for_user(SessionUser::new(
            "Ann",
            "ann@x.com",
        )));
        store.save(&record).await.unwrap();

        let loaded = store.load(&record.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, record.data);
        assert_eq!(loaded.expires_at.timestamp(), record.expires_at.timestamp());

        store.destroy(&record.id).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_hidden_and_purged() {
        let store = DatabaseSessionStore::new(memory_pool().await).await.unwrap();
        let mut record = SessionRecord::new(SessionData::for_user(SessionUser::new(
            "Ann",
            "ann@x.com",
        )));
        record.expires_at = Utc::now() - chrono::Duration::seconds(5);
        store.save(&record).await.unwrap();

        assert!(store.load(&record.id).await.unwrap().is_none());
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }
}
