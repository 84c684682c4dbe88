/*
 * Responsibility
 * - users の永続化インターフェース (UserStore) と Postgres 実装
 * - password hash / refresh token digest を含む UserRecord と、
 *   それらを落とした projection (UserProfile) を分けて返す
 * - DB エラーは RepoError に変換して返す
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

/// User as seen by handlers: no password hash, no session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserProfile {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The refresh session stored on a user.
///
/// Only one session may be active per user; writing `Active` replaces any previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSession {
    None,
    Active {
        refresh_token_digest: String,
        issued_at: DateTime<Utc>,
    },
}

/// Full user row, including credentials. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub profile: UserProfile,
    pub password_hash: String,
    pub session: StoredSession,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRecord>>;

    // Projection used by the request authorizer.
    async fn find_profile_by_id(&self, id: Uuid) -> RepoResult<Option<UserProfile>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;

    /// Returns `RepoError::Conflict` when the email is already taken.
    async fn insert(&self, user: NewUser) -> RepoResult<UserProfile>;

    /// Overwrite only the session columns. Returns `false` if the user does not exist.
    async fn set_session(&self, id: Uuid, session: StoredSession) -> RepoResult<bool>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    full_name: String,
    password_hash: String,
    refresh_token_digest: Option<String>,
    refresh_token_issued_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        let session = match (row.refresh_token_digest, row.refresh_token_issued_at) {
            (Some(refresh_token_digest), Some(issued_at)) => StoredSession::Active {
                refresh_token_digest,
                issued_at,
            },
            _ => StoredSession::None,
        };

        Self {
            profile: UserProfile {
                id: row.user_id,
                email: row.email,
                full_name: row.full_name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
            session,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, full_name, password_hash,
                refresh_token_digest, refresh_token_issued_at,
                created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_profile_by_id(&self, id: Uuid) -> RepoResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT user_id, email, full_name, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, full_name, password_hash,
                refresh_token_digest, refresh_token_issued_at,
                created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    async fn insert(&self, user: NewUser) -> RepoResult<UserProfile> {
        let row = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (user_id, email, full_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, email, full_name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn set_session(&self, id: Uuid, session: StoredSession) -> RepoResult<bool> {
        let (digest, issued_at) = match session {
            StoredSession::None => (None, None),
            StoredSession::Active {
                refresh_token_digest,
                issued_at,
            } => (Some(refresh_token_digest), Some(issued_at)),
        };

        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                refresh_token_digest = $2,
                refresh_token_issued_at = $3,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .bind(digest)
        .bind(issued_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
