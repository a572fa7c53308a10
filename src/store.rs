// src/store.rs

//! Credential store: persistence of user identities.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::{NewUser, User},
};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a user. Fails with `DuplicateEmail` if the email is taken, compared case-insensitively.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
}

/// SQLite-backed store. Uniqueness is enforced by the `users.email` constraint,
/// so concurrent registrations of one email cannot both succeed.
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn shared(pool: SqlitePool) -> Arc<dyn CredentialStore> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, email, password, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(chrono::Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            if err != AppError::DuplicateEmail {
                tracing::error!("Failed to register user: {:?}", err);
            }
            err
        })?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::InternalError(e.to_string())
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
