//! PostgreSQL 操作员 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use phonebook_adapter_postgres::map_sqlx_error;
use phonebook_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::entities::DashboardUser;
use crate::domain::repositories::UserRepository;
use crate::domain::value_objects::{HashedPassword, Username};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    session_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AppResult<DashboardUser> {
        let username = Username::new(self.username)
            .map_err(|e| AppError::internal(format!("Stored username for user {} is invalid: {}", self.id, e)))?;
        Ok(DashboardUser {
            id: self.id,
            username,
            password_hash: HashedPassword::from_hash(self.password_hash),
            session_version: self.session_version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<DashboardUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, session_version, created_at, updated_at
            FROM dashboard_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> AppResult<Option<DashboardUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, session_version, created_at, updated_at
            FROM dashboard_users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn create(&self, username: &Username, password_hash: &HashedPassword) -> AppResult<DashboardUser> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO dashboard_users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, session_version, created_at, updated_at
            "#,
        )
        .bind(username.as_str())
        .bind(password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .into_user()
    }

    async fn update_password(&self, id: i64, password_hash: &HashedPassword) -> AppResult<i32> {
        let version: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE dashboard_users
            SET password_hash = $2, session_version = session_version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING session_version
            "#,
        )
        .bind(id)
        .bind(password_hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        version.ok_or_else(|| AppError::not_found(format!("Dashboard user {} not found", id)))
    }
}
