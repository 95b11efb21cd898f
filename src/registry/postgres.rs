//! Postgres storage
//!
//! Migrations in `migrations/` are embedded and run on connect

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::links::LinkRecord;
use crate::users::User;

use super::AliasRegistry;
use super::CreateUserValues;
use super::Error;
use super::Result;
use super::UserDirectory;
use super::connection_error;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage from a connection string
    ///
    /// Migrations will be run
    pub async fn connect(database_connection_string: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_connection_string)
            .await
            .map_err(connection_error)?;

        Self::with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(connection_error)?;

        tracing::info!("Connected to Postgres registry");

        Ok(Self { connection_pool })
    }
}

#[async_trait]
impl AliasRegistry for Postgres {
    async fn put(&self, record: &LinkRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO links (alias, original_url, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (alias) DO UPDATE
            SET original_url = EXCLUDED.original_url,
                owner_id = EXCLUDED.owner_id,
                created_at = EXCLUDED.created_at
            ",
        )
        .bind(&record.alias)
        .bind(&record.original_url)
        .bind(record.owner_id)
        .bind(record.created_at)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn get(&self, alias: &str) -> Result<Option<LinkRecord>> {
        sqlx::query_as::<_, LinkRecord>(
            r"
            SELECT alias, original_url, owner_id, created_at
            FROM links
            WHERE alias = $1
            LIMIT 1
            ",
        )
        .bind(alias)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn query_by_owner(&self, owner_id: &Uuid) -> Result<Vec<LinkRecord>> {
        sqlx::query_as::<_, LinkRecord>(
            r"
            SELECT alias, original_url, owner_id, created_at
            FROM links
            WHERE owner_id = $1
            ORDER BY created_at DESC, alias ASC
            ",
        )
        .bind(owner_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn close(&self) {
        self.connection_pool.close().await;
    }
}

#[async_trait]
impl UserDirectory for Postgres {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT id, session_id, email, hashed_password, created_at
            FROM users
            WHERE email = $1
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT id, session_id, email, hashed_password, created_at
            FROM users
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (id, session_id, email, hashed_password, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, session_id, email, hashed_password, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.email)
        .bind(values.hashed_password)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.connection_pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                Error::DuplicateEmail(values.email.to_string())
            }
            err => connection_error(err),
        })
    }

    async fn rotate_session(&self, user: &User, session_id: &Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET session_id = $1
            WHERE id = $2
            RETURNING id, session_id, email, hashed_password, created_at
            ",
        )
        .bind(session_id)
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)
    }
}
