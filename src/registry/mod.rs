//! All things related to the storage of links and users
//!
//! The registry is an explicit client: it is created with [`connect`], handed to the services
//! that need it, and closed with [`Connection::close`].

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub use memory::Memory;
pub use postgres::Postgres;

use crate::links::LinkRecord;
use crate::users::User;

mod memory;
mod postgres;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),

    /// Another user already has this email address
    #[error("Duplicate email: {0}")]
    DuplicateEmail(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Registry configuration
pub enum RegistryConfig {
    /// In-memory registry, gone on shutdown
    Memory,

    /// Connect to Postgres with a connection string
    Postgres {
        /// Connection string
        url: String,
    },

    /// Use existing Postgres connection pool
    ExistingConnection(PgPool),
}

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The normalized email address
    pub email: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// The durable store mapping an alias to a link
#[async_trait]
pub trait AliasRegistry: Send + Sync {
    /// Save a link under its alias
    ///
    /// An existing link with the same alias is overwritten, the last write wins
    async fn put(&self, record: &LinkRecord) -> Result<()>;

    /// Find a single link by alias
    async fn get(&self, alias: &str) -> Result<Option<LinkRecord>>;

    /// Find all links created by a user
    ///
    /// Newest first
    async fn query_by_owner(&self, owner_id: &Uuid) -> Result<Vec<LinkRecord>>;

    /// Release the underlying resources
    async fn close(&self);
}

/// The users known to the identity provider
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a single user by its (normalized) email address
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Finds a single user by its ID
    async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>>;

    /// Create a single user
    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User>;

    /// Give the user a new session ID, invalidating all tokens of the old session
    async fn rotate_session(&self, user: &User, session_id: &Uuid) -> Result<User>;
}

/// An open registry connection
#[derive(Clone)]
pub struct Connection {
    /// Links
    aliases: Arc<dyn AliasRegistry>,

    /// Users
    users: Arc<dyn UserDirectory>,
}

impl Connection {
    /// Create a connection from a backend serving both links and users
    fn from_backend<B>(backend: B) -> Self
    where
        B: AliasRegistry + UserDirectory + Clone + 'static,
    {
        Self {
            aliases: Arc::new(backend.clone()),
            users: Arc::new(backend),
        }
    }

    /// The link side of the registry
    pub fn aliases(&self) -> Arc<dyn AliasRegistry> {
        Arc::clone(&self.aliases)
    }

    /// The user side of the registry
    pub fn users(&self) -> Arc<dyn UserDirectory> {
        Arc::clone(&self.users)
    }

    /// Close the connection
    pub async fn close(self) {
        tracing::debug!("Closing registry connection");

        self.aliases.close().await;
    }
}

/// Setup the registry
///
/// # Errors
///
/// Will return `Err` when Postgres can not be reached or migrated
pub async fn connect(config: RegistryConfig) -> Result<Connection> {
    match config {
        RegistryConfig::Memory => {
            tracing::info!("Using in-memory registry, links are lost on shutdown");

            Ok(Connection::from_backend(Memory::new()))
        }
        RegistryConfig::Postgres { url } => {
            let postgres = Postgres::connect(&url).await?;

            Ok(Connection::from_backend(postgres))
        }
        RegistryConfig::ExistingConnection(pool) => {
            let postgres = Postgres::with_pool(pool).await?;

            Ok(Connection::from_backend(postgres))
        }
    }
}

/// Convert any error to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
