//! Identity provider
//!
//! Users sign up and sign in with an email address and password, and receive a bearer token
//! to identify themselves with. Signing out invalidates every token of the session.

use std::sync::Arc;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

pub use session::AuthSession;
pub use session::Subscription;

use crate::password::hash;
use crate::password::verify;
use crate::registry;
use crate::registry::CreateUserValues;
use crate::registry::UserDirectory;
use crate::users::User;
use crate::users::normalize_email;

mod session;

/// Minimum length of a password
const MIN_PASSWORD_LENGTH: usize = 6;

/// How long a token is valid, in seconds
const TOKEN_EXPIRES_IN: i64 = 3600;

/// Identity errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// Credentials are rejected
    #[error("{0}")]
    AuthFailure(String),

    /// Token is rejected
    #[error("Invalid token: {0}")]
    Token(String),

    /// The user directory failed
    #[error(transparent)]
    Storage(#[from] registry::Error),
}

/// Result type for all identity operations
pub type Result<T> = core::result::Result<T, Error>;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims to identifies a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// When does the token expire
    exp: i64,

    /// A sessions ID, used to expire/invalidate tokens before the expiration date
    jti: Uuid,
}

/// Who is signed in
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// The user ID, owner of the links the user creates
    pub id: Uuid,

    /// The email address
    pub email: String,
}

impl Identity {
    /// Create an identity from a [`User`](User)
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Token information served to the user
#[derive(Clone, Debug, Serialize)]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    pub token_type: String,

    /// In how many seconds does the token expire
    pub expires_in: i64,

    /// The access token to provide to follow up requests in the Authorization header
    #[allow(clippy::struct_field_names)] // `access_token` is the name of the field
    pub access_token: String,
}

impl Token {
    /// Create a new token response
    fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            expires_in,
            access_token,
        }
    }
}

/// A successful sign up or sign in
#[derive(Clone, Debug)]
pub struct SignedIn {
    /// Who is signed in
    pub identity: Identity,

    /// Token to identify with
    pub token: Token,
}

/// The identity provider
#[derive(Clone)]
pub struct IdentityProvider {
    /// Where the users live
    users: Arc<dyn UserDirectory>,

    /// Keys to sign tokens with
    jwt_keys: JwtKeys,
}

impl IdentityProvider {
    /// Create the identity provider
    pub fn new(users: Arc<dyn UserDirectory>, jwt_keys: JwtKeys) -> Self {
        Self { users, jwt_keys }
    }

    /// Create a new user and sign in
    ///
    /// # Errors
    ///
    /// Will return `Err` when the email address is invalid or already in use, the password is
    /// too short or the directory fails
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = normalize_email(email);

        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation("Invalid email address".to_string()));
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::Validation(format!(
                "Password should be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(Error::AuthFailure("Email already in use".to_string()));
        }

        let hashed_password = hash(password).map_err(|err| {
            tracing::error!("Could not hash password: {err}");
            Error::Validation("Invalid password".to_string())
        })?;

        let values = CreateUserValues {
            session_id: &Uuid::new_v4(),
            email: &email,
            hashed_password: &hashed_password,
        };

        // a concurrent sign up can still win the race
        let user = self
            .users
            .create_user(&values)
            .await
            .map_err(|err| match err {
                registry::Error::DuplicateEmail(_) => {
                    Error::AuthFailure("Email already in use".to_string())
                }
                err => Error::Storage(err),
            })?;

        tracing::info!("User {} signed up", user.id);

        self.signed_in(&user)
    }

    /// Sign in with existing credentials
    ///
    /// # Errors
    ///
    /// Will return `Err` when the credentials do not match a user or the directory fails
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = normalize_email(email);

        let user = self.users.find_user_by_email(&email).await?;

        match user {
            Some(user) if verify(&user.hashed_password, password) => {
                tracing::info!("User {} signed in", user.id);

                self.signed_in(&user)
            }
            _ => Err(Error::AuthFailure("Invalid email or password".to_string())),
        }
    }

    /// Sign out, every token handed out before stops working
    ///
    /// # Errors
    ///
    /// Will return `Err` when the user is unknown or the directory fails
    pub async fn sign_out(&self, identity: &Identity) -> Result<()> {
        let user = self.find_user(&identity.id).await?;

        self.users.rotate_session(&user, &Uuid::new_v4()).await?;

        tracing::info!("User {} signed out", user.id);

        Ok(())
    }

    /// Find out who belongs to an access token
    ///
    /// # Errors
    ///
    /// Will return `Err` when the token is invalid, expired or belongs to an ended session
    pub async fn authenticate(&self, access_token: &str) -> Result<Identity> {
        use jsonwebtoken::Validation;
        use jsonwebtoken::decode;

        let validation = Validation::default();

        let token_data = decode::<Claims>(access_token, &self.jwt_keys.decoding, &validation)
            .map_err(|err| Error::Token(err.to_string()))?;

        let claims = token_data.claims;

        let user = self.find_user(&claims.sub).await?;

        // mechanism to invalidate JWT tokens
        if claims.jti != user.session_id {
            return Err(Error::Token("Token expired".to_string()));
        }

        Ok(Identity::from_user(&user))
    }

    /// Find a user by ID
    async fn find_user(&self, id: &Uuid) -> Result<User> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| Error::AuthFailure("Could not find user".to_string()))
    }

    /// Generate a token for the outside world for a given user
    fn signed_in(&self, user: &User) -> Result<SignedIn> {
        use jsonwebtoken::Header;
        use jsonwebtoken::encode;

        let claims = Claims {
            sub: user.id,
            exp: chrono::Utc::now().timestamp() + TOKEN_EXPIRES_IN,
            jti: user.session_id,
        };

        let access_token = encode(&Header::default(), &claims, &self.jwt_keys.encoding)
            .map_err(|err| Error::Token(err.to_string()))?;

        Ok(SignedIn {
            identity: Identity::from_user(user),
            token: Token::new(access_token, TOKEN_EXPIRES_IN),
        })
    }
}
