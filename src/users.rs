use chrono::naive::NaiveDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: NaiveDateTime,
}

/// Normalize an email address, addresses are compared case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
