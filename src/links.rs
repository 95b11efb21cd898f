//! Links

use chrono::naive::NaiveDateTime;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// A short alias pointing to an original URL
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct LinkRecord {
    /// External identifier, the path segment of the short URL
    pub alias: String,

    /// Location where the alias goes
    pub original_url: String,

    /// The ID of the user that created it, if any
    pub owner_id: Option<Uuid>,

    /// Creation date
    pub created_at: NaiveDateTime,
}

/// Problems with a requested alias
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AliasError {
    /// Aliases are used as URL path, a query string would be cut off
    #[error(r#"Alias can not contain "?""#)]
    QuestionMark,

    /// Aliases are used as URL path, a fragment would be cut off
    #[error(r##"Alias can not contain "#""##)]
    Hash,

    /// The `api/` prefix is used by the API itself
    #[error("Alias can not start with 'api/'")]
    Reserved,
}

/// Normalize an alias
///
/// - Leading and trailing slashes are removed
/// - Unicode normalization (NFC), so visually equal aliases are the same alias
///
/// ```rust
/// use urldoc::links::normalize_alias;
///
/// assert_eq!(normalize_alias("/some-alias/"), "some-alias".to_string());
/// ```
pub fn normalize_alias(alias: &str) -> String {
    alias.trim_matches('/').nfc().collect()
}

/// Parse and normalize an alias requested for a new link
///
/// ```rust
/// use urldoc::links::parse_alias;
///
/// assert_eq!(parse_alias("/some-alias").unwrap(), "some-alias".to_string());
/// assert!(parse_alias("api/some-alias").is_err());
/// ```
///
/// # Errors
///
/// Will return `Err` when the alias can not be used as a path segment
pub fn parse_alias(alias: &str) -> Result<String, AliasError> {
    let alias = normalize_alias(alias);

    for ch in alias.chars() {
        if ch == '?' {
            return Err(AliasError::QuestionMark);
        }

        if ch == '#' {
            return Err(AliasError::Hash);
        }
    }

    if alias == "api" || alias.starts_with("api/") {
        return Err(AliasError::Reserved);
    }

    Ok(alias)
}
