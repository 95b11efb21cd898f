//! The link service
//!
//! Turns a long URL into a short one and back again

use std::sync::Arc;

use chrono::Utc;
use percent_encoding::AsciiSet;
use percent_encoding::CONTROLS;
use percent_encoding::utf8_percent_encode;
use url::Url;
use uuid::Uuid;

use crate::links::AliasError;
use crate::links::LinkRecord;
use crate::links::normalize_alias;
use crate::links::parse_alias;
use crate::registry;
use crate::registry::AliasRegistry;

/// Length of generated aliases when nothing else is configured
pub const DEFAULT_ALIAS_LENGTH: usize = 7;

/// The slot every aliasless request used to end up in
pub const DEFAULT_FIXED_ALIAS: &str = "shortened";

/// How many generated aliases are tried before giving up
const MAX_GENERATE_ATTEMPTS: usize = 5;

/// Characters that can be used in a generated alias
const ALIAS_CHARACTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Characters encoded when an alias is added to the base URL, slashes are kept
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Link service errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// No link with the alias
    #[error("URL not found")]
    NotFound(String),

    /// Every generated alias was already taken
    #[error("Could not generate a unique alias")]
    AliasExhausted,

    /// The registry failed
    #[error(transparent)]
    Storage(#[from] registry::Error),
}

impl From<AliasError> for Error {
    fn from(err: AliasError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for all link service operations
pub type Result<T> = core::result::Result<T, Error>;

/// What to do when no alias is requested
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AliasStrategy {
    /// Generate a random alias that is not in use yet
    Random {
        /// Length of the alias
        length: usize,
    },

    /// Always use the same alias
    ///
    /// Every request without alias overwrites the previous one
    Fixed(String),
}

impl Default for AliasStrategy {
    fn default() -> Self {
        Self::Random {
            length: DEFAULT_ALIAS_LENGTH,
        }
    }
}

/// A freshly shortened link
#[derive(Clone, Debug)]
pub struct ShortenedLink {
    /// The full short URL
    pub short_url: String,

    /// The stored link
    pub record: LinkRecord,
}

/// The link service
#[derive(Clone)]
pub struct LinkService {
    /// Where the links live
    registry: Arc<dyn AliasRegistry>,

    /// Base of every short URL, always ends with a slash
    base_url: String,

    /// What to do when no alias is requested
    alias_strategy: AliasStrategy,
}

impl LinkService {
    /// Create the link service
    ///
    /// # Errors
    ///
    /// Will return `Err` when the base URL is not a valid URL or generated aliases would be empty
    pub fn new(
        registry: Arc<dyn AliasRegistry>,
        base_url: &str,
        alias_strategy: AliasStrategy,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| Error::Validation(format!("Invalid base URL: {err}")))?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        if let AliasStrategy::Random { length: 0 } = alias_strategy {
            return Err(Error::Validation(
                "Alias length should be at least 1".to_string(),
            ));
        }

        Ok(Self {
            registry,
            base_url,
            alias_strategy,
        })
    }

    /// The short URL of an alias
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use urldoc::link_service::{AliasStrategy, LinkService};
    /// # use urldoc::registry::Memory;
    /// let service =
    ///     LinkService::new(Arc::new(Memory::new()), "https://urldoc", AliasStrategy::default())
    ///         .unwrap();
    ///
    /// assert_eq!("https://urldoc/ex", service.short_url("ex"));
    /// ```
    pub fn short_url(&self, alias: &str) -> String {
        format!(
            "{}{}",
            self.base_url,
            utf8_percent_encode(alias, PATH_SEGMENT)
        )
    }

    /// Shorten a URL
    ///
    /// The URL is stored as given, it only has to be non-empty. An existing link with the
    /// requested alias is overwritten.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the URL is empty, the alias is invalid or the registry fails
    pub async fn shorten(
        &self,
        original_url: &str,
        requested_alias: Option<&str>,
        owner_id: Option<&Uuid>,
    ) -> Result<ShortenedLink> {
        if original_url.trim().is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }

        let requested_alias = requested_alias
            .map(parse_alias)
            .transpose()?
            .filter(|alias| !alias.is_empty());

        let alias = match requested_alias {
            Some(alias) => alias,
            None => self.default_alias().await?,
        };

        let record = LinkRecord {
            alias,
            original_url: original_url.to_string(),
            owner_id: owner_id.copied(),
            created_at: Utc::now().naive_utc(),
        };

        self.registry.put(&record).await.inspect_err(|err| {
            tracing::error!(r#"Could not save alias "{}": {err}"#, record.alias);
        })?;

        tracing::info!(
            r#"Alias "{}" now points to: {}"#,
            record.alias,
            record.original_url
        );

        Ok(ShortenedLink {
            short_url: self.short_url(&record.alias),
            record,
        })
    }

    /// Resolve an alias to the URL it points to
    ///
    /// Without alias only the fixed slot can be resolved
    ///
    /// # Errors
    ///
    /// Will return `Err` when the alias has no link or the registry fails
    pub async fn resolve(&self, alias: Option<&str>) -> Result<String> {
        let alias = alias.map(normalize_alias).filter(|alias| !alias.is_empty());

        let alias = match (alias, &self.alias_strategy) {
            (Some(alias), _) => alias,
            (None, AliasStrategy::Fixed(alias)) => alias.clone(),
            (None, AliasStrategy::Random { .. }) => {
                return Err(Error::NotFound(String::new()));
            }
        };

        tracing::debug!("Looking for alias: /{alias}");

        match self.registry.get(&alias).await? {
            Some(record) => {
                tracing::debug!(r#"Alias "{alias}" resolves to: {}"#, record.original_url);

                Ok(record.original_url)
            }
            None => {
                tracing::debug!(r#"Alias "{alias}" not found"#);

                Err(Error::NotFound(alias))
            }
        }
    }

    /// List all links created by a user
    ///
    /// Newest first, a user without links gets an empty list
    ///
    /// # Errors
    ///
    /// Will return `Err` when the registry fails
    pub async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<LinkRecord>> {
        let links = self.registry.query_by_owner(owner_id).await?;

        tracing::debug!("Found {} links for user {owner_id}", links.len());

        Ok(links)
    }

    /// Pick the alias for a request without one
    async fn default_alias(&self) -> Result<String> {
        match &self.alias_strategy {
            AliasStrategy::Fixed(alias) => Ok(alias.clone()),
            AliasStrategy::Random { length } => {
                for _ in 0..MAX_GENERATE_ATTEMPTS {
                    let alias = generate_alias(*length);

                    if self.registry.get(&alias).await?.is_none() {
                        return Ok(alias);
                    }

                    tracing::debug!(r#"Generated alias "{alias}" already exists, trying again"#);
                }

                Err(Error::AliasExhausted)
            }
        }
    }
}

/// Generate a random alphanumeric alias
fn generate_alias(length: usize) -> String {
    std::iter::repeat_with(|| {
        char::from(ALIAS_CHARACTERS[rand::random_range(0..ALIAS_CHARACTERS.len())])
    })
    .take(length)
    .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::registry::Memory;

    use super::*;

    fn service(alias_strategy: AliasStrategy) -> LinkService {
        LinkService::new(Arc::new(Memory::new()), "https://urldoc/", alias_strategy).unwrap()
    }

    /// Registry where every alias already exists
    struct Crowded;

    #[async_trait]
    impl AliasRegistry for Crowded {
        async fn put(&self, _record: &LinkRecord) -> registry::Result<()> {
            Ok(())
        }

        async fn get(&self, alias: &str) -> registry::Result<Option<LinkRecord>> {
            Ok(Some(LinkRecord {
                alias: alias.to_string(),
                original_url: "https://www.example.com/".to_string(),
                owner_id: None,
                created_at: Utc::now().naive_utc(),
            }))
        }

        async fn query_by_owner(&self, _owner_id: &Uuid) -> registry::Result<Vec<LinkRecord>> {
            Ok(Vec::new())
        }

        async fn close(&self) {}
    }

    /// Registry that can not be reached
    struct Unreachable;

    #[async_trait]
    impl AliasRegistry for Unreachable {
        async fn put(&self, _record: &LinkRecord) -> registry::Result<()> {
            Err(registry::Error::Connection("unreachable".to_string()))
        }

        async fn get(&self, _alias: &str) -> registry::Result<Option<LinkRecord>> {
            Err(registry::Error::Connection("unreachable".to_string()))
        }

        async fn query_by_owner(&self, _owner_id: &Uuid) -> registry::Result<Vec<LinkRecord>> {
            Err(registry::Error::Connection("unreachable".to_string()))
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_shorten_and_resolve() {
        let service = service(AliasStrategy::default());

        let link = service
            .shorten("https://example.com", Some("ex"), None)
            .await
            .unwrap();
        assert_eq!("https://urldoc/ex", link.short_url);
        assert_eq!("ex", link.record.alias);
        assert_eq!(None, link.record.owner_id);

        let url = service.resolve(Some("ex")).await.unwrap();
        assert_eq!("https://example.com", url);
    }

    #[tokio::test]
    async fn test_shorten_overwrites() {
        let service = service(AliasStrategy::default());

        service
            .shorten("https://a.com", Some("same"), None)
            .await
            .unwrap();
        service
            .shorten("https://b.com", Some("same"), None)
            .await
            .unwrap();

        let url = service.resolve(Some("same")).await.unwrap();
        assert_eq!("https://b.com", url);
    }

    #[tokio::test]
    async fn test_shorten_keeps_url_as_is() {
        let service = service(AliasStrategy::default());

        service
            .shorten("not really a url", Some("raw"), None)
            .await
            .unwrap();

        let url = service.resolve(Some("raw")).await.unwrap();
        assert_eq!("not really a url", url);
    }

    #[tokio::test]
    async fn test_shorten_empty_url() {
        let service = service(AliasStrategy::Fixed(DEFAULT_FIXED_ALIAS.to_string()));

        for url in ["", "   "] {
            let result = service.shorten(url, None, None).await;
            assert!(matches!(result, Err(Error::Validation(ref message)) if message == "URL is required"));
        }

        // nothing is written
        let result = service.resolve(None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_shorten_invalid_alias() {
        let service = service(AliasStrategy::default());

        let result = service
            .shorten("https://a.com", Some("api/links"), None)
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = service.shorten("https://a.com", Some("a?b"), None).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_resolve_unknown_alias() {
        let service = service(AliasStrategy::default());

        let result = service.resolve(Some("never-shortened")).await;
        assert!(matches!(result, Err(Error::NotFound(ref alias)) if alias == "never-shortened"));

        let result = service.resolve(None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_normalizes_alias() {
        let service = service(AliasStrategy::default());

        service
            .shorten("https://a.com", Some("/slashes/"), None)
            .await
            .unwrap();

        let url = service.resolve(Some("slashes/")).await.unwrap();
        assert_eq!("https://a.com", url);
    }

    #[tokio::test]
    async fn test_generated_aliases() {
        let service = service(AliasStrategy::Random { length: 9 });

        let one = service.shorten("https://a.com", None, None).await.unwrap();
        let two = service.shorten("https://a.com", None, None).await.unwrap();

        assert_eq!(9, one.record.alias.len());
        assert!(one.record.alias.chars().all(|ch| ch.is_ascii_alphanumeric()));
        assert_ne!(one.record.alias, two.record.alias);

        // both links survive
        assert_eq!(
            "https://a.com",
            service.resolve(Some(&one.record.alias)).await.unwrap()
        );
        assert_eq!(
            "https://a.com",
            service.resolve(Some(&two.record.alias)).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_requested_alias_is_generated() {
        let service = service(AliasStrategy::default());

        let link = service
            .shorten("https://a.com", Some("/"), None)
            .await
            .unwrap();

        assert_eq!(DEFAULT_ALIAS_LENGTH, link.record.alias.len());
    }

    #[tokio::test]
    async fn test_fixed_alias_collides() {
        let service = service(AliasStrategy::Fixed(DEFAULT_FIXED_ALIAS.to_string()));

        let one = service.shorten("https://a.com", None, None).await.unwrap();
        let two = service.shorten("https://b.com", None, None).await.unwrap();

        assert_eq!("https://urldoc/shortened", one.short_url);
        assert_eq!(one.short_url, two.short_url);

        // the second write replaced the first one
        assert_eq!("https://b.com", service.resolve(None).await.unwrap());
        assert_eq!(
            "https://b.com",
            service.resolve(Some(DEFAULT_FIXED_ALIAS)).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_generated_alias_exhausted() {
        let service = LinkService::new(
            Arc::new(Crowded),
            "https://urldoc/",
            AliasStrategy::default(),
        )
        .unwrap();

        let result = service.shorten("https://a.com", None, None).await;
        assert!(matches!(result, Err(Error::AliasExhausted)));
    }

    #[tokio::test]
    async fn test_storage_failure() {
        let service = LinkService::new(
            Arc::new(Unreachable),
            "https://urldoc/",
            AliasStrategy::default(),
        )
        .unwrap();

        let result = service.shorten("https://a.com", Some("ex"), None).await;
        assert!(matches!(result, Err(Error::Storage(_))));

        let result = service.resolve(Some("ex")).await;
        assert!(matches!(result, Err(Error::Storage(_))));

        let result = service.list_by_owner(&Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let service = service(AliasStrategy::default());

        let owner_id = Uuid::new_v4();
        let other_owner_id = Uuid::new_v4();

        assert!(service.list_by_owner(&owner_id).await.unwrap().is_empty());

        service
            .shorten("https://a.com", Some("mine"), Some(&owner_id))
            .await
            .unwrap();
        service
            .shorten("https://b.com", Some("theirs"), Some(&other_owner_id))
            .await
            .unwrap();
        service
            .shorten("https://c.com", Some("nobodys"), None)
            .await
            .unwrap();

        let links = service.list_by_owner(&owner_id).await.unwrap();
        assert_eq!(1, links.len());
        assert!(links
            .iter()
            .all(|link| link.owner_id == Some(owner_id)));
        assert_eq!("mine", links[0].alias);
    }

    #[test]
    fn test_short_url() {
        let service = LinkService::new(
            Arc::new(Memory::new()),
            "https://urldoc",
            AliasStrategy::default(),
        )
        .unwrap();

        assert_eq!("https://urldoc/ex", service.short_url("ex"));
        assert_eq!("https://urldoc/a%20b", service.short_url("a b"));
        assert_eq!("https://urldoc/nested/alias", service.short_url("nested/alias"));
        assert_eq!("https://urldoc/%F0%9F%A6%99", service.short_url("🦙"));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = LinkService::new(
            Arc::new(Memory::new()),
            "not a base url",
            AliasStrategy::default(),
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_zero_alias_length() {
        let result = LinkService::new(
            Arc::new(Memory::new()),
            "https://urldoc/",
            AliasStrategy::Random { length: 0 },
        );

        assert!(
            matches!(result, Err(Error::Validation(ref message)) if message == "Alias length should be at least 1")
        );
    }
}
