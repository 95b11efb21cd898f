//! Links API endpoints
//!
//! Shorten URLs and look them up again

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::link_service::LinkService;
use crate::link_service::ShortenedLink;
use crate::links::LinkRecord;
use crate::links::normalize_alias;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Link response going to the user
///
/// Basically filtering which fields are shown to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    /// Alias of the link
    pub alias: String,

    /// Full short URL
    pub short_url: String,

    /// Url where the short URL redirects to
    pub original_url: String,

    /// Creation date
    pub created_at: NaiveDateTime,
}

impl LinkResponse {
    /// Create a response from a [`LinkRecord`](LinkRecord)
    pub fn from_record(link_service: &LinkService, record: LinkRecord) -> Self {
        Self {
            short_url: link_service.short_url(&record.alias),
            alias: record.alias,
            original_url: record.original_url,
            created_at: record.created_at,
        }
    }

    /// Create a response from multiple [`LinkRecord`](LinkRecord)s
    pub fn from_record_multiple(link_service: &LinkService, records: Vec<LinkRecord>) -> Vec<Self> {
        records
            .into_iter()
            .map(|record| Self::from_record(link_service, record))
            .collect::<Vec<Self>>()
    }

    /// Create a response from a [`ShortenedLink`](ShortenedLink)
    fn from_shortened_link(link: ShortenedLink) -> Self {
        Self {
            alias: link.record.alias,
            short_url: link.short_url,
            original_url: link.record.original_url,
            created_at: link.record.created_at,
        }
    }
}

/// Create link form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkForm {
    /// URL to shorten
    url: String,

    /// Custom alias, one is generated when missing
    ///
    /// The alias is normalized:
    /// - Leading and trailing slashes are removed
    /// - Unicode normalization
    alias: Option<String>,
}

/// Shorten a URL based on the [`CreateLinkForm`](CreateLinkForm) form
///
/// Signed in users become the owner of the link, anonymous links have no owner
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "url": "https://www.example.com/", "alias": "ex" }' \
///     http://localhost:6000/api/links
/// ```
///
/// Response
/// ```json
/// { "data": { "alias": "ex", "shortUrl": "https://urldoc/ex" ... } }
/// ```
pub async fn create(
    Extension(link_service): Extension<LinkService>,
    current_user: Option<CurrentUser>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let owner_id: Option<Uuid> = current_user.map(|current_user| current_user.id);

    let link = link_service
        .shorten(&form.url, form.alias.as_deref(), owner_id.as_ref())
        .await?;

    Ok(Success::created(LinkResponse::from_shortened_link(link)))
}

/// Get a single link by alias
///
/// Like visiting the short URL, without the redirect
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/api/links/ex
/// ```
///
/// Response:
/// ```json
/// { "data": { "alias": "ex", "originalUrl": "https://www.example.com/" ... } }
/// ```
pub async fn single(
    Extension(link_service): Extension<LinkService>,
    PathParameters(alias): PathParameters<String>,
) -> Result<Success<ResolvedResponse>, Error> {
    let alias = normalize_alias(&alias);

    let original_url = link_service.resolve(Some(&alias)).await?;

    Ok(Success::ok(ResolvedResponse {
        short_url: link_service.short_url(&alias),
        alias,
        original_url,
    }))
}

/// Resolved link response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResponse {
    /// Alias that was looked up
    pub alias: String,

    /// Full short URL
    pub short_url: String,

    /// Url the alias points to
    pub original_url: String,
}
