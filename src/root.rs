//! The root!
//!
//! The most important part of UrlDoc, the actual redirect logic

use std::str::Utf8Error;

use axum::Extension;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::LOCATION;
use percent_encoding::percent_decode_str;

use crate::link_service::Error;
use crate::link_service::LinkService;

/// The root!
///
/// All wildcard requests end up in this function.
///
/// The path is the alias, the link service resolves it to the URL to redirect to
pub async fn root(
    Extension(link_service): Extension<LinkService>,
    uri: Uri,
) -> Result<(StatusCode, HeaderMap), (StatusCode, String)> {
    let alias = url_decode_alias(uri.path()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "URL contains invalid UTF-8 characters".to_string(),
        )
    })?;

    let original_url = match link_service.resolve(Some(&alias)).await {
        Ok(original_url) => original_url,
        Err(err @ Error::NotFound(_)) => return Err((StatusCode::NOT_FOUND, err.to_string())),
        Err(err) => return Err(internal_error(err)),
    };

    let location = HeaderValue::from_str(&original_url).map_err(|err| {
        tracing::debug!(r#"Alias "{alias}" points to an unusable location: {err}"#);

        (
            StatusCode::UNPROCESSABLE_ENTITY,
            "URL can not be used as redirect location".to_string(),
        )
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, location);

    Ok((StatusCode::TEMPORARY_REDIRECT, headers))
}

/// Utility function for mapping any error into a `500 Internal Server Error`
/// response.
fn internal_error<E>(err: E) -> (StatusCode, String)
where
    E: std::error::Error,
{
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// URL decode alias
///
/// Uses percentage encoding for the decoding, might error in case of invalid UTF-8
fn url_decode_alias(alias: &str) -> Result<String, Utf8Error> {
    let decoded = percent_decode_str(alias);

    decoded.decode_utf8().map(|decoded| decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode_alias() {
        assert_eq!("a b", url_decode_alias("a%20b").unwrap());
        assert_eq!("🦙", url_decode_alias("%F0%9F%A6%99").unwrap());
        assert!(url_decode_alias("%c0").is_err());
    }
}
