#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

//! UrlDoc, a URL shortener
//!
//! Long URLs are stored under a short alias in the [`registry`], the [`link_service`] turns
//! requests into records and back, and the [`identity`] provider keeps track of who created
//! which link.

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use config::Config;

use crate::api::router;
use crate::identity::IdentityProvider;
use crate::identity::JwtKeys;
use crate::link_service::LinkService;
use crate::registry::Connection;

pub mod api;
pub mod config;
pub mod graceful_shutdown;
pub mod identity;
pub mod link_service;
pub mod links;
pub mod password;
pub mod registry;
pub mod root;
#[cfg(test)]
mod tests;
pub mod users;
pub mod utils;

/// Create and setup the app with its dependencies
///
/// The registry connection is returned next to the router, it should be closed once the
/// server stops serving requests.
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Registry connection
/// - Base URL of the short links
pub async fn setup_app(config: Config) -> Result<(Router, Connection)> {
    let connection = registry::connect(config.registry).await?;

    let link_service = LinkService::new(
        connection.aliases(),
        &config.base_url,
        config.alias_strategy,
    )?;

    let identity_provider =
        IdentityProvider::new(connection.users(), JwtKeys::new(config.jwt_secret.as_bytes()));

    Ok((create_router(link_service, identity_provider), connection))
}

/// Create the router for UrlDoc
fn create_router(link_service: LinkService, identity_provider: IdentityProvider) -> Router {
    Router::new()
        .nest("/api", router())
        .fallback(get(root::root))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(link_service))
        .layer(Extension(identity_provider))
}
