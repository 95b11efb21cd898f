//! Current user service
//!
//! Get the current user from the request based on the Authorization header

use std::ops::Deref;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::extract::OptionalFromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::api::Error;
use crate::identity::Identity;
use crate::identity::IdentityProvider;

/// Current user service
#[derive(Clone, Debug)]
pub struct CurrentUser {
    /// The signed in identity
    identity: Identity,
}

impl Deref for CurrentUser {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.identity
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) =
            <TypedHeader<Authorization<Bearer>> as FromRequestParts<S>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(identity_provider) = parts
            .extract::<Extension<IdentityProvider>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get identity provider"))?;

        let identity = identity_provider.authenticate(bearer.token()).await?;

        Ok(CurrentUser { identity })
    }
}

/// Anonymous requests are fine, a given but invalid token is not
impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }

        <CurrentUser as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
