//! User API
//!
//! Sign up, sign in, sign out and the link history of the current user

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::IdentityProvider;
use crate::identity::Token;
use crate::link_service::LinkService;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::Success;
use super::links::LinkResponse;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The user ID
    pub id: Uuid,

    /// The email address
    pub email: String,
}

/// Credentials form, for both sign up and sign in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsForm {
    /// Email address of the user
    email: String,
    /// Password of the user
    password: String,
}

/// Create a new user, the response is a token like [`sign_in`](sign_in)
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "someone@example.com", "password": "verysecret" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "access_token": "some token" ... } }
/// ```
pub async fn sign_up(
    Extension(identity_provider): Extension<IdentityProvider>,
    Form(form): Form<CredentialsForm>,
) -> Result<Success<Token>, Error> {
    let signed_in = identity_provider
        .sign_up(&form.email, &form.password)
        .await?;

    Ok(Success::created(signed_in.token))
}

/// Get a token for a user "session"
///
/// The token can then be used to access the user routes by using it in the `Authorization`
/// header, links created with the token are owned by the user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "someone@example.com", "password": "verysecret" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "access_token": "some token" ... } }
/// ```
pub async fn sign_in(
    Extension(identity_provider): Extension<IdentityProvider>,
    Form(form): Form<CredentialsForm>,
) -> Result<Success<Token>, Error> {
    let signed_in = identity_provider
        .sign_in(&form.email, &form.password)
        .await?;

    Ok(Success::ok(signed_in.token))
}

/// End the session, all tokens of the user stop working
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/token
/// ```
pub async fn sign_out(
    Extension(identity_provider): Extension<IdentityProvider>,
    current_user: CurrentUser,
) -> Result<Success<&'static str>, Error> {
    identity_provider.sign_out(&current_user).await?;

    Ok(Success::<&'static str>::no_content())
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "email": "someone@example.com" } }
/// ```
pub async fn me(current_user: CurrentUser) -> Result<Success<UserResponse>, Error> {
    Ok(Success::ok(UserResponse {
        id: current_user.id,
        email: current_user.email.clone(),
    }))
}

/// List the links created by the current user, newest first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me/links
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "alias": "ex", "shortUrl": "https://urldoc/ex" ... } ] }
/// ```
pub async fn history(
    Extension(link_service): Extension<LinkService>,
    current_user: CurrentUser,
) -> Result<Success<Vec<LinkResponse>>, Error> {
    let links = link_service.list_by_owner(&current_user.id).await?;

    Ok(Success::ok(LinkResponse::from_record_multiple(
        &link_service,
        links,
    )))
}
