//! All API endpoint setup

use axum::Router;
use axum::routing::get;
use axum::routing::post;

pub use current_user::CurrentUser;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

mod current_user;
mod links;
mod request;
mod response;
mod users;

/// Get the Axum router for all API routes
pub fn router() -> Router {
    let users = Router::new()
        .route("/", post(users::sign_up))
        .route("/token", post(users::sign_in).delete(users::sign_out))
        .route("/me", get(users::me))
        .route("/me/links", get(users::history));

    let links = Router::new()
        .route("/", post(links::create))
        .route("/{*alias}", get(links::single));

    Router::new()
        .nest("/users", users)
        .nest("/links", links)
}
