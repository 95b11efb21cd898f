use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_sign_up() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::sign_up(&mut app, "someone@example.com").await;

    let (status_code, user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("someone@example.com", user.unwrap().email);
}

#[tokio::test]
async fn test_sign_up_normalizes_email() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::sign_up(&mut app, "  SomeOne@Example.com ").await;

    let (_, user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!("someone@example.com", user.unwrap().email);
}

#[tokio::test]
async fn test_sign_up_duplicate_email() {
    let mut app = helper::setup_test_app().await;

    helper::sign_up(&mut app, "someone@example.com").await;

    let (status_code, access_token, error) =
        helper::maybe_sign_up(&mut app, "someone@example.com", "anothersecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(access_token.is_none());
    assert_eq!(Some("Email already in use".to_string()), error);
}

#[tokio::test]
async fn test_sign_up_invalid() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) = helper::maybe_sign_up(&mut app, "nobody", "verysecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid email address".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_sign_up(&mut app, "someone@example.com", "short").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some("Password should be at least 6 characters".to_string()),
        error
    );
}

#[tokio::test]
async fn test_sign_in() {
    let mut app = helper::setup_test_app().await;

    helper::sign_up(&mut app, "someone@example.com").await;

    let (status_code, access_token, _) =
        helper::maybe_sign_in(&mut app, "someone@example.com", "verysecret").await;
    assert_eq!(StatusCode::OK, status_code);

    let (status_code, user) = helper::current_user(&mut app, &access_token.unwrap()).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("someone@example.com", user.unwrap().email);
}

#[tokio::test]
async fn test_sign_in_wrong_credentials() {
    let mut app = helper::setup_test_app().await;

    helper::sign_up(&mut app, "someone@example.com").await;

    let (status_code, access_token, error) =
        helper::maybe_sign_in(&mut app, "someone@example.com", "wrongsecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert!(access_token.is_none());
    assert_eq!(Some("Invalid email or password".to_string()), error);

    // unknown users get the same message
    let (status_code, _, error) =
        helper::maybe_sign_in(&mut app, "nobody@example.com", "verysecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid email or password".to_string()), error);
}

#[tokio::test]
async fn test_sign_out() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::sign_up(&mut app, "someone@example.com").await;

    let status_code = helper::sign_out(&mut app, &access_token).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert!(user.is_none());

    // a fresh sign in works again
    let (status_code, access_token, _) =
        helper::maybe_sign_in(&mut app, "someone@example.com", "verysecret").await;
    assert_eq!(StatusCode::OK, status_code);

    let (status_code, _) = helper::current_user(&mut app, &access_token.unwrap()).await;
    assert_eq!(StatusCode::OK, status_code);
}

#[tokio::test]
async fn test_current_user_without_token() {
    let mut app = helper::setup_test_app().await;

    let (status_code, user) = helper::current_user(&mut app, "").await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert!(user.is_none());

    let (status_code, user) = helper::current_user(&mut app, "Bearer nope").await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
    assert!(user.is_none());
}
