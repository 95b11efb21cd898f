//! Client session on top of the identity provider
//!
//! Keeps track of who is signed in and tells subscribers when that changes

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::Identity;
use super::IdentityProvider;
use super::Result;
use super::SignedIn;

/// A session of a single client
pub struct AuthSession {
    /// The provider doing the actual work
    provider: IdentityProvider,

    /// Current state, `None` when signed out
    state: watch::Sender<Option<SignedIn>>,
}

impl AuthSession {
    /// Create a signed out session
    pub fn new(provider: IdentityProvider) -> Self {
        let (state, _) = watch::channel(None);

        Self { provider, state }
    }

    /// Create a new user and sign in as that user
    ///
    /// # Errors
    ///
    /// Will return `Err` when the provider rejects the sign up, the session stays as is
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let signed_in = self.provider.sign_up(email, password).await?;

        Ok(self.replace(signed_in))
    }

    /// Sign in with existing credentials
    ///
    /// # Errors
    ///
    /// Will return `Err` when the provider rejects the credentials, the session stays as is
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let signed_in = self.provider.sign_in(email, password).await?;

        Ok(self.replace(signed_in))
    }

    /// Sign out
    ///
    /// The session is signed out locally even when the provider fails to end the session
    ///
    /// # Errors
    ///
    /// Will return `Err` when the provider could not end the session
    pub async fn sign_out(&self) -> Result<()> {
        let Some(identity) = self.current_user() else {
            return Ok(());
        };

        let result = self.provider.sign_out(&identity).await;

        self.state.send_replace(None);

        result
    }

    /// Who is signed in, if anyone
    pub fn current_user(&self) -> Option<Identity> {
        self.state
            .borrow()
            .as_ref()
            .map(|signed_in| signed_in.identity.clone())
    }

    /// The access token of the current session, if signed in
    pub fn access_token(&self) -> Option<String> {
        self.state
            .borrow()
            .as_ref()
            .map(|signed_in| signed_in.token.access_token.clone())
    }

    /// Get told about every change of the signed in user
    ///
    /// The callback is called right away with the current user and after that on every
    /// change. Changes in quick succession may only deliver the latest state.
    ///
    /// Needs to be called within a Tokio runtime.
    pub fn on_auth_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<Identity>) + Send + 'static,
    {
        let mut receiver = self.state.subscribe();

        let cancellation = CancellationToken::new();
        let cancelled = cancellation.clone();

        tokio::spawn(async move {
            loop {
                let identity = receiver
                    .borrow_and_update()
                    .as_ref()
                    .map(|signed_in| signed_in.identity.clone());

                callback(identity);

                tokio::select! {
                    biased;

                    () = cancelled.cancelled() => break,
                    changed = receiver.changed() => {
                        // session is gone
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Subscription { cancellation }
    }

    /// Replace the current state
    fn replace(&self, signed_in: SignedIn) -> Identity {
        let identity = signed_in.identity.clone();

        self.state.send_replace(Some(signed_in));

        identity
    }
}

/// Handle of an auth state subscription
///
/// Dropping the handle cancels the subscription as well
pub struct Subscription {
    /// Stops the listener
    cancellation: CancellationToken,
}

impl Subscription {
    /// Stop listening for changes
    pub fn cancel(self) {
        self.cancellation.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
