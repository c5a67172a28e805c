//! Client-side session lifecycle for one browser context.
//!
//! [`SessionClient`] wraps an [`IdentityProvider`] and publishes every session
//! change on a `watch` channel. The login controller, the guard and the logout
//! action only talk to the client, never to the provider directly.

use crate::provider::{IdentityProvider, ProviderError, Session, SessionTokens, SignedIn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

pub mod guard;
pub mod login;
pub mod logout;
mod notice;

pub use guard::{GuardState, GuardView, SessionGuard};
pub use login::{Credentials, FieldErrors, LoginController, LoginOutcome, SubmitGate};
pub use notice::{Notice, NoticeKind};

/// Pages the lifecycle can send the browser to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Main,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Main => "/",
        }
    }
}

/// What subscribers observe. `Pending` is never delivered as a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    Pending,
    SignedIn(Session),
    SignedOut,
}

struct Inner<P> {
    provider: P,
    state: watch::Sender<AuthState>,
    tokens: Mutex<Option<SessionTokens>>,
}

impl<P> Inner<P> {
    fn tokens(&self) -> MutexGuard<'_, Option<SessionTokens>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Provider client for a single browser context.
pub struct SessionClient<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for SessionClient<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: IdentityProvider> SessionClient<P> {
    fn with_state(provider: P, state: AuthState, tokens: Option<SessionTokens>) -> Self {
        let (sender, _) = watch::channel(state);
        Self {
            inner: Arc::new(Inner {
                provider,
                state: sender,
                tokens: Mutex::new(tokens),
            }),
        }
    }

    /// A fresh context with no session.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self::with_state(provider, AuthState::SignedOut, None)
    }

    /// Hold a persisted handle without resolving it. Enough to sign out.
    #[must_use]
    pub fn with_handle(provider: P, tokens: Option<SessionTokens>) -> Self {
        match tokens {
            Some(tokens) => Self::with_state(provider, AuthState::Pending, Some(tokens)),
            None => Self::new(provider),
        }
    }

    /// Rebuild the context from a persisted handle. Resolution runs on its own
    /// task; subscribers learn the outcome through the channel.
    #[must_use]
    pub fn restore(provider: P, tokens: Option<SessionTokens>) -> Self {
        let client = Self::with_handle(provider, tokens.clone());
        if let Some(tokens) = tokens {
            let provider = client.inner.provider.clone();
            let lookup = tokio::spawn(async move { provider.lookup(&tokens).await });
            // A lookup that dies must still settle, or subscribers wait forever.
            let resolver = client.clone();
            tokio::spawn(async move {
                let outcome = lookup.await.unwrap_or_else(|err| {
                    warn!("Session lookup task failed: {err}");
                    Err(ProviderError::Interrupted)
                });
                resolver.settle(outcome);
            });
        }
        client
    }

    // Only a still-pending restore may settle; a sign-in or sign-out that
    // happened meanwhile wins.
    fn settle(&self, outcome: Result<SignedIn, ProviderError>) {
        let mut tokens = self.inner.tokens();
        if *self.inner.state.borrow() != AuthState::Pending {
            debug!("Session changed while restoring, dropping lookup result");
            return;
        }
        match outcome {
            Ok(SignedIn { session, tokens: fresh }) => {
                *tokens = Some(fresh);
                self.inner.state.send_replace(AuthState::SignedIn(session));
            }
            Err(err) => {
                if err.is_rejection() {
                    debug!("Provider rejected the persisted session: {err}");
                    *tokens = None;
                } else {
                    warn!("Could not reach the provider to restore the session: {err}");
                }
                self.inner.state.send_replace(AuthState::SignedOut);
            }
        }
    }

    /// # Errors
    /// Returns the provider's error untouched; the current session is kept.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ProviderError> {
        let SignedIn { session, tokens } = self
            .inner
            .provider
            .sign_in(credentials.identifier(), credentials.secret())
            .await?;

        let mut current = self.inner.tokens();
        *current = Some(tokens);
        self.inner
            .state
            .send_replace(AuthState::SignedIn(session.clone()));
        Ok(session)
    }

    /// Forget the local handle and tell the provider. The context is signed out
    /// even when the provider call fails.
    ///
    /// # Errors
    /// Returns the provider's error untouched.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        let tokens = {
            let mut current = self.inner.tokens();
            let taken = current.take();
            self.inner.state.send_replace(AuthState::SignedOut);
            taken
        };

        match tokens {
            Some(tokens) => self.inner.provider.sign_out(&tokens).await,
            None => Ok(()),
        }
    }

    /// Start listening for session changes. Dropping the subscription
    /// unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let mut receiver = self.inner.state.subscribe();
        // Deliver the current state first, like the provider SDK does.
        receiver.mark_changed();
        Subscription { receiver }
    }

    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        match &*self.inner.state.borrow() {
            AuthState::SignedIn(session) => Some(session.clone()),
            AuthState::Pending | AuthState::SignedOut => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// The handle the browser should persist now.
    #[must_use]
    pub fn tokens(&self) -> Option<SessionTokens> {
        self.inner.tokens().clone()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.state.receiver_count()
    }
}

/// A live listener on a [`SessionClient`].
pub struct Subscription {
    receiver: watch::Receiver<AuthState>,
}

impl Subscription {
    /// Wait for the next settled notification: `Some(Some(session))` when
    /// signed in, `Some(None)` when signed out, `None` once the client is gone.
    pub async fn next(&mut self) -> Option<Option<Session>> {
        loop {
            self.receiver.changed().await.ok()?;
            let state = self.receiver.borrow_and_update().clone();
            match state {
                AuthState::Pending => continue,
                AuthState::SignedIn(session) => return Some(Some(session)),
                AuthState::SignedOut => return Some(None),
            }
        }
    }
}
