//! The hosted identity provider this crate delegates every trust decision to.
//!
//! [`IdentityProvider`] is the seam: production uses [`IdentityToolkit`], tests
//! swap in an in-memory provider. Implementations own token issuance, refresh
//! and validation; callers only ever see a [`Session`] or a [`ProviderError`].

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future};

mod error;
mod identity_toolkit;

pub use error::ProviderError;
pub use identity_toolkit::{
    IdentityToolkit, IdentityToolkitConfig, DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL,
};

/// The provider's opaque session handle, as persisted by the browser.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub id_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionTokens")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// What this crate reads from a provider session: who is signed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    identifier: String,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            identifier: identifier.into(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The email the user signed in with.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// A resolved session together with the handle that proves it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedIn {
    pub session: Session,
    pub tokens: SessionTokens,
}

pub trait IdentityProvider: Clone + Send + Sync + 'static {
    /// Exchange an email and password for a provider session.
    fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<SignedIn, ProviderError>> + Send;

    /// Resolve a persisted handle. The returned tokens may differ from the
    /// input when the provider had to refresh an expired id token.
    fn lookup(
        &self,
        tokens: &SessionTokens,
    ) -> impl Future<Output = Result<SignedIn, ProviderError>> + Send;

    /// Release the handle on the provider side, if the provider needs to know.
    fn sign_out(
        &self,
        tokens: &SessionTokens,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

#[cfg(test)]
pub(crate) mod fake;
