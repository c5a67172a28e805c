//! In-memory provider with call counters, shared by the session and web tests.

use super::{IdentityProvider, ProviderError, Session, SessionTokens, SignedIn};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::sync::Notify;

pub(crate) const EMAIL: &str = "alice@example.com";
pub(crate) const PASSWORD: &str = "correct horse";

#[derive(Default)]
struct Calls {
    sign_in: AtomicUsize,
    lookup: AtomicUsize,
    sign_out: AtomicUsize,
}

#[derive(Default)]
struct Script {
    sign_in_error: Option<String>,
    sign_in_unreachable: bool,
    sign_out_error: Option<String>,
    lookup_error: Option<String>,
    lookup_unreachable: bool,
    lookup_panics: bool,
    refreshed: Option<SessionTokens>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeProvider {
    calls: Arc<Calls>,
    script: Arc<Mutex<Script>>,
    sign_in_gate: Option<Arc<Notify>>,
}

pub(crate) fn tokens() -> SessionTokens {
    SessionTokens {
        id_token: "id-1".to_string(),
        refresh_token: "refresh-1".to_string(),
    }
}

pub(crate) fn signed_in(tokens: SessionTokens) -> SignedIn {
    SignedIn {
        session: Session::new("uid-alice", EMAIL),
        tokens,
    }
}

impl FakeProvider {
    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every sign-in fails with the given provider message.
    pub(crate) fn rejecting_sign_in(self, message: &str) -> Self {
        self.script().sign_in_error = Some(message.to_string());
        self
    }

    pub(crate) fn unreachable_sign_in(self) -> Self {
        self.script().sign_in_unreachable = true;
        self
    }

    pub(crate) fn rejecting_sign_out(self, message: &str) -> Self {
        self.script().sign_out_error = Some(message.to_string());
        self
    }

    pub(crate) fn rejecting_lookup(self, message: &str) -> Self {
        self.script().lookup_error = Some(message.to_string());
        self
    }

    pub(crate) fn unreachable_lookup(self) -> Self {
        self.script().lookup_unreachable = true;
        self
    }

    /// The lookup task dies instead of answering.
    pub(crate) fn panicking_lookup(self) -> Self {
        self.script().lookup_panics = true;
        self
    }

    /// Lookups answer with these tokens, as if the provider refreshed them.
    pub(crate) fn refreshing_to(self, tokens: SessionTokens) -> Self {
        self.script().refreshed = Some(tokens);
        self
    }

    /// Sign-in calls park until the returned notifier is triggered.
    pub(crate) fn with_sign_in_gate(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.sign_in_gate = Some(gate.clone());
        (self, gate)
    }

    pub(crate) fn sign_in_calls(&self) -> usize {
        self.calls.sign_in.load(Ordering::SeqCst)
    }

    pub(crate) fn lookup_calls(&self) -> usize {
        self.calls.lookup.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_out_calls(&self) -> usize {
        self.calls.sign_out.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for FakeProvider {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<SignedIn, ProviderError> {
        self.calls.sign_in.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.sign_in_gate {
            gate.notified().await;
        }
        if self.script().sign_in_unreachable {
            return Err(ProviderError::Status(503));
        }
        if let Some(message) = self.script().sign_in_error.clone() {
            return Err(ProviderError::rejected(&message));
        }
        if email != EMAIL || password.expose_secret() != PASSWORD {
            return Err(ProviderError::rejected("INVALID_LOGIN_CREDENTIALS"));
        }
        Ok(signed_in(tokens()))
    }

    async fn lookup(&self, tokens: &SessionTokens) -> Result<SignedIn, ProviderError> {
        self.calls.lookup.fetch_add(1, Ordering::SeqCst);
        let script = self.script();
        if script.lookup_panics {
            drop(script);
            panic!("lookup failed hard");
        }
        if script.lookup_unreachable {
            return Err(ProviderError::Status(503));
        }
        if let Some(message) = &script.lookup_error {
            return Err(ProviderError::rejected(message));
        }
        Ok(signed_in(
            script.refreshed.clone().unwrap_or_else(|| tokens.clone()),
        ))
    }

    async fn sign_out(&self, _tokens: &SessionTokens) -> Result<(), ProviderError> {
        self.calls.sign_out.fetch_add(1, Ordering::SeqCst);
        match self.script().sign_out_error.clone() {
            Some(message) => Err(ProviderError::rejected(&message)),
            None => Ok(()),
        }
    }
}
