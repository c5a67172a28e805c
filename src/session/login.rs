//! Login form controller.
//!
//! Input is checked locally first; only well-formed credentials reach the
//! provider. Provider failures come back as a destructive notice that never
//! says which field was wrong.

use super::{Notice, Route, SessionClient};
use crate::provider::{IdentityProvider, Session};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::{info, instrument, warn};

pub const MIN_SECRET_LEN: usize = 8;
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const SHORT_SECRET_MESSAGE: &str = "Password must be at least 8 characters";
pub const FALLBACK_FAILURE_MESSAGE: &str = "Invalid credentials. Please try again.";
pub const UNAVAILABLE_MESSAGE: &str = "Could not reach the sign-in service. Please try again.";

/// Basic email shape check on already-trimmed input.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Per-field validation messages. Empty means the input is well-formed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub identifier: Option<&'static str>,
    pub secret: Option<&'static str>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifier.is_none() && self.secret.is_none()
    }
}

/// One submission of the login form. Dropped once the attempt is over.
pub struct Credentials {
    identifier: String,
    secret: SecretString,
    remember: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .field("remember", &self.remember)
            .finish()
    }
}

impl Credentials {
    /// # Errors
    /// Returns the field messages when the identifier is not email-shaped or the
    /// secret is shorter than [`MIN_SECRET_LEN`] characters.
    pub fn parse(identifier: &str, secret: SecretString, remember: bool) -> Result<Self, FieldErrors> {
        let identifier = identifier.trim();
        let mut errors = FieldErrors::default();

        if !valid_email(identifier) {
            errors.identifier = Some(INVALID_EMAIL_MESSAGE);
        }
        if secret.expose_secret().chars().count() < MIN_SECRET_LEN {
            errors.secret = Some(SHORT_SECRET_MESSAGE);
        }

        if errors.is_empty() {
            Ok(Self {
                identifier: identifier.to_string(),
                secret,
                remember,
            })
        } else {
            Err(errors)
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn remember(&self) -> bool {
        self.remember
    }
}

/// Tracks sign-in attempts that are still waiting on the provider, keyed by
/// the browser that submitted them.
#[derive(Clone, Debug, Default)]
pub struct SubmitGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SubmitGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another attempt from the same browser is outstanding.
    #[must_use]
    pub fn try_acquire(&self, browser: &str) -> Option<SubmitPermit> {
        let key = browser.to_string();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.insert(key.clone()) {
            Some(SubmitPermit {
                gate: self.clone(),
                key,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_pending(&self, browser: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(browser)
    }
}

/// Released on drop, whatever the outcome of the attempt.
#[derive(Debug)]
pub struct SubmitPermit {
    gate: SubmitGate,
    key: String,
}

impl Drop for SubmitPermit {
    fn drop(&mut self) {
        self.gate
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Rejected locally; the provider was not called.
    Invalid(FieldErrors),
    /// Another attempt from the same browser is outstanding.
    Busy(Notice),
    /// The provider refused; stay on the login view.
    Failed(Notice),
    SignedIn {
        session: Session,
        remember: bool,
        notice: Notice,
        redirect: Route,
    },
}

pub struct LoginController<P> {
    client: SessionClient<P>,
    gate: SubmitGate,
    browser: String,
}

impl<P: IdentityProvider> LoginController<P> {
    /// `browser` identifies the submitting browser; only its own attempts
    /// hold each other back.
    #[must_use]
    pub fn new(client: SessionClient<P>, gate: SubmitGate, browser: impl Into<String>) -> Self {
        Self {
            client,
            gate,
            browser: browser.into(),
        }
    }

    #[instrument(skip(self, secret))]
    pub async fn submit(&self, identifier: &str, secret: SecretString, remember: bool) -> LoginOutcome {
        let credentials = match Credentials::parse(identifier, secret, remember) {
            Ok(credentials) => credentials,
            Err(errors) => return LoginOutcome::Invalid(errors),
        };

        let Some(_permit) = self.gate.try_acquire(&self.browser) else {
            warn!("Sign-in already in progress");
            return LoginOutcome::Busy(Notice::destructive(
                "Sign-in already in progress",
                "Please wait for the current attempt to finish.",
            ));
        };

        match self.client.sign_in(&credentials).await {
            Ok(session) => {
                info!("User signed in: {}", session.user_id());
                LoginOutcome::SignedIn {
                    session,
                    remember: credentials.remember(),
                    notice: Notice::success("Success!", "You have successfully logged in."),
                    redirect: Route::Main,
                }
            }
            Err(err) => {
                warn!("Sign-in failed: {err}");
                let description = err.user_message().unwrap_or_else(|| {
                    if err.is_rejection() {
                        FALLBACK_FAILURE_MESSAGE.to_string()
                    } else {
                        UNAVAILABLE_MESSAGE.to_string()
                    }
                });
                LoginOutcome::Failed(Notice::destructive("Login Failed", &description))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::{self, FakeProvider};
    use crate::session::AuthState;
    use anyhow::{bail, Result};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn controller(provider: &FakeProvider) -> (LoginController<FakeProvider>, SessionClient<FakeProvider>) {
        let client = SessionClient::new(provider.clone());
        (
            LoginController::new(client.clone(), SubmitGate::new(), "browser-a"),
            client,
        )
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_bad_shapes() {
        for email in ["", "plain", "@example.com", "a@b", "a b@example.com", "a@exa mple.com"] {
            assert!(!valid_email(email), "{email:?} should be rejected");
        }
    }

    #[test]
    fn parse_trims_identifier() -> Result<()> {
        let credentials = Credentials::parse("  alice@example.com ", secret("12345678"), true)
            .map_err(|errors| anyhow::anyhow!("{errors:?}"))?;
        assert_eq!(credentials.identifier(), "alice@example.com");
        assert!(credentials.remember());
        Ok(())
    }

    #[test]
    fn parse_reports_both_fields() {
        let Err(errors) = Credentials::parse("nope", secret("short"), false) else {
            panic!("parse should fail");
        };
        assert_eq!(errors.identifier, Some(INVALID_EMAIL_MESSAGE));
        assert_eq!(errors.secret, Some(SHORT_SECRET_MESSAGE));
    }

    #[test]
    fn secret_length_counts_characters() {
        // 7 characters, more than 8 bytes
        assert!(Credentials::parse("a@example.com", secret("ééééééé"), false).is_err());
        assert!(Credentials::parse("a@example.com", secret("éééééééé"), false).is_ok());
    }

    #[test]
    fn credentials_debug_hides_secret() -> Result<()> {
        let credentials = Credentials::parse("a@example.com", secret("hunter2hunter2"), false)
            .map_err(|errors| anyhow::anyhow!("{errors:?}"))?;
        assert!(!format!("{credentials:?}").contains("hunter2"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_identifiers_never_reach_provider() {
        let provider = FakeProvider::default();
        let (controller, _) = controller(&provider);

        for identifier in ["", "alice", "alice@", "alice@example", "@example.com", "al ice@example.com"] {
            let outcome = controller.submit(identifier, secret(fake::PASSWORD), false).await;
            match outcome {
                LoginOutcome::Invalid(errors) => {
                    assert_eq!(errors.identifier, Some(INVALID_EMAIL_MESSAGE));
                }
                other => panic!("{identifier:?} should be rejected locally, got {other:?}"),
            }
        }

        assert_eq!(provider.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn short_secrets_never_reach_provider() {
        let provider = FakeProvider::default();
        let (controller, _) = controller(&provider);

        for length in 0..MIN_SECRET_LEN {
            let outcome = controller
                .submit(fake::EMAIL, secret(&"x".repeat(length)), false)
                .await;
            match outcome {
                LoginOutcome::Invalid(errors) => {
                    assert_eq!(errors.identifier, None);
                    assert_eq!(errors.secret, Some(SHORT_SECRET_MESSAGE));
                }
                other => panic!("length {length} should be rejected locally, got {other:?}"),
            }
        }

        assert_eq!(provider.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn success_navigates_to_main_once() -> Result<()> {
        let provider = FakeProvider::default();
        let (controller, client) = controller(&provider);

        let outcome = controller.submit(fake::EMAIL, secret(fake::PASSWORD), true).await;

        let LoginOutcome::SignedIn {
            session,
            remember,
            notice,
            redirect,
        } = outcome
        else {
            bail!("expected a signed-in outcome, got {outcome:?}");
        };
        assert_eq!(redirect, Route::Main);
        assert_eq!(session.identifier(), fake::EMAIL);
        assert!(remember);
        assert_eq!(notice.title, "Success!");
        assert!(!notice.is_destructive());
        assert_eq!(provider.sign_in_calls(), 1);
        assert_eq!(client.state(), AuthState::SignedIn(session));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_hides_which_field() -> Result<()> {
        let provider = FakeProvider::default();
        let (controller, client) = controller(&provider);

        let outcome = controller
            .submit(fake::EMAIL, secret("not the password"), false)
            .await;

        let LoginOutcome::Failed(notice) = outcome else {
            bail!("expected a failure, got {outcome:?}");
        };
        assert!(notice.is_destructive());
        assert_eq!(notice.title, "Login Failed");
        assert_eq!(notice.description, FALLBACK_FAILURE_MESSAGE);
        assert_eq!(client.state(), AuthState::SignedOut);
        Ok(())
    }

    #[tokio::test]
    async fn provider_message_is_passed_through() -> Result<()> {
        let provider = FakeProvider::default().rejecting_sign_in(
            "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled.",
        );
        let (controller, _) = controller(&provider);

        let outcome = controller.submit(fake::EMAIL, secret(fake::PASSWORD), false).await;

        let LoginOutcome::Failed(notice) = outcome else {
            bail!("expected a failure, got {outcome:?}");
        };
        assert_eq!(
            notice.description,
            "Access to this account has been temporarily disabled."
        );
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_provider_is_not_blamed_on_credentials() -> Result<()> {
        let provider = FakeProvider::default().unreachable_sign_in();
        let (controller, client) = controller(&provider);

        let outcome = controller.submit(fake::EMAIL, secret(fake::PASSWORD), false).await;

        let LoginOutcome::Failed(notice) = outcome else {
            bail!("expected a failure, got {outcome:?}");
        };
        assert_eq!(notice.title, "Login Failed");
        assert_eq!(notice.description, UNAVAILABLE_MESSAGE);
        assert_eq!(client.state(), AuthState::SignedOut);
        Ok(())
    }

    async fn wait_for(condition: impl Fn() -> bool) -> Result<()> {
        timeout(Duration::from_secs(1), async {
            while !condition() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn resubmission_from_same_browser_is_refused() -> Result<()> {
        let (provider, release) = FakeProvider::default().with_sign_in_gate();
        let gate = SubmitGate::new();
        let first = LoginController::new(SessionClient::new(provider.clone()), gate.clone(), "browser-a");
        let second = LoginController::new(SessionClient::new(provider.clone()), gate.clone(), "browser-a");

        let pending = tokio::spawn(async move {
            first.submit(fake::EMAIL, secret(fake::PASSWORD), false).await
        });
        wait_for(|| gate.is_pending("browser-a")).await?;

        let outcome = second.submit(fake::EMAIL, secret(fake::PASSWORD), false).await;
        assert!(matches!(outcome, LoginOutcome::Busy(_)));

        release.notify_one();
        let outcome = timeout(Duration::from_secs(1), pending).await??;
        assert!(matches!(outcome, LoginOutcome::SignedIn { .. }));
        assert_eq!(provider.sign_in_calls(), 1);
        assert!(!gate.is_pending("browser-a"));
        Ok(())
    }

    #[tokio::test]
    async fn other_browser_is_not_held_back() -> Result<()> {
        let (provider, release) = FakeProvider::default().with_sign_in_gate();
        let gate = SubmitGate::new();
        let first = LoginController::new(SessionClient::new(provider.clone()), gate.clone(), "browser-a");
        let second = LoginController::new(SessionClient::new(provider.clone()), gate.clone(), "browser-b");

        let first = tokio::spawn(async move {
            first.submit(fake::EMAIL, secret(fake::PASSWORD), false).await
        });
        wait_for(|| gate.is_pending("browser-a")).await?;

        // Same account, different browser.
        let second = tokio::spawn(async move {
            second.submit(fake::EMAIL, secret(fake::PASSWORD), false).await
        });
        wait_for(|| provider.sign_in_calls() == 2).await?;
        assert!(gate.is_pending("browser-b"));

        release.notify_waiters();
        let first = timeout(Duration::from_secs(1), first).await??;
        let second = timeout(Duration::from_secs(1), second).await??;
        assert!(matches!(first, LoginOutcome::SignedIn { .. }));
        assert!(matches!(second, LoginOutcome::SignedIn { .. }));
        assert!(!gate.is_pending("browser-a"));
        assert!(!gate.is_pending("browser-b"));
        Ok(())
    }

    #[tokio::test]
    async fn permit_is_released_after_failure() {
        let provider = FakeProvider::default().rejecting_sign_in("USER_DISABLED");
        let gate = SubmitGate::new();
        let controller = LoginController::new(SessionClient::new(provider.clone()), gate.clone(), "browser-a");

        let first = controller.submit(fake::EMAIL, secret(fake::PASSWORD), false).await;
        let second = controller.submit(fake::EMAIL, secret(fake::PASSWORD), false).await;

        assert!(matches!(first, LoginOutcome::Failed(_)));
        assert!(matches!(second, LoginOutcome::Failed(_)));
        assert_eq!(provider.sign_in_calls(), 2);
    }
}
