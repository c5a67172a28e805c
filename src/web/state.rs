//! Shared handler state and cookie settings.

use crate::session::SubmitGate;

const DEFAULT_REMEMBER_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct CookieConfig {
    remember_ttl_seconds: i64,
    secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            remember_ttl_seconds: DEFAULT_REMEMBER_TTL_SECONDS,
            secure: false,
        }
    }
}

impl CookieConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_remember_ttl_seconds(mut self, seconds: i64) -> Self {
        self.remember_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn remember_ttl_seconds(&self) -> i64 {
        self.remember_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }
}

#[derive(Clone)]
pub struct AppState<P> {
    provider: P,
    gate: SubmitGate,
    cookies: CookieConfig,
}

impl<P: Clone> AppState<P> {
    #[must_use]
    pub fn new(provider: P, cookies: CookieConfig) -> Self {
        Self {
            provider,
            gate: SubmitGate::new(),
            cookies,
        }
    }

    /// Each request gets its own copy, bound to that browser's context.
    #[must_use]
    pub fn provider(&self) -> P {
        self.provider.clone()
    }

    #[must_use]
    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieConfig {
        &self.cookies
    }
}
