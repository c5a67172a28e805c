//! Cookies that stand in for the provider SDK's browser storage.
//!
//! `sesame_session` carries the provider handle, `sesame_notice` carries a
//! notice across one redirect. Both values are URL-safe base64 of JSON so they
//! never need quoting. `sesame_browser` is a random ULID naming the browser
//! before it has a session.

use super::state::CookieConfig;
use crate::provider::SessionTokens;
use crate::session::Notice;
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

pub const SESSION_COOKIE_NAME: &str = "sesame_session";
pub const NOTICE_COOKIE_NAME: &str = "sesame_notice";
pub const BROWSER_COOKIE_NAME: &str = "sesame_browser";
const NOTICE_TTL_SECONDS: i64 = 60;

/// What the browser keeps between requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub tokens: SessionTokens,
    /// Chosen at sign-in; decides between a persistent and a session cookie.
    pub remember: bool,
}

fn encode<T: Serialize>(value: &T) -> Option<String> {
    let json = serde_json::to_vec(value).ok()?;
    Some(Base64UrlUnpadded::encode_string(&json))
}

fn decode<T: DeserializeOwned>(value: &str) -> Option<T> {
    let json = Base64UrlUnpadded::decode_vec(value).ok()?;
    serde_json::from_slice(&json).ok()
}

pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == name {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

fn cookie(
    config: &CookieConfig,
    name: &str,
    value: &str,
    max_age: Option<i64>,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(seconds) = max_age {
        cookie.push_str(&format!("; Max-Age={seconds}"));
    }
    if config.secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// The persisted handle, if the browser sent a readable one.
#[must_use]
pub fn persisted_session(headers: &HeaderMap) -> Option<PersistedSession> {
    let raw = read_cookie(headers, SESSION_COOKIE_NAME)?;
    let persisted = decode(&raw);
    if persisted.is_none() {
        debug!("Ignoring unreadable session cookie");
    }
    persisted
}

/// Persist the handle. Without `remember` the cookie has no `Max-Age` and the
/// browser drops it when it closes.
///
/// # Errors
/// Returns an error if the cookie is not a valid header value.
pub fn session_cookie(
    config: &CookieConfig,
    persisted: &PersistedSession,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let value = encode(persisted).unwrap_or_default();
    let max_age = persisted.remember.then(|| config.remember_ttl_seconds());
    cookie(config, SESSION_COOKIE_NAME, &value, max_age)
}

/// # Errors
/// Returns an error if the cookie is not a valid header value.
pub fn clear_session_cookie(config: &CookieConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(config, SESSION_COOKIE_NAME, "", Some(0))
}

/// The browser id, if the browser sent a well-formed one.
#[must_use]
pub fn browser_id(headers: &HeaderMap) -> Option<String> {
    let raw = read_cookie(headers, BROWSER_COOKIE_NAME)?;
    Ulid::from_string(&raw).ok().map(|id| id.to_string())
}

/// Lives as long as the browser session.
///
/// # Errors
/// Returns an error if the cookie is not a valid header value.
pub fn browser_cookie(config: &CookieConfig, id: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(config, BROWSER_COOKIE_NAME, id, None)
}

/// A notice pending display, if any.
#[must_use]
pub fn pending_notice(headers: &HeaderMap) -> Option<Notice> {
    read_cookie(headers, NOTICE_COOKIE_NAME).and_then(|raw| decode(&raw))
}

/// # Errors
/// Returns an error if the cookie is not a valid header value.
pub fn notice_cookie(config: &CookieConfig, notice: &Notice) -> Result<HeaderValue, InvalidHeaderValue> {
    let value = encode(notice).unwrap_or_default();
    cookie(config, NOTICE_COOKIE_NAME, &value, Some(NOTICE_TTL_SECONDS))
}

/// # Errors
/// Returns an error if the cookie is not a valid header value.
pub fn clear_notice_cookie(config: &CookieConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(config, NOTICE_COOKIE_NAME, "", Some(0))
}
