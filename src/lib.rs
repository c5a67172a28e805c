//! # Sesame (sign-in front-end)
//!
//! `sesame` serves a login form, a protected landing page and a logout action.
//! Every credential decision is delegated to a hosted identity provider
//! (Firebase Authentication through its public REST endpoints); this crate
//! never verifies a password or a token on its own.
//!
//! ## Session lifecycle
//!
//! A browser context owns at most one provider session. The provider's opaque
//! handle (id token + refresh token) is persisted in an `HttpOnly` cookie, the
//! same way the provider's browser SDK keeps it in browser storage:
//!
//! - **Remember me:** the cookie carries a `Max-Age` and survives restarts.
//! - **Otherwise:** the cookie lives for the browser session only.
//!
//! On each request the handle is turned back into a [`session::SessionClient`],
//! which resolves it through the provider and publishes the result to its
//! subscribers. The guarded page treats that notification as the only source
//! of truth.

pub mod cli;
pub mod provider;
pub mod session;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
