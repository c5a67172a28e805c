pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::{login, login_page};

pub mod logout;
pub use self::logout::logout;

pub mod welcome;
pub use self::welcome::welcome;

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use tracing::error;

// Cookies are best effort: a value that cannot be a header is logged and
// skipped rather than failing the page.
fn append_cookie(
    headers: &mut HeaderMap,
    cookie: Result<HeaderValue, axum::http::header::InvalidHeaderValue>,
) {
    match cookie {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to build cookie: {err}"),
    }
}
