//! `POST /logout`.

use super::append_cookie;
use crate::provider::IdentityProvider;
use crate::session::{self, SessionClient};
use crate::web::{cookies, state::AppState};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn logout<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Response {
    let tokens = cookies::persisted_session(&headers).map(|persisted| persisted.tokens);
    let client = SessionClient::with_handle(state.provider(), tokens);

    let outcome = session::logout::run(&client).await;

    // Always clear the cookie, even if the provider call failed.
    let mut response_headers = HeaderMap::new();
    append_cookie(
        &mut response_headers,
        cookies::clear_session_cookie(state.cookies()),
    );
    append_cookie(
        &mut response_headers,
        cookies::notice_cookie(state.cookies(), &outcome.notice),
    );

    (response_headers, Redirect::to(outcome.redirect.path())).into_response()
}
