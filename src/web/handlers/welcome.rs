//! `GET /`, the guarded landing page.

use super::append_cookie;
use crate::provider::IdentityProvider;
use crate::session::{GuardView, SessionClient, SessionGuard};
use crate::web::{
    cookies::{self, PersistedSession},
    state::AppState,
    views::{render, WelcomeView},
};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, instrument};

#[instrument(skip_all)]
pub async fn welcome<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Response {
    let persisted = cookies::persisted_session(&headers);
    let client = SessionClient::restore(
        state.provider(),
        persisted.as_ref().map(|p| p.tokens.clone()),
    );

    let view = {
        let mut guard = SessionGuard::mount(&client);
        guard.resolve().await
    };

    let mut response_headers = HeaderMap::new();

    // Keep the browser's copy of the handle in step with the provider.
    if let Some(persisted) = persisted {
        match client.tokens() {
            Some(tokens) if tokens != persisted.tokens => {
                debug!("Provider refreshed the session handle");
                append_cookie(
                    &mut response_headers,
                    cookies::session_cookie(
                        state.cookies(),
                        &PersistedSession {
                            tokens,
                            remember: persisted.remember,
                        },
                    ),
                );
            }
            Some(_) => {}
            None => append_cookie(
                &mut response_headers,
                cookies::clear_session_cookie(state.cookies()),
            ),
        }
    }

    match view {
        GuardView::Welcome { identifier } => {
            let notice = cookies::pending_notice(&headers);
            if notice.is_some() {
                append_cookie(
                    &mut response_headers,
                    cookies::clear_notice_cookie(state.cookies()),
                );
            }
            (response_headers, render(&WelcomeView { identifier, notice })).into_response()
        }
        GuardView::Redirect(route) => {
            (response_headers, Redirect::to(route.path())).into_response()
        }
    }
}
