//! `GET /login` and `POST /login`.

use super::append_cookie;
use crate::provider::IdentityProvider;
use crate::session::{
    login::FALLBACK_FAILURE_MESSAGE, FieldErrors, LoginController, LoginOutcome, Notice,
    SessionClient,
};
use crate::web::{
    cookies::{self, PersistedSession},
    state::{AppState, CookieConfig},
    views::{render, LoginView},
};
use axum::{
    extract::{Form, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, instrument};
use ulid::Ulid;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default = "empty_secret")]
    password: SecretString,
    /// Checkboxes are only submitted when ticked.
    #[serde(default)]
    remember_me: Option<String>,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

// Every browser that reaches the form gets an id, so concurrent sign-ins are
// only ever held back within the same browser.
fn browser_id(headers: &HeaderMap, config: &CookieConfig, response_headers: &mut HeaderMap) -> String {
    if let Some(id) = cookies::browser_id(headers) {
        return id;
    }
    let id = Ulid::new().to_string();
    append_cookie(response_headers, cookies::browser_cookie(config, &id));
    id
}

pub async fn login_page<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Response {
    let notice = cookies::pending_notice(&headers);

    let mut response_headers = HeaderMap::new();
    browser_id(&headers, state.cookies(), &mut response_headers);
    if notice.is_some() {
        append_cookie(
            &mut response_headers,
            cookies::clear_notice_cookie(state.cookies()),
        );
    }

    let view = LoginView {
        notice,
        ..LoginView::default()
    };
    (response_headers, render(&view)).into_response()
}

#[instrument(skip_all)]
pub async fn login<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut response_headers = HeaderMap::new();
    let browser = browser_id(&headers, state.cookies(), &mut response_headers);

    // Signing in starts a fresh context; a previous session is replaced.
    let client = SessionClient::new(state.provider());
    let controller = LoginController::new(client.clone(), state.gate().clone(), browser);
    let remember_me = form.remember_me.is_some();

    let outcome = controller
        .submit(&form.email, form.password, remember_me)
        .await;

    let form_view = |errors: FieldErrors, notice: Option<Notice>| LoginView {
        email: form.email.clone(),
        remember_me,
        errors,
        notice,
    };

    match outcome {
        LoginOutcome::Invalid(errors) => {
            (response_headers, render(&form_view(errors, None))).into_response()
        }
        LoginOutcome::Busy(notice) | LoginOutcome::Failed(notice) => (
            response_headers,
            render(&form_view(FieldErrors::default(), Some(notice))),
        )
            .into_response(),
        LoginOutcome::SignedIn {
            remember,
            notice,
            redirect,
            ..
        } => {
            let Some(tokens) = client.tokens() else {
                error!("Provider accepted the credentials but left no session handle");
                let notice = Notice::destructive("Login Failed", FALLBACK_FAILURE_MESSAGE);
                return (
                    response_headers,
                    render(&form_view(FieldErrors::default(), Some(notice))),
                )
                    .into_response();
            };

            append_cookie(
                &mut response_headers,
                cookies::session_cookie(state.cookies(), &PersistedSession { tokens, remember }),
            );
            append_cookie(
                &mut response_headers,
                cookies::notice_cookie(state.cookies(), &notice),
            );
            (response_headers, Redirect::to(redirect.path())).into_response()
        }
    }
}
