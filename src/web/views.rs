use crate::session::{FieldErrors, Notice};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginView {
    pub email: String,
    pub remember_me: bool,
    pub errors: FieldErrors,
    pub notice: Option<Notice>,
}

#[derive(Template)]
#[template(path = "welcome.html")]
pub struct WelcomeView {
    pub identifier: String,
    pub notice: Option<Notice>,
}

pub fn render<T: Template>(view: &T) -> Response {
    match view.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("Failed to render template: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
