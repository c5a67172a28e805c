use super::{Notice, Route, SessionClient};
use crate::provider::IdentityProvider;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub notice: Notice,
    pub redirect: Route,
}

/// Sign out and head back to the login page. A provider failure is reported
/// in the notice; the redirect happens either way and nothing is retried.
pub async fn run<P: IdentityProvider>(client: &SessionClient<P>) -> LogoutOutcome {
    let notice = match client.sign_out().await {
        Ok(()) => {
            info!("User signed out");
            Notice::success("Logged out", "Logged out successfully!")
        }
        Err(err) => {
            warn!("Sign-out failed: {err}");
            Notice::destructive("Logout Failed", &err.to_string())
        }
    };

    LogoutOutcome {
        notice,
        redirect: Route::Login,
    }
}
