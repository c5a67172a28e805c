//! Guard for pages that need a signed-in user.

use super::{Route, SessionClient, Subscription};
use crate::provider::{IdentityProvider, Session};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardState {
    Unknown,
    Authenticated(Session),
    Unauthenticated,
}

/// What the guarded page should do after a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardView {
    Welcome { identifier: String },
    Redirect(Route),
}

/// Holds a subscription for as long as the guarded view is mounted. Dropping
/// the guard releases it.
pub struct SessionGuard {
    state: GuardState,
    subscription: Subscription,
}

impl SessionGuard {
    #[must_use]
    pub fn mount<P: IdentityProvider>(client: &SessionClient<P>) -> Self {
        Self {
            state: GuardState::Unknown,
            subscription: client.subscribe(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Feed one notification. Returns a navigation only when the guard enters
    /// `Unauthenticated`, so repeated sign-out notifications redirect once.
    pub fn apply(&mut self, notification: Option<Session>) -> Option<Route> {
        match notification {
            Some(session) => {
                self.state = GuardState::Authenticated(session);
                None
            }
            None if self.state == GuardState::Unauthenticated => None,
            None => {
                self.state = GuardState::Unauthenticated;
                Some(Route::Login)
            }
        }
    }

    /// Wait for the next notification and turn it into a view.
    pub async fn resolve(&mut self) -> GuardView {
        // A closed channel means the client is gone; nothing to trust.
        let notification = self.subscription.next().await.flatten();
        let navigation = self.apply(notification);

        match (&self.state, navigation) {
            (GuardState::Authenticated(session), _) => GuardView::Welcome {
                identifier: session.identifier().to_string(),
            },
            (_, Some(route)) => {
                debug!("No session, redirecting to {}", route.path());
                GuardView::Redirect(route)
            }
            (_, None) => GuardView::Redirect(Route::Login),
        }
    }
}
