use crate::storage::session_store;
use shared::session::{Session, SessionValidity};
use yewdux::{Context, Store};

/// Session context visible to every route.
///
/// `validity` starts as `Pending` and is settled by the validator in
/// [`crate::app::App`] whenever the token changes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AppState {
    pub session: Option<Session>,
    pub validity: SessionValidity,
}

impl AppState {
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.username.as_str())
    }

    /// Applies a validation result unless the token changed while it ran.
    pub fn settle(&mut self, checked_token: Option<&str>, validity: SessionValidity) {
        if self.token() != checked_token {
            log::debug!("discarding stale session validation");
            return;
        }
        if !validity.is_valid() {
            self.session = None;
        }
        self.validity = validity;
    }

    /// Installs a freshly issued session; the validator confirms it.
    pub fn signed_in(&mut self, session: Session) {
        self.session = Some(session);
        self.validity = SessionValidity::Pending;
    }
}

impl Store for AppState {
    fn new(_cx: &Context) -> Self {
        Self {
            session: session_store().load(),
            validity: SessionValidity::Pending,
        }
    }

    fn should_notify(&self, old: &Self) -> bool {
        self != old
    }
}
