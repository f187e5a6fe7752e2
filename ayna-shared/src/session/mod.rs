//! Session persistence and token validation.
//!
//! The store keeps exactly two entries: `token` (raw string) and `user`
//! (JSON-encoded username). Anything short of both counts as logged out.

mod storage;

pub use storage::{MemoryStorage, SessionStorage, StorageError};

use crate::api::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-encoded username.
pub const USER_KEY: &str = "user";

/// An authenticated identity: bearer token plus the username it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub token: String,
    /// Display name used as the sender of outgoing messages.
    pub username: String,
}

impl Session {
    /// Builds a session from a token and username.
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }
}

/// Outcome of checking the stored token against the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SessionValidity {
    /// A credential check is in flight.
    #[default]
    Pending,
    /// The backend accepted the stored token.
    Valid,
    /// No session is stored, or the backend rejected it.
    Invalid,
}

impl SessionValidity {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Reads and writes the [`Session`] through an injected [`SessionStorage`].
#[derive(Debug, Clone, Default)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: SessionStorage> SessionStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Loads the persisted session.
    ///
    /// A partial or corrupt session (missing token, missing user, or a user
    /// entry that is not a JSON string) is cleared and reported as `None`.
    pub fn load(&self) -> Option<Session> {
        let token = self
            .storage
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty());
        let username = self
            .storage
            .get(USER_KEY)
            .and_then(|raw| serde_json::from_str::<String>(&raw).ok())
            .filter(|name| !name.is_empty());

        match (token, username) {
            (Some(token), Some(username)) => Some(Session { token, username }),
            (None, None) => None,
            _ => {
                debug!("discarding incomplete stored session");
                self.clear();
                None
            }
        }
    }

    /// Persists both halves of the session.
    ///
    /// # Errors
    /// Returns [`StorageError`] if either entry cannot be written; in that case
    /// nothing is left behind.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.username).map_err(|err| StorageError::Write {
            key: USER_KEY.to_string(),
            reason: err.to_string(),
        })?;
        let written = self
            .storage
            .set(TOKEN_KEY, &session.token)
            .and_then(|()| self.storage.set(USER_KEY, &user));
        if written.is_err() {
            self.clear();
        }
        written
    }

    /// Removes both entries. Safe to call when nothing is stored.
    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
    }

    /// The raw stored token, if any.
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }
}

/// Confirms a bearer token with the backend identity endpoint.
#[async_trait(?Send)]
pub trait IdentityVerifier {
    /// # Errors
    /// Any error means the token must be treated as invalid.
    async fn verify_token(&self, token: &str) -> Result<(), ApiError>;
}

/// Checks the stored session once; clears it on any failure.
///
/// No stored session means no network call. There is no retry: a transport
/// error demotes the session exactly like a rejected token.
pub async fn validate_session<S, V>(store: &SessionStore<S>, verifier: &V) -> SessionValidity
where
    S: SessionStorage,
    V: IdentityVerifier + ?Sized,
{
    let Some(session) = store.load() else {
        store.clear();
        debug!("no stored session to validate");
        return SessionValidity::Invalid;
    };

    match verifier.verify_token(&session.token).await {
        Ok(()) => {
            debug!(username = %session.username, "stored token accepted");
            SessionValidity::Valid
        }
        Err(err) => {
            warn!(error = %err, "token validation failed; clearing session");
            store.clear();
            SessionValidity::Invalid
        }
    }
}
