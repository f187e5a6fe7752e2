//! Login and signup against the remote auth API.

use crate::api::ApiError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::session::{Session, SessionStorage, SessionStore, StorageError};
use async_trait::async_trait;
use tracing::{error, info};

/// Shown after a successful login.
pub const LOGIN_SUCCESS_NOTICE: &str = "Login successful!";
/// Shown after any failed login; details stay in the log.
pub const LOGIN_FAILURE_NOTICE: &str = "Login failed. Please check your credentials.";
/// Shown after registration, before redirecting to login.
pub const SIGNUP_SUCCESS_NOTICE: &str = "Registration successful! Please login.";
/// Fallback when the backend rejects a signup without a message.
pub const SIGNUP_FAILURE_NOTICE: &str = "Registration failed. Please try again.";
/// Shown when the signup request never got a response.
pub const SIGNUP_ERROR_NOTICE: &str = "An error occurred during registration. Please try again.";

/// The two calls the auth forms make.
#[async_trait(?Send)]
pub trait AuthGateway {
    /// Exchanges credentials for a token and user.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
    /// Creates an account. The response body is ignored.
    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("login response is missing {0}")]
    MalformedResponse(&'static str),
    #[error("failed to store session: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Text shown to the user after a failed login. Raw details stay in the log.
    #[must_use]
    pub fn login_notice(&self) -> String {
        LOGIN_FAILURE_NOTICE.to_string()
    }

    /// Text shown to the user after a failed signup: the backend's own
    /// message when it sent one, otherwise a generic fallback.
    #[must_use]
    pub fn signup_notice(&self) -> String {
        match self {
            Self::Api(ApiError::Status { message, .. }) => message
                .clone()
                .unwrap_or_else(|| SIGNUP_FAILURE_NOTICE.to_string()),
            Self::Api(_) => SIGNUP_ERROR_NOTICE.to_string(),
            Self::MalformedResponse(_) | Self::Storage(_) => SIGNUP_FAILURE_NOTICE.to_string(),
        }
    }
}

/// Logs in and persists the resulting session.
///
/// Storage is only touched on success, so a rejected login leaves whatever
/// was stored before in place.
///
/// # Errors
/// Returns [`AuthError`] if the backend rejects the credentials, the response
/// lacks a token or username, or the session cannot be stored.
pub async fn sign_in<S, G>(
    store: &SessionStore<S>,
    gateway: &G,
    identifier: &str,
    password: &str,
) -> Result<Session, AuthError>
where
    S: SessionStorage,
    G: AuthGateway + ?Sized,
{
    let request = LoginRequest {
        identifier: identifier.to_string(),
        password: password.to_string(),
    };

    let response = gateway.login(&request).await.inspect_err(|err| {
        error!(error = %err, identifier, "login failed");
    })?;

    if response.jwt.is_empty() {
        return Err(AuthError::MalformedResponse("jwt"));
    }
    if response.user.username.is_empty() {
        return Err(AuthError::MalformedResponse("user.username"));
    }

    let session = Session::new(response.jwt, response.user.username);
    store.save(&session)?;
    info!(username = %session.username, "logged in");
    Ok(session)
}

/// Registers a new account. The caller navigates to login on success.
///
/// # Errors
/// Returns [`AuthError::Api`] when the backend rejects the registration or
/// cannot be reached.
pub async fn sign_up<G>(gateway: &G, request: &RegisterRequest) -> Result<(), AuthError>
where
    G: AuthGateway + ?Sized,
{
    gateway.register(request).await.inspect_err(|err| {
        error!(error = %err, username = %request.username, "signup failed");
    })?;
    info!(username = %request.username, "account registered");
    Ok(())
}

/// Forgets the stored session. Safe to call when nobody is logged in.
pub fn sign_out<S: SessionStorage>(store: &SessionStore<S>) {
    store.clear();
    info!("logged out");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthUser;
    use crate::session::{MemoryStorage, TOKEN_KEY, USER_KEY};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeGateway {
        login_result: Option<LoginResponse>,
        register_error: Option<(u16, Option<String>)>,
        offline: bool,
        logins: RefCell<Vec<LoginRequest>>,
    }

    #[async_trait(?Send)]
    impl AuthGateway for FakeGateway {
        async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
            self.logins.borrow_mut().push(request.clone());
            self.login_result.clone().ok_or(ApiError::Status {
                status: 400,
                message: Some("Invalid identifier or password".into()),
            })
        }

        async fn register(&self, _request: &RegisterRequest) -> Result<(), ApiError> {
            if self.offline {
                return Err(ApiError::InvalidResponse("connection reset".into()));
            }
            match &self.register_error {
                Some((status, message)) => Err(ApiError::Status {
                    status: *status,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    fn accepting(jwt: &str, username: &str) -> FakeGateway {
        FakeGateway {
            login_result: Some(LoginResponse {
                jwt: jwt.to_string(),
                user: AuthUser {
                    username: username.to_string(),
                    email: None,
                },
            }),
            ..FakeGateway::default()
        }
    }

    fn registration() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "hunter22".into(),
        }
    }

    /// Test a successful login
    #[tokio::test]
    async fn successful_login_stores_token_and_username() {
        let store = SessionStore::new(MemoryStorage::new());
        let gateway = accepting("jwt-1", "alice");

        let session = sign_in(&store, &gateway, "alice@example.com", "pw")
            .await
            .unwrap();

        assert_eq!(session, Session::new("jwt-1", "alice"));
        assert_eq!(store.storage().get(TOKEN_KEY).as_deref(), Some("jwt-1"));
        assert_eq!(store.storage().get(USER_KEY).as_deref(), Some("\"alice\""));
        assert_eq!(gateway.logins.borrow()[0].identifier, "alice@example.com");
    }

    /// A rejected login keeps the previous session.
    #[tokio::test]
    async fn rejected_login_leaves_storage_unchanged() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "old"), (USER_KEY, "\"bob\"")]);
        let store = SessionStore::new(storage);
        let gateway = FakeGateway::default();

        let err = sign_in(&store, &gateway, "alice", "wrong").await.unwrap_err();

        assert_eq!(err.login_notice(), LOGIN_FAILURE_NOTICE);
        assert_eq!(store.load(), Some(Session::new("old", "bob")));
    }

    /// An empty `jwt` is treated as a malformed response.
    #[tokio::test]
    async fn login_without_token_is_malformed() {
        let store = SessionStore::new(MemoryStorage::new());
        let gateway = accepting("", "alice");

        let err = sign_in(&store, &gateway, "alice", "pw").await.unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse("jwt")));
        assert!(store.storage().is_empty());
    }

    /// Logout removes both keys and tolerates an empty store.
    #[test]
    fn sign_out_clears_token_and_username() {
        let storage = MemoryStorage::with_entries([(TOKEN_KEY, "jwt-1"), (USER_KEY, "\"alice\"")]);
        let store = SessionStore::new(storage);

        sign_out(&store);

        assert!(store.storage().is_empty());
        assert_eq!(store.load(), None);
        sign_out(&store);
        assert!(store.storage().is_empty());
    }

    /// The backend signup message is shown unchanged.
    #[tokio::test]
    async fn signup_surfaces_backend_message_verbatim() {
        let gateway = FakeGateway {
            register_error: Some((400, Some("Email or Username are already taken".into()))),
            ..FakeGateway::default()
        };

        let err = sign_up(&gateway, &registration()).await.unwrap_err();

        assert_eq!(err.signup_notice(), "Email or Username are already taken");
    }

    /// Test the generic signup failure notice
    #[tokio::test]
    async fn signup_without_backend_message_uses_fallback() {
        let gateway = FakeGateway {
            register_error: Some((500, None)),
            ..FakeGateway::default()
        };

        let err = sign_up(&gateway, &registration()).await.unwrap_err();

        assert_eq!(err.signup_notice(), SIGNUP_FAILURE_NOTICE);
    }

    /// Transport failures get the signup error notice.
    #[tokio::test]
    async fn signup_unreachable_backend_uses_error_notice() {
        let gateway = FakeGateway {
            offline: true,
            ..FakeGateway::default()
        };

        let err = sign_up(&gateway, &registration()).await.unwrap_err();

        assert_eq!(err.signup_notice(), SIGNUP_ERROR_NOTICE);
        assert!(sign_up(&FakeGateway::default(), &registration()).await.is_ok());
    }
}
