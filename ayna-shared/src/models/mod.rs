//! Wire and view models shared by the web and terminal clients.

pub mod auth;
pub mod chat;
pub mod errors;

pub use auth::{AuthUser, LoginRequest, LoginResponse, RegisterRequest};
pub use chat::{
    ChatMessage, CreateMessageRequest, MessageListResponse, MessageOrigin, MessagePayload,
    MessageRecord, RelayInbound, RelayOutbound,
};
pub use errors::{BackendError, ErrorEnvelope};
