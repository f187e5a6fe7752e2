pub mod app_state;
pub mod chat_feed;
