mod chat;
mod login;
mod signup;

pub use chat::ChatPage;
pub use login::LoginPage;
pub use signup::SignUpPage;
