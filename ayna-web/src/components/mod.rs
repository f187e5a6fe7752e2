pub(crate) mod composer;
pub(crate) mod loading;
pub(crate) mod message_list;

pub use composer::Composer;
pub use loading::Loading;
pub use message_list::MessageList;
