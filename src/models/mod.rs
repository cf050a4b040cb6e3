pub mod backend;
pub mod chat;
pub mod message;
pub mod storage;

pub use backend::*;
pub use chat::Chat;
pub use message::{ChatTurn, Message, Role};
pub use storage::{FilterChat, TimeRange};
