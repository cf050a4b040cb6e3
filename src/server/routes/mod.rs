pub(super) mod chats;
pub(super) mod health;
pub(super) mod import;
