//! Telegram integration

pub mod bot;
pub mod handlers;
pub mod replies;
pub mod send;

pub use bot::{create_bot, is_message_addressed_to_bot, parse_command, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use send::{download_and_send, send_fetched_media, send_reply};
