//! Telegram bot handlers
//!
//! - `types`: shared handler dependencies
//! - `schema`: dispatcher tree
//! - `commands`: slash-command replies
//! - `messages`: cookie capture and link handling for plain text

pub mod commands;
pub mod messages;
pub mod schema;
pub mod types;

pub use commands::command_reply;
pub use messages::{text_action, TextAction};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
