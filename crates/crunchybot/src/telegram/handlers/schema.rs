//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::command_reply;
use super::messages::{text_action, TextAction};
use super::types::{sender_id, HandlerDeps, HandlerError};
use crate::telegram::bot::{is_message_addressed_to_bot, parse_command, Command};
use crate::telegram::send::{download_and_send, send_reply};

/// Creates the dispatcher schema for the bot.
///
/// Commands are matched first; every other text message addressed to the
/// bot goes through the message handler. Non-text updates are ignored.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let bot_username = deps.bot_username.clone().unwrap_or_default();

    Update::filter_message()
        .filter_map(move |msg: Message| msg.text().and_then(|text| parse_command(text, &bot_username)))
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let Some(user_id) = sender_id(&msg) else {
                    return Ok(());
                };
                log::info!("Received command {:?} from user {} in chat {}", cmd_label(&cmd), user_id, msg.chat.id);

                let reply = command_reply(&deps, user_id, &cmd);
                send_reply(&bot, msg.chat.id, reply).await?;
                Ok(())
            }
        })
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let bot_username = deps.bot_username.clone();
    let bot_id = deps.bot_id;

    Update::filter_message()
        .filter(move |msg: Message| is_message_addressed_to_bot(&msg, bot_username.as_deref(), bot_id))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let (Some(user_id), Some(text)) = (sender_id(&msg), msg.text()) else {
                    return Ok(());
                };

                match text_action(&deps, user_id, text) {
                    TextAction::Reply(reply) => {
                        send_reply(&bot, msg.chat.id, reply).await?;
                    }
                    TextAction::Download { url, cookie } => {
                        // downloads run for minutes; keep the dispatcher free
                        tokio::spawn(download_and_send(bot, msg.chat.id, deps.fetcher.clone(), url, cookie));
                    }
                }
                Ok(())
            }
        })
}

/// Commands as logged: /setcookie payloads are secrets
fn cmd_label(cmd: &Command) -> Command {
    match cmd {
        Command::SetCookie(payload) if !payload.is_empty() => Command::SetCookie("<redacted>".to_string()),
        other => other.clone(),
    }
}
