use crunchycore::config::{self, BotConfig};
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message};
use teloxide::utils::command::BotCommands;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "how to export your Crunchyroll cookies")]
    Help,
    #[command(description = "set your Crunchyroll cookies")]
    SetCookie(String),
    #[command(description = "clear your saved cookies")]
    ClearCookie,
    #[command(description = "show your user id and role")]
    MySudo,
    #[command(description = "grant sudo to a user (admin only)")]
    AddSudo(String),
    #[command(description = "revoke sudo from a user (admin only)")]
    RemoveSudo(String),
    #[command(description = "list sudo users (admin only)")]
    ListSudo,
}

/// Parses a command out of message text.
///
/// Cookie exports are pasted on the line after `/setcookie`, so the first
/// whitespace of any kind separates the verb from its argument, and the
/// argument keeps its inner line breaks. Arguments to commands that take none
/// are ignored. Returns `None` for text that is not a known command, or is
/// addressed to another bot.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let text = text.trim_start();
    let (verb, args) = match text.split_once(char::is_whitespace) {
        Some((verb, args)) => (verb, args.trim()),
        None => (text, ""),
    };

    let verb = verb.strip_prefix('/')?;
    let name = match verb.split_once('@') {
        Some((name, mention)) if mention.eq_ignore_ascii_case(bot_username) => name,
        Some(_) => return None,
        None => verb,
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "setcookie" => Command::SetCookie(args.to_string()),
        "clearcookie" => Command::ClearCookie,
        "mysudo" => Command::MySudo,
        "addsudo" => Command::AddSudo(args.to_string()),
        "removesudo" => Command::RemoveSudo(args.to_string()),
        "listsudo" => Command::ListSudo,
        _ => return None,
    };
    Some(command)
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, client setup)
pub fn create_bot(config: &BotConfig) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    // Check if local Bot API server is configured
    let bot = match &config.bot_api_url {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Checks if a message is addressed to the bot
///
/// # Arguments
/// * `msg` - Message to check
/// * `bot_username` - Bot's username (without @)
/// * `bot_id` - Bot's user ID
///
/// # Returns
/// * `true` if message is addressed to bot (private chat, bot mention, reply to bot message)
pub fn is_message_addressed_to_bot(msg: &Message, bot_username: Option<&str>, bot_id: UserId) -> bool {
    // In private chats, all messages are addressed to the bot
    if matches!(msg.chat.kind, ChatKind::Private(_)) {
        return true;
    }

    // Check if the message is a reply to a bot message
    if let Some(reply_to) = msg.reply_to_message() {
        if reply_to.from.as_ref().is_some_and(|from| from.id == bot_id) {
            return true;
        }
    }

    // Check message text for a bot mention
    match (msg.text(), bot_username) {
        (Some(text), Some(username)) => text.to_lowercase().contains(&format!("@{}", username.to_lowercase())),
        _ => false,
    }
}
