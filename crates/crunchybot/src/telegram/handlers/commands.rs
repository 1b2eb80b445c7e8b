//! Command replies
//!
//! Deciding what to answer is kept apart from sending it, so the whole
//! command surface can be exercised without a Telegram connection.

use crunchycore::{AccessError, AppError, SudoChange};

use super::types::HandlerDeps;
use crate::telegram::bot::Command;
use crate::telegram::replies;

/// Reply text for `cmd` sent by `user_id`. Applies the command's effect.
pub fn command_reply(deps: &HandlerDeps, user_id: i64, cmd: &Command) -> String {
    // /mysudo is how a new user learns the id to send to the admin
    if !matches!(cmd, Command::MySudo) && !deps.access.is_authorized(user_id) {
        log::warn!("Unauthorized command {:?} from user {}", command_name(cmd), user_id);
        return replies::NOT_AUTHORIZED.to_string();
    }

    match cmd {
        Command::Start => replies::start(),
        Command::Help => replies::help(),
        Command::SetCookie(payload) if payload.trim().is_empty() => {
            deps.pending_cookies.insert(user_id);
            replies::setcookie_instructions()
        }
        Command::SetCookie(payload) => {
            deps.pending_cookies.remove(&user_id);
            store_cookie(deps, user_id, payload).unwrap_or_else(|reply| reply)
        }
        Command::ClearCookie => {
            deps.pending_cookies.remove(&user_id);
            if deps.cookies.clear_cookie(user_id) {
                replies::COOKIES_CLEARED.to_string()
            } else {
                replies::NO_COOKIES_TO_CLEAR.to_string()
            }
        }
        Command::MySudo => replies::my_sudo(user_id, deps.access.role(user_id)),
        Command::AddSudo(arg) => match parse_target(deps, user_id, "addsudo", arg) {
            Ok(target) => sudo_change_reply(target, deps.access.add_sudo(user_id, target)),
            Err(reply) => reply,
        },
        Command::RemoveSudo(arg) => match parse_target(deps, user_id, "removesudo", arg) {
            Ok(target) => sudo_change_reply(target, deps.access.remove_sudo(user_id, target)),
            Err(reply) => reply,
        },
        Command::ListSudo => match deps.access.list_sudo(user_id) {
            Ok(ids) => replies::sudo_list(&ids),
            Err(e) => replies::app_error(&e.into()),
        },
    }
}

/// Parses a cookie submission into the jar.
///
/// Both sides carry the reply text; `Err` means nothing was stored and any
/// earlier cookie is still in place.
pub fn store_cookie(deps: &HandlerDeps, user_id: i64, payload: &str) -> Result<String, String> {
    match deps.cookies.set_cookie(user_id, payload) {
        Ok(summary) => Ok(replies::cookies_saved(&summary)),
        Err(e) => {
            let err = AppError::from(e);
            log::info!("Rejected cookie data from user {} [{}]: {}", user_id, err.category(), err);
            Err(replies::app_error(&err))
        }
    }
}

/// Target id of /addsudo and /removesudo.
///
/// Non-admins get the admin-only reply even for a malformed argument.
fn parse_target(deps: &HandlerDeps, user_id: i64, verb: &str, arg: &str) -> Result<i64, String> {
    let arg = arg.trim();
    let problem = if arg.is_empty() {
        replies::usage(verb)
    } else {
        match arg.parse::<i64>() {
            Ok(id) => return Ok(id),
            Err(_) => replies::INVALID_ID.to_string(),
        }
    };

    if deps.access.is_admin(user_id) {
        Err(problem)
    } else {
        Err(replies::ADMIN_ONLY.to_string())
    }
}

fn sudo_change_reply(target: i64, result: Result<SudoChange, AccessError>) -> String {
    let err = match result {
        Ok(change) => return change_text(target, change),
        Err(e) => AppError::from(e),
    };
    log::warn!("Sudo change for {} failed [{}]: {}", target, err.category(), err);
    match &err {
        // the change itself went through; say what it was
        AppError::Access(AccessError::Storage { change, .. }) => {
            format!("{}\n{}", change_text(target, *change), replies::app_error(&err))
        }
        _ => replies::app_error(&err),
    }
}

fn change_text(target: i64, change: SudoChange) -> String {
    match change {
        SudoChange::Added => replies::sudo_added(target),
        SudoChange::AlreadyPresent => replies::sudo_already_present(target),
        SudoChange::Removed => replies::sudo_removed(target),
        SudoChange::NotPresent => replies::sudo_not_present(target),
        SudoChange::AdminUnchanged => replies::ADMIN_IS_PERMANENT.to_string(),
    }
}

/// Command verb without its argument, for logs (cookie payloads stay out)
fn command_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::Start => "start",
        Command::Help => "help",
        Command::SetCookie(_) => "setcookie",
        Command::ClearCookie => "clearcookie",
        Command::MySudo => "mysudo",
        Command::AddSudo(_) => "addsudo",
        Command::RemoveSudo(_) => "removesudo",
        Command::ListSudo => "listsudo",
    }
}
