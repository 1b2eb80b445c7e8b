//! crunchybot - the Telegram side of crunchydl
//!
//! # Module Structure
//!
//! - `telegram`: bot construction, dispatcher schema, handlers and reply texts
//! - `cli`: command-line interface of the `crunchydl` binary

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cli;
pub mod telegram;
