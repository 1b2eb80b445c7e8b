use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crunchydl")]
#[command(author, version, about = "Telegram bot that downloads Crunchyroll episodes with your own cookies", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run,

    /// Validate the environment configuration and exit
    CheckConfig,

    /// Download one episode without Telegram
    Fetch {
        /// Crunchyroll episode URL
        url: String,

        /// Cookie export (Cookie-Editor JSON, cookies.txt or a Cookie header)
        #[arg(short, long)]
        cookies: PathBuf,

        /// Directory the finished file is moved to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
