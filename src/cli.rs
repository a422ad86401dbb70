use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `wardgate` - a moderation gateway in front of a delegating travel assistant.
#[derive(Parser, Debug)]
#[command(name = "wardgate")]
#[command(version)]
#[command(about = "Guarded conversational gateway with input and output moderation.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.wardgate/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat through the full guarded pipeline (reads stdin line by line)
    Chat {
        /// Conversation identity; a new random one by default
        #[arg(long)]
        identity: Option<String>,
    },

    /// Run the scanner bank and static filter on a text, without any model call
    Check {
        /// Text to check
        text: String,

        /// Check the text as a responder output instead of a user prompt
        #[arg(long)]
        output: bool,

        /// Originating prompt for output checks
        #[arg(long, requires = "output")]
        prompt: Option<String>,
    },

    /// Print the effective configuration (API key masked)
    Config,
}
