use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Conduit completion client
#[derive(Debug, Parser)]
#[command(name = "conduit", about = "Send conversations to OpenAI-compatible completion endpoints")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "conduit.toml", env = "CONDUIT_CONFIG")]
    pub config: PathBuf,

    /// Provider profile to use (defaults to the first one configured)
    #[arg(short, long, env = "CONDUIT_PROVIDER")]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a prompt and print the reply
    Chat {
        /// System instruction placed before the prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Print the reply as it is generated
        #[arg(long)]
        stream: bool,

        /// Cap on response tokens (computed from the context window when omitted)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// User prompt
        prompt: String,
    },

    /// Check the provider's credentials with a minimal request
    Validate,

    /// Estimate the prompt tokens of a message
    Tokens {
        /// User prompt
        prompt: String,
    },
}
