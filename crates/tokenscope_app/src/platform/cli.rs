use std::time::Duration;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use tokenscope_client::{DispatchSettings, DEFAULT_BASE_URL};
use tokenscope_core::TokenizerChoice;

use super::logging::LogDestination;

/// Inspect how a remote tokenization service splits text.
#[derive(Parser, Debug)]
#[command(name = "tokenscope", version)]
pub struct Cli {
    /// Base URL of the tokenization service.
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,
    /// Client-side deadline for each request, in milliseconds.
    #[arg(long, default_value_t = 8000, global = true)]
    pub timeout_ms: u64,
    /// Responses larger than this are rejected.
    #[arg(long, default_value_t = 4 * 1024 * 1024, global = true)]
    pub max_response_bytes: u64,
    #[arg(long, value_enum, default_value_t = LogDestination::File, global = true)]
    pub log: LogDestination,
    #[arg(long, default_value = "info", value_parser = parse_log_level, global = true)]
    pub log_level: LevelFilter,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Tokenize one text and print the result.
    Tokenize {
        text: String,
        #[arg(long, short, default_value = "simple")]
        tokenizer: TokenizerChoice,
    },
    /// Read texts from stdin, one submission per line (the default).
    Interactive {
        #[arg(long, short, default_value = "simple")]
        tokenizer: TokenizerChoice,
    },
    /// Check that the service is up.
    Health,
    /// List the tokenizers the service offers.
    Tokenizers,
}

impl Cli {
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            base_url: self.base_url.clone(),
            deadline: Duration::from_millis(self.timeout_ms),
            max_bytes: self.max_response_bytes,
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Interactive {
            tokenizer: TokenizerChoice::default(),
        })
    }
}

fn parse_log_level(raw: &str) -> Result<LevelFilter, String> {
    tokenscope_logging::parse_level(raw).ok_or_else(|| {
        format!("unknown log level `{raw}` (try off, error, warn, info, debug, trace)")
    })
}
