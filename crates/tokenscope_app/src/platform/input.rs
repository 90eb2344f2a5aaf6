use tokenscope_core::{TokenizerChoice, UnknownTokenizer};

pub const HELP: &str = "\
Type text and press Enter to tokenize it.
  :tokenizer <simple|bert-base-uncased|cl100k_base>   switch tokenizer
  :help                                               show this help
  :quit                                               exit
Start a line with '::' to submit text that begins with ':'.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Submit(String),
    SelectTokenizer(TokenizerChoice),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("unknown command `:{0}` (type :help)")]
    UnknownCommand(String),
    #[error("usage: :tokenizer <simple|bert-base-uncased|cl100k_base>")]
    MissingTokenizer,
    #[error(transparent)]
    Tokenizer(#[from] UnknownTokenizer),
}

/// Interprets one line of interactive input.
///
/// Plain lines are submitted untouched; trimming is the validator's job.
pub fn parse_line(line: &str) -> Result<InputCommand, InputError> {
    if let Some(escaped) = line.strip_prefix("::") {
        return Ok(InputCommand::Submit(format!(":{escaped}")));
    }
    let Some(command) = line.trim_start().strip_prefix(':') else {
        return Ok(InputCommand::Submit(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "q" | "quit" | "exit" => Ok(InputCommand::Quit),
        "h" | "help" | "?" => Ok(InputCommand::Help),
        "t" | "tokenizer" => {
            let id = parts.next().ok_or(InputError::MissingTokenizer)?;
            Ok(InputCommand::SelectTokenizer(id.parse()?))
        }
        other => Err(InputError::UnknownCommand(other.to_string())),
    }
}
