//! Tokenscope core: pure form-controller state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod tokenizer;
mod update;
mod validate;
mod view_model;

pub use effect::{Effect, Submission};
pub use msg::Msg;
pub use state::{AppState, OutputPanel, Phase, RequestFailure, RequestId, TokenizeResult};
pub use tokenizer::{describe_tokenizer, TokenizerChoice, UnknownTokenizer};
pub use update::update;
pub use validate::{validate_text, ValidationError};
pub use view_model::{count_label, token_literal, AppViewModel, ResultsView, TokenRowView};
