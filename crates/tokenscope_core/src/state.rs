use crate::tokenizer::describe_tokenizer;
use crate::view_model::{count_label, token_literal, AppViewModel, ResultsView, TokenRowView};
use crate::TokenizerChoice;

pub type RequestId = u64;

const TIMEOUT_MESSAGE: &str = "Request timed out. Check that the backend server is running.";
const SERVICE_ERROR_MESSAGE: &str = "Tokenizer service returned an error.";

/// Successful response as the controller sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeResult {
    pub tokens: Vec<String>,
    /// Vocabulary ids, index-aligned with `tokens` when present.
    pub token_ids: Option<Vec<i64>>,
    /// Tokenizer the service reports having used.
    pub tokenizer: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// The client deadline elapsed before a response arrived.
    Timeout,
    /// Non-success HTTP status, with the `detail` field if the body had one.
    Service { detail: Option<String> },
    /// Anything else; the message is shown as-is.
    Unhandled(String),
}

impl RequestFailure {
    pub fn message(&self) -> String {
        match self {
            RequestFailure::Timeout => TIMEOUT_MESSAGE.to_string(),
            RequestFailure::Service { detail } => detail
                .as_deref()
                .filter(|detail| !detail.is_empty())
                .unwrap_or(SERVICE_ERROR_MESSAGE)
                .to_string(),
            RequestFailure::Unhandled(message) => message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Requesting {
        request_id: RequestId,
    },
}

/// What the output area shows. Results and errors are never visible together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputPanel {
    #[default]
    Empty,
    Results(TokenizeResult),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    text: String,
    tokenizer: TokenizerChoice,
    summary: &'static str,
    phase: Phase,
    output: OutputPanel,
    next_request_id: RequestId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_tokenizer(TokenizerChoice::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state with the selector preset; the summary label already
    /// reflects the choice.
    pub fn with_tokenizer(tokenizer: TokenizerChoice) -> Self {
        Self {
            text: String::new(),
            tokenizer,
            summary: tokenizer.description(),
            phase: Phase::Idle,
            output: OutputPanel::Empty,
            next_request_id: 1,
            dirty: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokenizer(&self) -> TokenizerChoice {
        self.tokenizer
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn output(&self) -> &OutputPanel {
        &self.output
    }

    pub fn view(&self) -> AppViewModel {
        let (results, error) = match &self.output {
            OutputPanel::Empty => (None, None),
            OutputPanel::Results(result) => (Some(build_results_view(result)), None),
            OutputPanel::Error(message) => (None, Some(message.clone())),
        };
        AppViewModel {
            summary: self.summary.to_string(),
            pending: matches!(self.phase, Phase::Requesting { .. }),
            results,
            error,
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn set_text(&mut self, text: String) {
        // The view does not echo the input, so editing never needs a render.
        self.text = text;
    }

    pub(crate) fn select_tokenizer(&mut self, tokenizer: TokenizerChoice) {
        self.tokenizer = tokenizer;
        self.summary = tokenizer.description();
        self.dirty = true;
    }

    pub(crate) fn is_pending(&self, request_id: RequestId) -> bool {
        self.phase == Phase::Requesting { request_id }
    }

    /// Drops the in-flight request, if any, and returns its id.
    pub(crate) fn abandon_pending(&mut self) -> Option<RequestId> {
        match std::mem::take(&mut self.phase) {
            Phase::Requesting { request_id } => {
                self.dirty = true;
                Some(request_id)
            }
            Phase::Idle => None,
        }
    }

    pub(crate) fn begin_request(&mut self) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.phase = Phase::Requesting { request_id };
        self.dirty = true;
        request_id
    }

    pub(crate) fn finish_request(&mut self) {
        self.phase = Phase::Idle;
        self.dirty = true;
    }

    pub(crate) fn clear_output(&mut self) {
        self.output = OutputPanel::Empty;
        self.dirty = true;
    }

    pub(crate) fn show_results(&mut self, result: TokenizeResult) {
        self.summary = describe_tokenizer(&result.tokenizer);
        self.output = OutputPanel::Results(result);
        self.dirty = true;
    }

    pub(crate) fn show_error(&mut self, message: String) {
        self.output = OutputPanel::Error(message);
        self.dirty = true;
    }
}

fn build_results_view(result: &TokenizeResult) -> ResultsView {
    let rows = result
        .tokens
        .iter()
        .enumerate()
        .map(|(index, token)| TokenRowView {
            position: format!("#{}", index + 1),
            literal: token_literal(token),
            id: result
                .token_ids
                .as_ref()
                .and_then(|ids| ids.get(index))
                .map(|id| id.to_string()),
        })
        .collect();
    ResultsView {
        count_label: count_label(result.count),
        rows,
    }
}
