#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    /// Tokenizer description shown above the results.
    pub summary: String,
    pub pending: bool,
    pub results: Option<ResultsView>,
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultsView {
    pub count_label: String,
    pub rows: Vec<TokenRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRowView {
    /// 1-based position, e.g. `#3`.
    pub position: String,
    /// Token as a quoted, escaped string literal.
    pub literal: String,
    /// Vocabulary id, only when the response carried ids.
    pub id: Option<String>,
}

pub fn count_label(count: u64) -> String {
    if count == 1 {
        "1 token".to_string()
    } else {
        format!("{count} tokens")
    }
}

/// Renders a token as a JSON string literal so whitespace and control
/// characters stay visible.
pub fn token_literal(token: &str) -> String {
    serde_json::to_string(token).unwrap_or_else(|_| format!("{token:?}"))
}
