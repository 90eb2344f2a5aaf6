use std::sync::Once;

use pretty_assertions::assert_eq;
use tokenscope_core::{
    update, AppState, Msg, Phase, RequestFailure, TokenRowView, TokenizeResult, TokenizerChoice,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tokenscope_logging::initialize_for_tests);
}

fn pending(text: &str, tokenizer: TokenizerChoice) -> AppState {
    let state = AppState::with_tokenizer(tokenizer);
    let (state, _) = update(state, Msg::TextChanged(text.to_string()));
    let (state, effects) = update(state, Msg::Submitted);
    assert_eq!(effects.len(), 1);
    state
}

fn hello_world() -> TokenizeResult {
    TokenizeResult {
        tokens: vec![
            "Hello".to_string(),
            ",".to_string(),
            "world".to_string(),
            "!".to_string(),
        ],
        token_ids: Some(vec![9906, 11, 1917, 0]),
        tokenizer: "cl100k_base".to_string(),
        count: 4,
    }
}

fn row(position: &str, literal: &str, id: Option<&str>) -> TokenRowView {
    TokenRowView {
        position: position.to_string(),
        literal: literal.to_string(),
        id: id.map(str::to_string),
    }
}

#[test]
fn success_renders_rows_ids_count_and_summary() {
    init_logging();
    let state = pending("Hello, world!", TokenizerChoice::Cl100kBase);

    let (state, effects) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(hello_world()),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
    let view = state.view();
    assert_eq!(view.summary, "OpenAI • cl100k_base");
    assert_eq!(view.error, None);
    assert!(!view.pending);
    let results = view.results.expect("results visible");
    assert_eq!(results.count_label, "4 tokens");
    assert_eq!(
        results.rows,
        vec![
            row("#1", "\"Hello\"", Some("9906")),
            row("#2", "\",\"", Some("11")),
            row("#3", "\"world\"", Some("1917")),
            row("#4", "\"!\"", Some("0")),
        ]
    );
}

#[test]
fn success_without_ids_has_no_id_badges() {
    init_logging();
    let state = pending("it's fine", TokenizerChoice::Simple);
    let result = TokenizeResult {
        tokens: vec!["it".to_string(), "'s".to_string(), "fine".to_string()],
        token_ids: None,
        tokenizer: "simple".to_string(),
        count: 3,
    };

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(result),
        },
    );

    let results = state.view().results.expect("results visible");
    assert!(results.rows.iter().all(|row| row.id.is_none()));
    assert_eq!(state.view().summary, "Simple Regex Tokenizer");
}

#[test]
fn summary_follows_server_echo_not_selection() {
    init_logging();
    let state = pending("abc", TokenizerChoice::BertBaseUncased);
    let result = TokenizeResult {
        tokens: vec!["abc".to_string()],
        token_ids: None,
        tokenizer: "something-new".to_string(),
        count: 1,
    };

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(result),
        },
    );

    let view = state.view();
    assert_eq!(view.summary, "Simple Regex Tokenizer");
    assert_eq!(view.results.unwrap().count_label, "1 token");
}

#[test]
fn zero_count_reads_plural() {
    init_logging();
    let state = pending("...", TokenizerChoice::Simple);
    let result = TokenizeResult {
        tokens: Vec::new(),
        token_ids: None,
        tokenizer: "simple".to_string(),
        count: 0,
    };

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(result),
        },
    );

    let results = state.view().results.unwrap();
    assert_eq!(results.count_label, "0 tokens");
    assert!(results.rows.is_empty());
}

#[test]
fn short_id_array_leaves_trailing_rows_without_badge() {
    init_logging();
    let state = pending("a b", TokenizerChoice::Cl100kBase);
    let result = TokenizeResult {
        tokens: vec!["a".to_string(), " b".to_string()],
        token_ids: Some(vec![64]),
        tokenizer: "cl100k_base".to_string(),
        count: 2,
    };

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(result),
        },
    );

    let rows = state.view().results.unwrap().rows;
    assert_eq!(rows[0].id.as_deref(), Some("64"));
    assert_eq!(rows[1].id, None);
    assert_eq!(rows[1].literal, "\" b\"");
}

#[test]
fn service_error_shows_detail_and_hides_results() {
    init_logging();
    let state = pending("Hello", TokenizerChoice::Simple);

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Err(RequestFailure::Service {
                detail: Some("tokenizer unavailable".to_string()),
            }),
        },
    );

    let view = state.view();
    assert_eq!(view.error.as_deref(), Some("tokenizer unavailable"));
    assert_eq!(view.results, None);
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn service_error_without_detail_uses_generic_message() {
    init_logging();
    let state = pending("Hello", TokenizerChoice::Simple);

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Err(RequestFailure::Service { detail: None }),
        },
    );

    assert_eq!(
        state.view().error.as_deref(),
        Some("Tokenizer service returned an error.")
    );
}

#[test]
fn timeout_shows_fixed_message() {
    init_logging();
    let state = pending("Hello", TokenizerChoice::Simple);

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Err(RequestFailure::Timeout),
        },
    );

    assert_eq!(
        state.view().error.as_deref(),
        Some("Request timed out. Check that the backend server is running.")
    );
}

#[test]
fn unhandled_error_message_is_shown_verbatim() {
    init_logging();
    let state = pending("Hello", TokenizerChoice::Simple);

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Err(RequestFailure::Unhandled(
                "error sending request for url (http://127.0.0.1:9/tokenize)".to_string(),
            )),
        },
    );

    let view = state.view();
    assert_eq!(
        view.error.as_deref(),
        Some("error sending request for url (http://127.0.0.1:9/tokenize)")
    );
    assert_eq!(view.results, None);
}

#[test]
fn late_response_for_superseded_request_is_ignored() {
    init_logging();
    let state = pending("first", TokenizerChoice::Cl100kBase);
    let (state, _) = update(state, Msg::TextChanged("second".to_string()));
    let (mut state, _) = update(state, Msg::Submitted);
    assert!(state.consume_dirty());

    let (mut state, effects) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(hello_world()),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.phase(), Phase::Requesting { request_id: 2 });
    assert_eq!(state.view().results, None);
}

#[test]
fn response_after_completion_is_ignored() {
    init_logging();
    let state = pending("Hello", TokenizerChoice::Simple);
    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Err(RequestFailure::Timeout),
        },
    );

    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(hello_world()),
        },
    );

    let view = state.view();
    assert_eq!(view.results, None);
    assert_eq!(
        view.error.as_deref(),
        Some("Request timed out. Check that the backend server is running.")
    );
}

#[test]
fn new_submission_clears_previous_results() {
    init_logging();
    let state = pending("Hello, world!", TokenizerChoice::Cl100kBase);
    let (state, _) = update(
        state,
        Msg::ResponseReceived {
            request_id: 1,
            result: Ok(hello_world()),
        },
    );
    assert!(state.view().results.is_some());

    let (state, _) = update(state, Msg::Submitted);

    let view = state.view();
    assert_eq!(view.results, None);
    assert_eq!(view.error, None);
    assert!(view.pending);
}
