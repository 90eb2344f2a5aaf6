use tokenscope_logging::scope_debug;

use crate::{validate_text, AppState, Effect, Msg, Submission};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::TextChanged(text) => {
            state.set_text(text);
            Vec::new()
        }
        Msg::TokenizerChanged(tokenizer) => {
            state.select_tokenizer(tokenizer);
            Vec::new()
        }
        Msg::Submitted => submit(&mut state),
        Msg::ResponseReceived { request_id, result } => {
            if !state.is_pending(request_id) {
                scope_debug!(
                    "Ignoring response for superseded request_id={} ok={}",
                    request_id,
                    result.is_ok()
                );
                return (state, Vec::new());
            }
            state.finish_request();
            match result {
                Ok(result) => state.show_results(result),
                Err(failure) => state.show_error(failure.message()),
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    state.clear_output();

    // Latest submission wins: whatever was in flight is cancelled, and its
    // late response no longer matches the pending id.
    let mut effects = Vec::with_capacity(2);
    if let Some(request_id) = state.abandon_pending() {
        effects.push(Effect::Cancel { request_id });
    }

    match validate_text(state.text()) {
        Ok(text) => {
            let request_id = state.begin_request();
            effects.push(Effect::Dispatch {
                request_id,
                submission: Submission {
                    text,
                    tokenizer: state.tokenizer(),
                },
            });
        }
        Err(err) => state.show_error(err.to_string()),
    }
    effects
}
