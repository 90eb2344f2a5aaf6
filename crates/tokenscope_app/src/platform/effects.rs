use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tokenscope_client::{
    ClientEvent, ClientHandle, DispatchError, DispatchSettings, FailureKind, TokenizeRequest,
    TokenizeResponse,
};
use tokenscope_core::{Effect, Msg, RequestFailure, TokenizeResult};
use tokenscope_logging::{scope_debug, scope_info, scope_warn};

use super::app::AppEvent;

pub struct EffectRunner {
    client: ClientHandle,
}

impl EffectRunner {
    pub fn new(
        settings: DispatchSettings,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self, DispatchError> {
        let client = ClientHandle::new(settings)?;
        Ok(Self::with_client(client, event_tx))
    }

    pub fn with_client(client: ClientHandle, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let runner = Self { client };
        runner.spawn_event_loop(event_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Dispatch {
                    request_id,
                    submission,
                } => {
                    scope_info!(
                        "Dispatch request_id={} tokenizer={} text_len={}",
                        request_id,
                        submission.tokenizer,
                        submission.text.len()
                    );
                    self.client.tokenize(
                        request_id,
                        TokenizeRequest::new(submission.text, submission.tokenizer.id()),
                    );
                }
                Effect::Cancel { request_id } => {
                    scope_info!("Cancel request_id={}", request_id);
                    self.client.cancel(request_id);
                }
            }
        }
    }

    fn spawn_event_loop(&self, event_tx: mpsc::Sender<AppEvent>) {
        let client = self.client.clone();
        thread::spawn(move || loop {
            let event = match client.recv_timeout(Duration::from_millis(50)) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    scope_warn!("client event channel closed; stopping event loop");
                    break;
                }
            };
            let Some(msg) = map_event(event) else {
                continue;
            };
            if event_tx.send(AppEvent::Core(msg)).is_err() {
                break;
            }
        });
    }
}

fn map_event(event: ClientEvent) -> Option<Msg> {
    match event {
        ClientEvent::Completed { request_id, result } => match result {
            Err(err) if err.kind == FailureKind::Cancelled => {
                // Only superseded requests are cancelled; nothing to show.
                scope_debug!("Request {} cancelled", request_id);
                None
            }
            result => Some(Msg::ResponseReceived {
                request_id,
                result: result.map(map_response).map_err(|err| {
                    scope_warn!("Request {} failed: {}", request_id, err.kind);
                    map_failure(err)
                }),
            }),
        },
    }
}

fn map_response(response: TokenizeResponse) -> TokenizeResult {
    TokenizeResult {
        tokens: response.tokens,
        token_ids: response.token_ids,
        tokenizer: response.tokenizer,
        count: response.count,
    }
}

pub(super) fn map_failure(err: DispatchError) -> RequestFailure {
    match err.kind {
        FailureKind::Timeout => RequestFailure::Timeout,
        FailureKind::HttpStatus { detail, .. } => RequestFailure::Service { detail },
        FailureKind::InvalidUrl
        | FailureKind::Setup
        | FailureKind::Cancelled
        | FailureKind::TooLarge { .. }
        | FailureKind::Decode
        | FailureKind::Network => RequestFailure::Unhandled(err.message),
    }
}
