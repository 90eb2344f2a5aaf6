use std::collections::HashMap;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokenscope_logging::{scope_debug, scope_error};
use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatchSettings, Dispatcher, ReqwestDispatcher};
use crate::{ClientEvent, DispatchError, FailureKind, RequestId, TokenizeRequest};

enum ClientCommand {
    Tokenize {
        request_id: RequestId,
        request: TokenizeRequest,
    },
    Cancel {
        request_id: RequestId,
    },
}

type InFlight = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

/// Runs requests on a background runtime and reports completions as events.
///
/// Every request owns a cancellation token for its lifetime; the token is
/// dropped from the in-flight table as soon as the request finishes.
#[derive(Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<ClientEvent>>>,
}

impl ClientHandle {
    pub fn new(settings: DispatchSettings) -> Result<Self, DispatchError> {
        let dispatcher = ReqwestDispatcher::new(settings)?;
        Self::with_dispatcher(Arc::new(dispatcher))
    }

    pub fn with_dispatcher(dispatcher: Arc<dyn Dispatcher>) -> Result<Self, DispatchError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|err| DispatchError::new(FailureKind::Setup, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let in_flight: InFlight = Arc::default();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(&runtime, &dispatcher, &in_flight, &event_tx, command);
            }
            scope_debug!("client command channel closed; shutting down runtime");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn tokenize(&self, request_id: RequestId, request: TokenizeRequest) {
        let _ = self.cmd_tx.send(ClientCommand::Tokenize {
            request_id,
            request,
        });
    }

    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.cmd_tx.send(ClientCommand::Cancel { request_id });
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Disconnected` means the
    /// background thread is gone and no further events will arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ClientEvent, RecvTimeoutError> {
        let event_rx = self
            .event_rx
            .lock()
            .map_err(|_| RecvTimeoutError::Disconnected)?;
        event_rx.recv_timeout(timeout)
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    dispatcher: &Arc<dyn Dispatcher>,
    in_flight: &InFlight,
    event_tx: &mpsc::Sender<ClientEvent>,
    command: ClientCommand,
) {
    match command {
        ClientCommand::Tokenize {
            request_id,
            request,
        } => {
            let cancel = CancellationToken::new();
            match in_flight.lock() {
                Ok(mut table) => {
                    table.insert(request_id, cancel.clone());
                }
                Err(_) => scope_error!(
                    "in-flight table poisoned; request_id={} is not cancellable",
                    request_id
                ),
            }

            let dispatcher = dispatcher.clone();
            let in_flight = in_flight.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = dispatcher.tokenize(&request, &cancel).await;
                if let Ok(mut table) = in_flight.lock() {
                    table.remove(&request_id);
                }
                let _ = event_tx.send(ClientEvent::Completed { request_id, result });
            });
        }
        ClientCommand::Cancel { request_id } => {
            let token = in_flight
                .lock()
                .ok()
                .and_then(|mut table| table.remove(&request_id));
            match token {
                Some(token) => {
                    scope_debug!("cancelling request_id={}", request_id);
                    token.cancel();
                }
                None => scope_debug!("cancel for finished request_id={}", request_id),
            }
        }
    }
}
