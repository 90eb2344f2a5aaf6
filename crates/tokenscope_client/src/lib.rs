//! Tokenscope client: HTTP dispatch to the tokenization service.
mod dispatch;
mod handle;
mod types;

pub use dispatch::{
    DispatchSettings, Dispatcher, ReqwestDispatcher, DEFAULT_BASE_URL, DEFAULT_DEADLINE,
};
pub use handle::ClientHandle;
pub use tokio_util::sync::CancellationToken;
pub use types::{
    ClientEvent, DispatchError, FailureKind, HealthStatus, RequestId, TokenizeRequest,
    TokenizeResponse, TokenizerList,
};
