use std::fmt;

use serde::{Deserialize, Serialize};

pub type RequestId = u64;

/// Body of `POST /tokenize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenizeRequest {
    pub text: String,
    pub tokenizer: String,
}

impl TokenizeRequest {
    pub fn new(text: impl Into<String>, tokenizer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tokenizer: tokenizer.into(),
        }
    }
}

/// Successful `POST /tokenize` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<String>,
    /// Only sent by tokenizers with a vocabulary.
    pub token_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub tokenizer: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenizerList {
    pub tokenizers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Completed {
        request_id: RequestId,
        result: Result<TokenizeResponse, DispatchError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: FailureKind,
    pub message: String,
}

impl DispatchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// Client or runtime could not be constructed.
    Setup,
    Timeout,
    Cancelled,
    HttpStatus { status: u16, detail: Option<String> },
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Setup => write!(f, "client setup failed"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::HttpStatus { status, detail } => match detail {
                Some(detail) => write!(f, "http status {status}: {detail}"),
                None => write!(f, "http status {status}"),
            },
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
