use crate::{RequestId, TokenizerChoice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub tokenizer: TokenizerChoice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send one tokenize request for a validated submission.
    Dispatch {
        request_id: RequestId,
        submission: Submission,
    },
    /// Abort a request superseded by a newer submission.
    Cancel { request_id: RequestId },
}
