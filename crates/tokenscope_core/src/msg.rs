#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the text input.
    TextChanged(String),
    /// User picked a different tokenizer in the selector.
    TokenizerChanged(crate::TokenizerChoice),
    /// User submitted the form.
    Submitted,
    /// The client finished a request (success or failure).
    ResponseReceived {
        request_id: crate::RequestId,
        result: Result<crate::TokenizeResult, crate::RequestFailure>,
    },
}
