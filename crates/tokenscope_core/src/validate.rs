#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter some text to tokenize.")]
    EmptyInput,
}

/// Trims the raw input and rejects it if nothing is left.
pub fn validate_text(raw: &str) -> Result<String, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    Ok(text.to_string())
}
