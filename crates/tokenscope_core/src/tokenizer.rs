use std::fmt;
use std::str::FromStr;

/// Tokenizers the service exposes through its selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenizerChoice {
    #[default]
    Simple,
    BertBaseUncased,
    Cl100kBase,
}

impl TokenizerChoice {
    pub const ALL: [TokenizerChoice; 3] = [
        TokenizerChoice::Simple,
        TokenizerChoice::BertBaseUncased,
        TokenizerChoice::Cl100kBase,
    ];

    /// Wire identifier sent in the `tokenizer` field of a request.
    pub fn id(self) -> &'static str {
        match self {
            TokenizerChoice::Simple => "simple",
            TokenizerChoice::BertBaseUncased => "bert-base-uncased",
            TokenizerChoice::Cl100kBase => "cl100k_base",
        }
    }

    pub fn description(self) -> &'static str {
        describe_tokenizer(self.id())
    }
}

impl fmt::Display for TokenizerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tokenizer `{0}` (expected one of: simple, bert-base-uncased, cl100k_base)")]
pub struct UnknownTokenizer(pub String);

impl FromStr for TokenizerChoice {
    type Err = UnknownTokenizer;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        TokenizerChoice::ALL
            .into_iter()
            .find(|choice| choice.id() == raw)
            .ok_or_else(|| UnknownTokenizer(raw.to_string()))
    }
}

/// Human-readable label for a tokenizer identifier.
///
/// Unknown or empty identifiers fall back to the simple regex tokenizer,
/// which is what the service uses when no tokenizer is named.
pub fn describe_tokenizer(id: &str) -> &'static str {
    match id {
        "bert-base-uncased" => "Hugging Face • bert-base-uncased",
        "cl100k_base" => "OpenAI • cl100k_base",
        _ => "Simple Regex Tokenizer",
    }
}
