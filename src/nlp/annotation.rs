use serde::{Deserialize, Serialize};

/// Everything a pipeline produced for one input text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    /// Server-side parse duration in milliseconds
    pub parse_msec: u64,
    /// Tokens in document order
    pub tokens: Vec<Token>,
    /// Sentence boundaries as byte spans into the input text
    pub sentences: Vec<SentenceSpan>,
    /// Recognized entities, sorted by start offset
    pub entities: Vec<Entity>,
    /// Dependency arc diagram, present only when the caller asked for it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
}

/// One token with its coarse annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Surface form as it appears in the input
    pub text: String,
    /// Lowercased base form (surface-level, not a full lemmatizer)
    pub lemma: String,
    /// Coarse universal part-of-speech tag
    pub pos: String,
    /// Dependency label relative to `head`
    pub dep: String,
    /// Document-level index of the head token; the root points at itself
    pub head: usize,
    /// Byte offset of the token start in the input text
    pub start: usize,
}

/// A recognized entity span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity text as sliced from the input
    pub text: String,
    /// Entity label, e.g. "EMAIL", "URL", "DATE", "NAME"
    pub label: String,
    /// Byte offset of the span start
    pub start: usize,
    /// Byte offset one past the span end
    pub end: usize,
}

/// A sentence as a byte span into the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}
