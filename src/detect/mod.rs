mod engine;


use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub use engine::TrigramLanguageId;

/// Language code reported when identification is impossible
pub const UNKNOWN_LANG: &str = "xx";

/// An engine that guesses the language of a text
pub trait LanguageId: Send + Sync {
    /// Return the two-letter language code and a confidence in 0.0..=1.0,
    /// or None when the text gives nothing to work with
    fn identify(&self, text: &str) -> Option<(String, f64)>;
}

/// Outcome of one identification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Two-letter language code, or "xx" when unknown
    pub language: String,
    /// Confidence score; 0.0 when the language is unknown
    pub score: f64,
}

static GLOBAL: OnceLock<LanguageDetector> = OnceLock::new();

/// Language identification front end.
///
/// The process-wide instance behind [`LanguageDetector::global`] is
/// built on first use and then shared; identification itself takes no
/// locks and is safe to call from any thread.
pub struct LanguageDetector {
    engine: Box<dyn LanguageId>,
}

impl LanguageDetector {
    /// Build a detector around a specific engine
    pub fn new(engine: Box<dyn LanguageId>) -> Self {
        LanguageDetector { engine }
    }

    /// The lazily initialized process-wide detector
    pub fn global() -> &'static LanguageDetector {
        GLOBAL.get_or_init(|| LanguageDetector::new(Box::new(TrigramLanguageId)))
    }

    /// Identify the language of `text`. Never fails: empty or
    /// undecidable input comes back as "xx" with a zero score.
    pub fn detect(&self, text: &str) -> DetectionResult {
        match self.engine.identify(text) {
            Some((language, score)) => DetectionResult { language, score },
            None => DetectionResult {
                language: UNKNOWN_LANG.to_string(),
                score: 0.0,
            },
        }
    }
}
