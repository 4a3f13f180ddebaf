mod annotation;
pub mod backend;
mod error;
mod loader;
mod rules;
mod svg;


pub use annotation::{Annotation, Entity, SentenceSpan, Token};
pub use backend::Device;
pub use error::{AnnotateError, BackendError, LoadError, UnknownDevice};
pub use loader::{load, AVAILABLE_MODELS};
pub use rules::{RuleAnnotator, DEFAULT_TEXT_BUDGET};

/// A loaded pipeline that turns raw text into an annotation.
///
/// Implementations are expected to be deterministic for a given input
/// and to keep themselves usable after returning a recoverable error.
pub trait Annotator: Send + Sync {
    /// Annotate one input. `want_svg` additionally renders the
    /// dependency arcs as an SVG document.
    fn annotate(&self, text: &str, want_svg: bool) -> Result<Annotation, AnnotateError>;
}
