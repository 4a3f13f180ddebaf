// Public API exports
pub mod detect;
pub mod dispatch;
pub mod nlp;
pub mod registry;
pub mod server;

// Re-export main types for convenience
pub use detect::{DetectionResult, LanguageDetector, LanguageId, UNKNOWN_LANG};

pub use dispatch::{
    DispatchError, Dispatcher, ParseRequest, ParseResponse, Status, PLACEHOLDER_TEXT,
};

pub use nlp::{AnnotateError, Annotation, Annotator, Device, Entity, SentenceSpan, Token};

pub use registry::{PipelineConfig, PipelineEntry, PipelineRegistry};

pub use server::{router, serve, ServerState, SharedState};
