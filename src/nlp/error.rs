use thiserror::Error;

/// Failures raised by an annotator while processing one input
#[derive(Debug, Error)]
pub enum AnnotateError {
    /// The pipeline ran out of its working budget on this input.
    /// The pipeline itself stays usable for the next request.
    #[error("Pipeline budget exhausted: {detail}")]
    ResourceExhausted { detail: String },

    /// Anything else; the caller should treat the request as failed.
    #[error("Annotator failure: {0}")]
    Internal(String),
}

impl AnnotateError {
    /// True when the pipeline survives the failure and may be reused as-is
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnnotateError::ResourceExhausted { .. })
    }
}

/// Failures raised while instantiating a pipeline
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unknown model {name:?}, available models are: {available}")]
    UnknownModel { name: String, available: String },
}

/// Failures raised by the compute backend toggle
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("GPU requested but no GPU runtime is linked into this build")]
    GpuUnavailable,
}

/// Failure raised when a device preference string is not recognized
#[derive(Debug, Error)]
#[error("Unknown device preference {0:?}, expected \"cpu\" or \"gpu\"")]
pub struct UnknownDevice(pub String);
