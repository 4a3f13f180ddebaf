#[cfg(test)]
mod tests;

use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::detect::LanguageDetector;
use crate::nlp::{AnnotateError, Annotation};
use crate::registry::PipelineRegistry;

/// Text parsed on behalf of a request that brought none of its own
pub const PLACEHOLDER_TEXT: &str = "You gave us no input.";

/// One parse request, already decoded from the transport
#[derive(Debug, Clone, Default)]
pub struct ParseRequest {
    /// Raw text to parse; may be empty
    pub text: String,
    /// Render the dependency arcs as SVG too
    pub want_svg: bool,
}

/// Whether a response carries a parse or an in-band failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// What goes back to the caller, parse or not.
///
/// `model` and `lang` are always filled in so the caller can tell which
/// pipeline handled the request even when the parse itself failed.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResponse {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Name of the pipeline that served the request
    pub model: String,
    /// Detected language of the input
    pub lang: String,
    /// Language identification time in milliseconds
    pub lang_detect_msec: u64,
    #[serde(flatten)]
    pub annotation: Option<Annotation>,
}

/// Failures the dispatcher cannot absorb into a response
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No pipelines are loaded")]
    NoPipelines,

    #[error(transparent)]
    Annotate(#[from] AnnotateError),
}

/// Serializes parse requests onto resident pipelines.
///
/// Language identification runs concurrently, but the parse itself is
/// guarded by one process-wide lock: pipelines are not reentrant, and a
/// single in-flight parse keeps memory use predictable.
pub struct Dispatcher {
    registry: PipelineRegistry,
    detector: &'static LanguageDetector,
    parse_lock: Mutex<()>,
}

impl Dispatcher {
    /// Dispatcher over the process-wide language detector
    pub fn new(registry: PipelineRegistry) -> Self {
        Dispatcher::with_detector(registry, LanguageDetector::global())
    }

    /// Dispatcher over a specific detector instance
    pub fn with_detector(registry: PipelineRegistry, detector: &'static LanguageDetector) -> Self {
        Dispatcher {
            registry,
            detector,
            parse_lock: Mutex::new(()),
        }
    }

    /// Run one request to completion.
    ///
    /// Recoverable pipeline failures come back as an `Ok` response with
    /// an error status, so one oversized input cannot take the process
    /// down. Failures that may have corrupted pipeline state propagate
    /// as `Err` for the transport layer to report.
    pub fn handle(&self, request: &ParseRequest) -> Result<ParseResponse, DispatchError> {
        let text = if request.text.is_empty() {
            PLACEHOLDER_TEXT
        } else {
            request.text.as_str()
        };

        let started = Instant::now();
        let detection = self.detector.detect(text);
        let lang_detect_msec = started.elapsed().as_millis() as u64;
        tracing::debug!(
            language = %detection.language,
            score = detection.score,
            msec = lang_detect_msec,
            "language identified"
        );

        let entry = self
            .registry
            .select(None, Some(&detection.language), true)
            .ok_or(DispatchError::NoPipelines)?;

        let outcome = {
            let _guard = self.parse_lock.lock();
            entry.annotator().annotate(text, request.want_svg)
        };

        let mut response = ParseResponse {
            status: Status::Ok,
            error: None,
            model: entry.name().to_string(),
            lang: detection.language,
            lang_detect_msec,
            annotation: None,
        };

        match outcome {
            Ok(annotation) => {
                response.annotation = Some(annotation);
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(model = %response.model, error = %err, "parse failed, pipeline kept");
                response.status = Status::Error;
                response.error = Some(err.to_string());
            }
            Err(err) => return Err(DispatchError::Annotate(err)),
        }

        Ok(response)
    }
}
