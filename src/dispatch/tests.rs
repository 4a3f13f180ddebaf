use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::*;
use crate::detect::{LanguageDetector, LanguageId};
use crate::nlp::{Annotator, Device};
use crate::registry::{PipelineConfig, PipelineEntry, PipelineRegistry};

fn empty_annotation() -> Annotation {
    Annotation {
        parse_msec: 0,
        tokens: Vec::new(),
        sentences: Vec::new(),
        entities: Vec::new(),
        svg: None,
    }
}

struct EchoAnnotator {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Annotator for EchoAnnotator {
    fn annotate(&self, text: &str, _want_svg: bool) -> Result<Annotation, AnnotateError> {
        self.seen.lock().push(text.to_string());
        Ok(empty_annotation())
    }
}

/// Fails the first call with the given error, then succeeds forever
struct FailOnce {
    error: fn() -> AnnotateError,
    tripped: AtomicBool,
}

impl Annotator for FailOnce {
    fn annotate(&self, _text: &str, _want_svg: bool) -> Result<Annotation, AnnotateError> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            return Err((self.error)());
        }
        Ok(empty_annotation())
    }
}

struct OverlapWatch {
    active: AtomicUsize,
    overlapped: AtomicBool,
}

struct SlowAnnotator {
    watch: Arc<OverlapWatch>,
}

impl Annotator for SlowAnnotator {
    fn annotate(&self, _text: &str, _want_svg: bool) -> Result<Annotation, AnnotateError> {
        if self.watch.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.watch.overlapped.store(true, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_millis(25));
        self.watch.active.fetch_sub(1, Ordering::SeqCst);
        Ok(empty_annotation())
    }
}

struct Scripted(&'static str);

impl LanguageId for Scripted {
    fn identify(&self, _text: &str) -> Option<(String, f64)> {
        Some((self.0.to_string(), 0.9))
    }
}

fn scripted_detector(code: &'static str) -> &'static LanguageDetector {
    Box::leak(Box::new(LanguageDetector::new(Box::new(Scripted(code)))))
}

fn entry(language: &str, name: &str, annotator: Box<dyn Annotator>) -> PipelineEntry {
    PipelineEntry::new(language, Device::Cpu, name, annotator)
}

fn request(text: &str) -> ParseRequest {
    ParseRequest {
        text: text.to_string(),
        want_svg: false,
    }
}

// ============================================================================
// Placeholder and Selection Tests
// ============================================================================

#[test]
fn test_empty_text_parses_the_placeholder() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = PipelineRegistry::from_entries(vec![entry(
        "en",
        "m_en",
        Box::new(EchoAnnotator { seen: seen.clone() }),
    )]);
    let dispatcher = Dispatcher::with_detector(registry, scripted_detector("en"));

    let response = dispatcher.handle(&request("")).unwrap();

    assert_eq!(seen.lock().clone(), vec![PLACEHOLDER_TEXT.to_string()]);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.model, "m_en");
    assert_eq!(response.lang, "en");
}

#[test]
fn test_detected_language_selects_the_pipeline() {
    let registry = PipelineRegistry::from_entries(vec![
        entry("en", "m_en", Box::new(FailOnce { error: || AnnotateError::Internal("wrong pipeline".into()), tripped: AtomicBool::new(true) })),
        entry("nl", "m_nl", Box::new(FailOnce { error: || AnnotateError::Internal("wrong pipeline".into()), tripped: AtomicBool::new(true) })),
    ]);
    let dispatcher = Dispatcher::with_detector(registry, scripted_detector("nl"));

    let response = dispatcher.handle(&request("wat een mooie dag")).unwrap();
    assert_eq!(response.model, "m_nl");
    assert_eq!(response.lang, "nl");
}

#[test]
fn test_unmatched_language_falls_back_to_first_pipeline() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let registry = PipelineRegistry::from_entries(vec![entry(
        "en",
        "m_en",
        Box::new(EchoAnnotator { seen }),
    )]);
    let dispatcher = Dispatcher::with_detector(registry, scripted_detector("de"));

    let response = dispatcher.handle(&request("Guten Morgen")).unwrap();
    assert_eq!(response.model, "m_en");
    // the reported language is what detection said, not what served it
    assert_eq!(response.lang, "de");
}

#[test]
fn test_empty_registry_refuses_to_dispatch() {
    let dispatcher = Dispatcher::with_detector(
        PipelineRegistry::from_entries(Vec::new()),
        scripted_detector("en"),
    );
    let err = dispatcher.handle(&request("hello")).unwrap_err();
    assert!(matches!(err, DispatchError::NoPipelines));
}

// ============================================================================
// Failure Handling Tests
// ============================================================================

#[test]
fn test_recoverable_failure_stays_in_band() {
    let registry = PipelineRegistry::from_entries(vec![entry(
        "en",
        "m_en",
        Box::new(FailOnce {
            error: || AnnotateError::ResourceExhausted {
                detail: "scripted pressure".to_string(),
            },
            tripped: AtomicBool::new(false),
        }),
    )]);
    let dispatcher = Dispatcher::with_detector(registry, scripted_detector("en"));

    let failed = dispatcher.handle(&request("first")).unwrap();
    assert_eq!(failed.status, Status::Error);
    assert!(failed.error.as_deref().unwrap().contains("scripted pressure"));
    assert_eq!(failed.model, "m_en");
    assert_eq!(failed.lang, "en");
    assert!(failed.annotation.is_none());

    // the pipeline and its lock both survive the failure
    let recovered = dispatcher.handle(&request("second")).unwrap();
    assert_eq!(recovered.status, Status::Ok);
}

#[test]
fn test_fatal_failure_propagates_and_releases_the_lock() {
    let registry = PipelineRegistry::from_entries(vec![entry(
        "en",
        "m_en",
        Box::new(FailOnce {
            error: || AnnotateError::Internal("state corrupted".to_string()),
            tripped: AtomicBool::new(false),
        }),
    )]);
    let dispatcher = Dispatcher::with_detector(registry, scripted_detector("en"));

    let err = dispatcher.handle(&request("first")).unwrap_err();
    assert!(matches!(err, DispatchError::Annotate(_)));

    let recovered = dispatcher.handle(&request("second")).unwrap();
    assert_eq!(recovered.status, Status::Ok);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_parses_never_overlap() {
    let watch = Arc::new(OverlapWatch {
        active: AtomicUsize::new(0),
        overlapped: AtomicBool::new(false),
    });
    let registry = PipelineRegistry::from_entries(vec![entry(
        "en",
        "m_en",
        Box::new(SlowAnnotator { watch: watch.clone() }),
    )]);
    let dispatcher = Arc::new(Dispatcher::with_detector(registry, scripted_detector("en")));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || dispatcher.handle(&request(&format!("request {i}"))))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert!(!watch.overlapped.load(Ordering::SeqCst));
}

// ============================================================================
// End-to-End Shape Tests
// ============================================================================

fn real_dispatcher() -> Dispatcher {
    let registry = PipelineRegistry::load(&[PipelineConfig {
        language: "en".to_string(),
        device: Device::Cpu,
        model: "en_rules_core".to_string(),
    }]);
    Dispatcher::new(registry)
}

#[test]
fn test_response_serialization_shape() {
    let dispatcher = real_dispatcher();
    let response = dispatcher
        .handle(&request("The server answered every question."))
        .unwrap();
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["status"], "ok");
    assert_eq!(value["model"], "en_rules_core");
    assert!(value["lang"].is_string());
    assert!(value["lang_detect_msec"].is_u64());
    assert!(value["tokens"].is_array());
    assert!(!value["tokens"].as_array().unwrap().is_empty());
    assert!(value.get("error").is_none());
    assert!(value.get("svg").is_none());
}

#[test]
fn test_svg_flag_reaches_the_pipeline() {
    let dispatcher = real_dispatcher();
    let response = dispatcher
        .handle(&ParseRequest {
            text: "Dogs bark loudly.".to_string(),
            want_svg: true,
        })
        .unwrap();
    let svg = response.annotation.unwrap().svg.unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn test_same_input_gets_same_answer() {
    let dispatcher = real_dispatcher();
    let text = "Deterministic behavior makes debugging gentle.";
    let first = dispatcher.handle(&request(text)).unwrap();
    let second = dispatcher.handle(&request(text)).unwrap();
    assert_eq!(first.model, second.model);
    assert_eq!(first.lang, second.lang);
}
