use super::*;
use crate::nlp::{AnnotateError, Annotation};

struct StubAnnotator;

impl Annotator for StubAnnotator {
    fn annotate(&self, _text: &str, _want_svg: bool) -> Result<Annotation, AnnotateError> {
        Ok(Annotation {
            parse_msec: 0,
            tokens: Vec::new(),
            sentences: Vec::new(),
            entities: Vec::new(),
            svg: None,
        })
    }
}

fn entry(language: &str, name: &str) -> PipelineEntry {
    PipelineEntry::new(language, Device::Cpu, name, Box::new(StubAnnotator))
}

fn three_pipelines() -> PipelineRegistry {
    PipelineRegistry::from_entries(vec![
        entry("en", "m_en"),
        entry("nl", "m_nl"),
        entry("en", "m_en_2"),
    ])
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_exact_name_beats_language() {
    let registry = three_pipelines();
    let picked = registry.select(Some("m_nl"), Some("en"), true).unwrap();
    assert_eq!(picked.name(), "m_nl");
}

#[test]
fn test_name_miss_falls_through_to_language() {
    let registry = three_pipelines();
    let picked = registry.select(Some("missing"), Some("nl"), false).unwrap();
    assert_eq!(picked.name(), "m_nl");
}

#[test]
fn test_first_language_match_wins() {
    let registry = three_pipelines();
    let picked = registry.select(None, Some("en"), false).unwrap();
    assert_eq!(picked.name(), "m_en");
}

#[test]
fn test_fallback_is_first_loaded_pipeline() {
    let registry = three_pipelines();
    let picked = registry.select(None, Some("de"), true).unwrap();
    assert_eq!(picked.name(), "m_en");
}

#[test]
fn test_no_fallback_returns_none() {
    let registry = three_pipelines();
    assert!(registry.select(None, Some("de"), false).is_none());
    assert!(registry.select(None, None, false).is_none());
}

#[test]
fn test_empty_registry_selects_nothing() {
    let registry = PipelineRegistry::from_entries(Vec::new());
    assert!(registry.select(None, None, true).is_none());
    assert!(registry.is_empty());
}

// ============================================================================
// Loading Tests
// ============================================================================

fn config(language: &str, device: Device, model: &str) -> PipelineConfig {
    PipelineConfig {
        language: language.to_string(),
        device,
        model: model.to_string(),
    }
}

#[test]
fn test_load_keeps_configured_order() {
    let registry = PipelineRegistry::load(&[
        config("en", Device::Cpu, "en_rules_core"),
        config("nl", Device::Cpu, "nl_rules_core"),
    ]);
    let names: Vec<&str> = registry.entries().map(|e| e.name()).collect();
    assert_eq!(names, vec!["en_rules_core", "nl_rules_core"]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_load_skips_unknown_models() {
    let registry = PipelineRegistry::load(&[
        config("en", Device::Cpu, "en_missing_model"),
        config("nl", Device::Cpu, "nl_rules_core"),
    ]);
    let names: Vec<&str> = registry.entries().map(|e| e.name()).collect();
    assert_eq!(names, vec!["nl_rules_core"]);
}

#[test]
fn test_load_skips_gpu_pipelines() {
    let registry = PipelineRegistry::load(&[
        config("en", Device::Gpu, "en_rules_core"),
        config("nl", Device::Cpu, "nl_rules_core"),
    ]);
    let names: Vec<&str> = registry.entries().map(|e| e.name()).collect();
    assert_eq!(names, vec!["nl_rules_core"]);
}

#[test]
fn test_load_survives_total_failure() {
    let registry = PipelineRegistry::load(&[config("en", Device::Cpu, "bogus_model")]);
    assert!(registry.is_empty());
}

#[test]
fn test_entry_exposes_its_metadata() {
    let registry = PipelineRegistry::load(&[config("en", Device::Cpu, "en_rules_core")]);
    let entry = registry.select(None, None, true).unwrap();
    assert_eq!(entry.language(), "en");
    assert_eq!(entry.name(), "en_rules_core");
    assert_eq!(entry.device(), Device::Cpu);
}

// ============================================================================
// CLI Config Tests
// ============================================================================

#[test]
fn test_parse_cli_triple() {
    let config = PipelineConfig::parse_cli("en:cpu:en_rules_core").unwrap();
    assert_eq!(config.language, "en");
    assert_eq!(config.device, Device::Cpu);
    assert_eq!(config.model, "en_rules_core");
}

#[test]
fn test_parse_cli_rejects_bad_device() {
    let err = PipelineConfig::parse_cli("en:tpu:en_rules_core").unwrap_err();
    assert!(err.contains("tpu"));
}

#[test]
fn test_parse_cli_rejects_wrong_shape() {
    assert!(PipelineConfig::parse_cli("nonsense").is_err());
    assert!(PipelineConfig::parse_cli("en:cpu:").is_err());
    assert!(PipelineConfig::parse_cli(":cpu:model").is_err());
}
