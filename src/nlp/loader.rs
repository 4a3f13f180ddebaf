use super::error::LoadError;
use super::rules::RuleAnnotator;
use super::Annotator;

/// Model names this build can instantiate, in catalog order
pub const AVAILABLE_MODELS: &[&str] = &[
    "en_rules_core",
    "nl_rules_core",
    "de_rules_core",
    "fr_rules_core",
    "es_rules_core",
    "xx_rules_core",
];

/// Instantiate the named model.
///
/// Loading is synchronous and happens once per pipeline at startup; the
/// returned annotator then stays resident for the life of the process.
pub fn load(name: &str) -> Result<Box<dyn Annotator>, LoadError> {
    let annotator = match name {
        "en_rules_core" => RuleAnnotator::new("en"),
        "nl_rules_core" => RuleAnnotator::new("nl"),
        "de_rules_core" => RuleAnnotator::new("de"),
        "fr_rules_core" => RuleAnnotator::new("fr"),
        "es_rules_core" => RuleAnnotator::new("es"),
        "xx_rules_core" => RuleAnnotator::new("xx"),
        _ => {
            return Err(LoadError::UnknownModel {
                name: name.to_string(),
                available: AVAILABLE_MODELS.join(", "),
            })
        }
    };
    Ok(Box::new(annotator))
}
