#[cfg(test)]
mod tests;

use std::str::FromStr;

use crate::nlp::{self, backend, Annotator, Device};

/// One pipeline requested on the command line, as language:device:model
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub language: String,
    pub device: Device,
    pub model: String,
}

impl PipelineConfig {
    /// Parse a "language:device:model" triple, e.g. "en:cpu:en_rules_core"
    pub fn parse_cli(raw: &str) -> Result<Self, String> {
        let mut parts = raw.splitn(3, ':');
        let (language, device, model) = match (parts.next(), parts.next(), parts.next()) {
            (Some(l), Some(d), Some(m)) if !l.is_empty() && !m.is_empty() => (l, d, m),
            _ => return Err(format!("expected language:device:model, got {raw:?}")),
        };
        let device = Device::from_str(device).map_err(|e| e.to_string())?;
        Ok(PipelineConfig {
            language: language.to_string(),
            device,
            model: model.to_string(),
        })
    }
}

/// A loaded pipeline together with the metadata used to select it
pub struct PipelineEntry {
    language: String,
    device: Device,
    name: String,
    annotator: Box<dyn Annotator>,
}

impl PipelineEntry {
    pub fn new(
        language: impl Into<String>,
        device: Device,
        name: impl Into<String>,
        annotator: Box<dyn Annotator>,
    ) -> Self {
        PipelineEntry {
            language: language.into(),
            device,
            name: name.into(),
            annotator,
        }
    }

    /// Language code this pipeline serves
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Model name this pipeline was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device the pipeline was loaded for
    pub fn device(&self) -> Device {
        self.device
    }

    /// The annotator itself; callers borrow it, the entry keeps ownership
    pub fn annotator(&self) -> &dyn Annotator {
        self.annotator.as_ref()
    }
}

/// Ordered, immutable collection of resident pipelines.
///
/// Built once at startup; selection is a linear scan, which is fine for
/// the handful of pipelines a process typically keeps loaded.
pub struct PipelineRegistry {
    entries: Vec<PipelineEntry>,
}

impl PipelineRegistry {
    /// Load every configured pipeline in order.
    ///
    /// Each entry first switches the process-wide backend to its device,
    /// then instantiates its model. Entries that fail either step are
    /// logged and skipped; the survivors keep the configured order.
    pub fn load(configs: &[PipelineConfig]) -> Self {
        let mut entries = Vec::with_capacity(configs.len());
        for config in configs {
            if let Err(err) = backend::require(config.device) {
                tracing::warn!(
                    model = %config.model,
                    device = %config.device,
                    error = %err,
                    "skipping pipeline, backend unavailable"
                );
                continue;
            }
            tracing::info!(
                model = %config.model,
                language = %config.language,
                device = %config.device,
                "loading pipeline"
            );
            match nlp::load(&config.model) {
                Ok(annotator) => entries.push(PipelineEntry::new(
                    config.language.clone(),
                    config.device,
                    config.model.clone(),
                    annotator,
                )),
                Err(err) => {
                    tracing::warn!(model = %config.model, error = %err, "skipping pipeline, load failed");
                }
            }
        }
        PipelineRegistry { entries }
    }

    /// Build a registry from already constructed entries
    pub fn from_entries(entries: Vec<PipelineEntry>) -> Self {
        PipelineRegistry { entries }
    }

    /// Pick a pipeline for a request.
    ///
    /// Tries an exact model name first, then the first pipeline whose
    /// language matches, then the first loaded pipeline if fallback is
    /// allowed. A miss at one step falls through to the next.
    pub fn select(
        &self,
        name: Option<&str>,
        language: Option<&str>,
        allow_fallback: bool,
    ) -> Option<&PipelineEntry> {
        if let Some(name) = name {
            if let Some(entry) = self.entries.iter().find(|e| e.name() == name) {
                return Some(entry);
            }
        }
        if let Some(language) = language {
            if let Some(entry) = self.entries.iter().find(|e| e.language() == language) {
                return Some(entry);
            }
        }
        if allow_fallback {
            return self.entries.first();
        }
        None
    }

    /// Number of loaded pipelines
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing could be loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loaded pipelines in selection order
    pub fn entries(&self) -> impl Iterator<Item = &PipelineEntry> {
        self.entries.iter()
    }
}
