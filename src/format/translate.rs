//! Translation-aware formatter.
//!
//! Wraps [`Normalizer`] and adds a memoized `translate_label` operation backed
//! by an external [`Translator`]. When translation is disabled, has no
//! credential, or the service fails, labels pass through untranslated and only
//! normalization applies.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::core::errors::Result;
use crate::format::normalize::{LabelFormatter, Normalizer};

/// Machine translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`. `source_lang = None` asks the service to detect the language.
    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<String>;

    /// Verify that the configured credential is accepted.
    async fn check_credential(&self) -> Result<()> {
        Ok(())
    }
}

/// Normalizer plus a translate-once cache keyed by raw label.
pub struct TranslatingFormatter {
    normalizer: Normalizer,
    translator: Option<Arc<dyn Translator>>,
    source_lang: Option<String>,
    target_lang: String,
    active: bool,
    cache: IndexMap<String, String>,
    outputs: HashSet<String>,
}

impl TranslatingFormatter {
    /// Formatter that never translates
    pub fn disabled() -> Self {
        Self {
            normalizer: Normalizer::new(),
            translator: None,
            source_lang: None,
            target_lang: String::new(),
            active: false,
            cache: IndexMap::new(),
            outputs: HashSet::new(),
        }
    }

    /// Formatter backed by `translator`. Call [`activate`](Self::activate) before use.
    pub fn new(
        translator: Arc<dyn Translator>,
        source_lang: Option<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            translator: Some(translator),
            source_lang,
            target_lang: target_lang.into(),
            ..Self::disabled()
        }
    }

    /// Check the translator's credential once and enable translation if it passes.
    pub async fn activate(&mut self) -> bool {
        let Some(translator) = &self.translator else {
            return false;
        };
        match translator.check_credential().await {
            Ok(()) => {
                info!(target_lang = %self.target_lang, "Translation enabled");
                self.active = true;
            }
            Err(err) => {
                warn!(error = %err, "Translation credential rejected; labels stay untranslated");
                self.active = false;
            }
        }
        self.active
    }

    /// Whether labels are currently sent to the translator
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Translate a raw label at most once per run.
    ///
    /// A label that is already a cached translation is returned unchanged. A
    /// failed call is cached as the raw label, so it is not retried.
    pub async fn translate_label(&mut self, raw: &str) -> String {
        if !self.active || raw.trim().is_empty() {
            return raw.to_string();
        }
        if let Some(hit) = self.cache.get(raw) {
            return hit.clone();
        }
        if self.outputs.contains(raw) {
            return raw.to_string();
        }
        let Some(translator) = self.translator.clone() else {
            return raw.to_string();
        };

        let translated = match translator
            .translate(raw, self.source_lang.as_deref(), &self.target_lang)
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                debug!(raw, translated = %text, "Translated label");
                text
            }
            Ok(_) => {
                warn!(raw, "Translator returned an empty label; keeping original");
                raw.to_string()
            }
            Err(err) => {
                warn!(raw, error = %err, "Translation failed; keeping original label");
                raw.to_string()
            }
        };

        self.cache.insert(raw.to_string(), translated.clone());
        self.outputs.insert(translated.clone());
        translated
    }

    /// Raw → translated entries, in the order they were first requested
    pub fn cache(&self) -> &IndexMap<String, String> {
        &self.cache
    }
}

impl LabelFormatter for TranslatingFormatter {
    fn format(&self, text: Option<&str>) -> Result<String> {
        self.normalizer.format(text)
    }
}
