use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Language, LocalizableString, TranslationState};

/// Raw document shape. `strings` and `extra` are order-preserving maps
/// (serde_json's preserve_order feature), and unknown top-level keys such
/// as `version` ride along in `extra` so the writer never drops them.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(rename = "sourceLanguage")]
    source_language: String,
    #[serde(default)]
    strings: Map<String, Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// An in-memory string catalog.
///
/// All mutation goes through the state-machine methods below; worker
/// tasks never hold a catalog handle, they hand their results to the
/// coordinator which applies them here and persists.
#[derive(Debug, Clone)]
pub struct Catalog {
    source_language: Language,
    target_languages: BTreeSet<Language>,
    doc: CatalogDocument,
}

impl Catalog {
    /// Parse a catalog file.
    ///
    /// When `override_languages` is given, each group is resized so its
    /// target-language set equals the override: translations for dropped
    /// languages are discarded, added languages start out as `new`.
    pub fn load(path: &Path, override_languages: Option<&[Language]>) -> Result<Catalog> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json(&text, override_languages)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))
    }

    pub fn from_json(text: &str, override_languages: Option<&[Language]>) -> Result<Catalog> {
        let doc: CatalogDocument = serde_json::from_str(text)?;
        let source_language = Language::new(doc.source_language.clone());

        let mut catalog = Catalog {
            source_language,
            target_languages: BTreeSet::new(),
            doc,
        };
        catalog.target_languages = catalog.languages_in_document();

        if let Some(languages) = override_languages {
            catalog.apply_language_override(languages);
        }
        Ok(catalog)
    }

    /// Languages present in any group's localizations, minus the source.
    fn languages_in_document(&self) -> BTreeSet<Language> {
        let mut languages = BTreeSet::new();
        for group in self.doc.strings.values() {
            let Some(localizations) = group.get("localizations").and_then(Value::as_object) else {
                continue;
            };
            for code in localizations.keys() {
                let language = Language::new(code.clone());
                if language != self.source_language {
                    languages.insert(language);
                }
            }
        }
        languages
    }

    fn apply_language_override(&mut self, languages: &[Language]) {
        let requested: BTreeSet<Language> = languages
            .iter()
            .filter(|l| **l != self.source_language)
            .cloned()
            .collect();

        // Discard localizations for languages outside the override
        let source = self.source_language.clone();
        for group in self.doc.strings.values_mut() {
            let Some(localizations) = group
                .as_object_mut()
                .and_then(|g| g.get_mut("localizations"))
                .and_then(Value::as_object_mut)
            else {
                continue;
            };
            localizations.retain(|code, _| {
                code.as_str() == source.code() || requested.contains(&Language::new(code.clone()))
            });
        }

        self.target_languages = requested;
    }

    /// Atomically rewrite the catalog: write a sibling temp file, then
    /// rename it over the destination. A crash mid-write leaves the
    /// previous snapshot intact.
    pub fn write(&self, path: &Path) -> Result<()> {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            bail!("Catalog path has no file name: {}", path.display());
        };
        let tmp = path.with_file_name(format!("{}.tmp", file_name));

        fs::write(&tmp, self.to_json()?)
            .with_context(|| format!("Failed to write catalog {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace catalog {}", path.display()))?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.doc)?;
        text.push('\n');
        Ok(text)
    }

    pub fn source_language(&self) -> &Language {
        &self.source_language
    }

    pub fn target_languages(&self) -> &BTreeSet<Language> {
        &self.target_languages
    }

    pub fn keys(&self) -> Vec<String> {
        self.doc.strings.keys().cloned().collect()
    }

    /// One localizable string per group per language (targets plus the
    /// source row).
    pub fn localizable_strings_count(&self) -> usize {
        self.doc.strings.len() * (self.target_languages.len() + 1)
    }

    pub fn comment(&self, key: &str) -> Option<String> {
        self.doc
            .strings
            .get(key)?
            .get("comment")?
            .as_str()
            .map(str::to_string)
    }

    /// The text to translate: the source-language localization when one
    /// exists, otherwise the key itself.
    pub fn source_value(&self, key: &str) -> String {
        self.string_unit(key, &self.source_language)
            .and_then(|unit| unit.get("value"))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(key)
            .to_string()
    }

    pub fn state(&self, key: &str, language: &Language) -> TranslationState {
        self.string_unit(key, language)
            .and_then(|unit| unit.get("state"))
            .and_then(Value::as_str)
            .and_then(TranslationState::parse)
            .unwrap_or(TranslationState::New)
    }

    pub fn translated_value(&self, key: &str, language: &Language) -> Option<String> {
        self.string_unit(key, language)?
            .get("value")?
            .as_str()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Snapshot of every entry that still needs a translation, in key
    /// order then language order.
    pub fn pending_entries(&self) -> Vec<LocalizableString> {
        let mut entries = Vec::new();
        for key in self.doc.strings.keys() {
            for language in &self.target_languages {
                let state = self.state(key, language);
                if state.is_pending() {
                    entries.push(self.snapshot(key, language, state));
                }
            }
        }
        entries
    }

    /// Snapshot of every entry eligible for review: state `needs_review`
    /// with a translated value, optionally filtered by language.
    pub fn review_entries(&self, filter: Option<&BTreeSet<Language>>) -> Vec<LocalizableString> {
        let mut entries = Vec::new();
        for key in self.doc.strings.keys() {
            for language in &self.target_languages {
                if let Some(filter) = filter {
                    if !filter.contains(language) {
                        continue;
                    }
                }
                let state = self.state(key, language);
                if state == TranslationState::NeedsReview
                    && self.translated_value(key, language).is_some()
                {
                    entries.push(self.snapshot(key, language, state));
                }
            }
        }
        entries
    }

    fn snapshot(&self, key: &str, language: &Language, state: TranslationState) -> LocalizableString {
        LocalizableString {
            key: key.to_string(),
            source_value: self.source_value(key),
            comment: self.comment(key),
            target_language: language.clone(),
            translated_value: self.translated_value(key, language),
            state,
        }
    }

    // ==================== State machine ====================

    /// Record a translation: sets the value and moves the entry to
    /// `translated`, creating the localization entry if absent.
    pub fn set_translation(&mut self, key: &str, language: &Language, value: &str) {
        if let Some(unit) = self.string_unit_mut(key, language) {
            unit.insert(
                "state".to_string(),
                Value::String(TranslationState::Translated.as_str().to_string()),
            );
            unit.insert("value".to_string(), Value::String(value.to_string()));
        } else {
            debug!("set_translation on unknown key {:?}", key);
        }
    }

    /// `translated` → `needs_review`; no-op from any other state.
    pub fn set_needs_review(&mut self, key: &str, language: &Language) {
        if self.state(key, language) != TranslationState::Translated {
            debug!("set_needs_review ignored for {:?} ({})", key, language);
            return;
        }
        if let Some(unit) = self.string_unit_mut(key, language) {
            unit.insert(
                "state".to_string(),
                Value::String(TranslationState::NeedsReview.as_str().to_string()),
            );
        }
    }

    /// `needs_review` → `translated`; no-op from any other state.
    pub fn set_translated(&mut self, key: &str, language: &Language) {
        if self.state(key, language) != TranslationState::NeedsReview {
            debug!("set_translated ignored for {:?} ({})", key, language);
            return;
        }
        if let Some(unit) = self.string_unit_mut(key, language) {
            unit.insert(
                "state".to_string(),
                Value::String(TranslationState::Translated.as_str().to_string()),
            );
        }
    }

    // ==================== Document access ====================

    fn string_unit(&self, key: &str, language: &Language) -> Option<&Map<String, Value>> {
        self.doc
            .strings
            .get(key)?
            .get("localizations")?
            .as_object()?
            .get(language.code())?
            .get("stringUnit")?
            .as_object()
    }

    fn string_unit_mut(&mut self, key: &str, language: &Language) -> Option<&mut Map<String, Value>> {
        let group = self.doc.strings.get_mut(key)?.as_object_mut()?;
        let localizations = group
            .entry("localizations")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?;
        let localization = localizations
            .entry(language.code().to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?;
        localization
            .entry("stringUnit")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
    }
}
