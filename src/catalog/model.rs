use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque locale identifier (`en`, `fr-CA`). Two languages compare
/// equal iff their identifiers match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Language(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Language::new(code)
    }
}

/// Per-string lifecycle state.
///
/// `stale` comes from the file loader when the source string changed
/// underneath an old translation; the translator treats it as `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationState {
    New,
    Translated,
    NeedsReview,
    Stale,
}

impl TranslationState {
    pub fn parse(value: &str) -> Option<TranslationState> {
        match value {
            "new" => Some(TranslationState::New),
            "translated" => Some(TranslationState::Translated),
            "needs_review" => Some(TranslationState::NeedsReview),
            "stale" => Some(TranslationState::Stale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationState::New => "new",
            TranslationState::Translated => "translated",
            TranslationState::NeedsReview => "needs_review",
            TranslationState::Stale => "stale",
        }
    }

    /// Whether this entry still needs a translation.
    pub fn is_pending(&self) -> bool {
        !matches!(self, TranslationState::Translated)
    }
}

/// A read-only snapshot of one (key, target language) localization,
/// materialized for task enumeration. Mutations go through the catalog.
#[derive(Debug, Clone)]
pub struct LocalizableString {
    pub key: String,
    pub source_value: String,
    pub comment: Option<String>,
    pub target_language: Language,
    pub translated_value: Option<String>,
    pub state: TranslationState,
}
