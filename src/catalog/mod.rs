//! String catalog model.
//!
//! A catalog is a JSON document with a `sourceLanguage`, a `strings`
//! object keyed by source string (or developer identifier), and per-key
//! `localizations` holding one `stringUnit` per language. The document
//! backing store preserves key order and unknown fields so a load → write
//! round trip is stable; the typed layer on top drives the per-string
//! state machine.

mod document;
mod model;

pub use document::Catalog;
pub use model::{Language, LocalizableString, TranslationState};
