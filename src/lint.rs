//! Translation linting.
//!
//! Rejects translations that obviously broke the source string: dropped
//! printf-style format specifiers, lost `{placeholder}` tokens, or
//! mismatched leading/trailing newlines.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::catalog::Language;

// Regex patterns for extraction (cached for performance)
static SPECIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Check that a translation preserves the mechanical structure of its
/// source string.
///
/// Returns `true` when the translation passes every rule:
/// - format specifiers (`%@`, `%d`, `%lld`, `%1$@`, ...) form the same
///   multiset, ignoring positional prefixes
/// - `{placeholder}` token counts match when the source has any
/// - leading/trailing newlines and emptiness match
pub fn lint(
    source: &str,
    _source_language: &Language,
    translation: &str,
    target_language: &Language,
) -> bool {
    let mut failures: Vec<String> = Vec::new();

    let mut source_specifiers = extract_specifiers(source);
    let mut translation_specifiers = extract_specifiers(translation);
    source_specifiers.sort();
    translation_specifiers.sort();
    if source_specifiers != translation_specifiers {
        failures.push(format!(
            "format specifier mismatch: source has {:?}, translation has {:?}",
            source_specifiers, translation_specifiers
        ));
    }

    let source_placeholders = count_placeholders(source);
    if source_placeholders > 0 {
        let translation_placeholders = count_placeholders(translation);
        if source_placeholders != translation_placeholders {
            failures.push(format!(
                "placeholder count mismatch: source has {}, translation has {}",
                source_placeholders, translation_placeholders
            ));
        }
    }

    if source.is_empty() != translation.is_empty() {
        failures.push("emptiness mismatch".to_string());
    }
    if source.starts_with('\n') != translation.starts_with('\n') {
        failures.push("leading newline mismatch".to_string());
    }
    if source.ends_with('\n') != translation.ends_with('\n') {
        failures.push("trailing newline mismatch".to_string());
    }

    if failures.is_empty() {
        true
    } else {
        debug!(
            "Lint rejected translation for {}: {}",
            target_language.code(),
            failures.join("; ")
        );
        false
    }
}

/// Extract format specifiers, normalized by stripping positional prefixes
/// (`%1$@` and `%@` compare equal).
fn extract_specifiers(text: &str) -> Vec<String> {
    let regex = SPECIFIER_REGEX
        .get_or_init(|| Regex::new(r"%(?:(\d+)\$)?((?:ll|hh|l|h)?[@dioxXufFeEgGaAcs])").unwrap());

    // Literal %% is an escaped percent sign, not a specifier
    let text = text.replace("%%", "");

    regex
        .captures_iter(&text)
        .filter_map(|cap| cap.get(2).map(|m| format!("%{}", m.as_str())))
        .collect()
}

/// Count `{placeholder}`-style brace tokens.
fn count_placeholders(text: &str) -> usize {
    let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{[A-Za-z0-9_]*\}").unwrap());
    regex.find_iter(text).count()
}
