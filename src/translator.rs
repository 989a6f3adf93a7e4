//! Catalog translation orchestration.
//!
//! Enumerates every pending entry of a catalog, fans the provider calls
//! out over the bounded worker pool, and applies completed results on the
//! coordinator side: workers return `TaskOutcome` values and never touch
//! the catalog, so mutations and persists are naturally serialized.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::catalog::{Catalog, Language, LocalizableString};
use crate::error::TranslateError;
use crate::lint::lint;
use crate::pool::WorkerPool;
use crate::provider::TranslationProvider;
use crate::retry::{with_retry, RetryConfig};

/// Entry count above which a run asks for confirmation first.
pub const CONFIRMATION_THRESHOLD: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Replace the catalog's own target set when present.
    pub target_languages: Option<Vec<Language>>,
    /// Write back into the input file instead of a `.loc.` sibling.
    pub overwrite: bool,
    /// Mark each new translation as needing review.
    pub set_needs_review_after_translating: bool,
    /// Skip the large-run confirmation prompt.
    pub skip_confirmation: bool,
}

/// What a worker task hands back to the coordinator.
enum TaskOutcome {
    Translated {
        key: String,
        language: Language,
        value: String,
    },
    Skipped,
}

/// Translate every pending entry of one catalog file.
///
/// Returns the number of newly translated entries. Per-entry failures are
/// logged and skipped; they never abort the file.
pub async fn translate_catalog(
    provider: Arc<dyn TranslationProvider>,
    path: &Path,
    options: &TranslateOptions,
    concurrent_tasks: usize,
) -> Result<usize> {
    let mut catalog = Catalog::load(path, options.target_languages.as_deref())?;

    let total = catalog.keys().len() * catalog.target_languages().len();
    if total > CONFIRMATION_THRESHOLD && !options.skip_confirmation {
        let stdin = std::io::stdin();
        if !confirm_large_run(total, &mut stdin.lock()) {
            println!("Translation canceled");
            std::process::exit(0);
        }
    }

    let entries = catalog.pending_entries();
    if entries.is_empty() {
        info!("{}: nothing to translate", path.display());
        return Ok(0);
    }
    info!("{}: translating {} entries", path.display(), entries.len());

    let target = output_path(path, options.overwrite);
    let source_language = catalog.source_language().clone();

    let mut pool = WorkerPool::new(concurrent_tasks);
    for entry in entries {
        let provider = provider.clone();
        let source_language = source_language.clone();
        pool.spawn(async move { translate_entry(provider.as_ref(), &source_language, &entry).await });
    }

    // Apply results in completion order; each persist sees a consistent
    // snapshot because only this loop mutates the catalog.
    let mut translated = 0usize;
    while let Some(outcome) = pool.join_next().await {
        match outcome {
            TaskOutcome::Translated {
                key,
                language,
                value,
            } => {
                catalog.set_translation(&key, &language, &value);
                if options.set_needs_review_after_translating {
                    catalog.set_needs_review(&key, &language);
                }
                translated += 1;
                persist(&catalog, &target);
            }
            TaskOutcome::Skipped => {}
        }
    }

    Ok(translated)
}

/// One worker task: provider call guarded by the linter, retried once.
async fn translate_entry(
    provider: &dyn TranslationProvider,
    source_language: &Language,
    entry: &LocalizableString,
) -> TaskOutcome {
    let operation_name = format!("Translate {:?} to {}", entry.key, entry.target_language);
    let result = with_retry(&RetryConfig::provider_call(), &operation_name, || async {
        let value = provider
            .translate(
                &entry.source_value,
                source_language,
                &entry.target_language,
                entry.comment.as_deref(),
            )
            .await?;
        if !lint(
            &entry.source_value,
            source_language,
            &value,
            &entry.target_language,
        ) {
            return Err(anyhow::Error::from(TranslateError::TranslationFailedLinting));
        }
        Ok(value)
    })
    .await;

    match result {
        Ok(value) => TaskOutcome::Translated {
            key: entry.key.clone(),
            language: entry.target_language.clone(),
            value,
        },
        Err(e) => {
            warn!(
                "{}: skipping {:?} after retry ({})",
                entry.target_language, entry.key, e
            );
            TaskOutcome::Skipped
        }
    }
}

/// Default-yes confirmation read from `input`.
pub fn confirm_large_run(count: usize, input: &mut impl BufRead) -> bool {
    println!("About to translate {} strings. Continue? [Y/n]", count);
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return true;
    }
    let answer = answer.trim();
    !(answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no"))
}

/// Where translated output goes: the input itself under `--overwrite`,
/// otherwise a `<stem>.loc.<ext>` sibling.
pub fn output_path(input: &Path, overwrite: bool) -> PathBuf {
    if overwrite {
        return input.to_path_buf();
    }
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("catalog");
    let extension = input
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("xcstrings");
    input.with_file_name(format!("{}.loc.{}", stem, extension))
}

/// Persist failures are logged, never propagated: the on-disk snapshot
/// may lag the in-memory state but other tasks keep going.
pub(crate) fn persist(catalog: &Catalog, target: &Path) {
    if let Err(e) = catalog.write(target) {
        let error = TranslateError::FailedToSaveTranslation {
            path: target.to_path_buf(),
            reason: e.to_string(),
        };
        warn!("{}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::catalog::TranslationState;

    // ==================== Stub Providers ====================

    /// Returns the same translation for every call.
    struct FixedProvider {
        value: String,
        calls: AtomicU32,
    }

    impl FixedProvider {
        fn new(value: &str) -> Self {
            Self {
                value: value.to_string(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for FixedProvider {
        async fn translate(
            &self,
            _text: &str,
            _source_language: &Language,
            _target_language: &Language,
            _comment: Option<&str>,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.clone())
        }
    }

    /// Pops scripted results, one per call.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, String>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for ScriptedProvider {
        async fn translate(
            &self,
            _text: &str,
            _source_language: &Language,
            _target_language: &Language,
            _comment: Option<&str>,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".to_string()));
            next.map_err(|e| anyhow::anyhow!(e))
        }
    }

    // ==================== Fixtures ====================

    const ONE_PENDING: &str = r#"{
        "sourceLanguage": "en",
        "strings": {
            "Hello": {
                "localizations": {
                    "fr": { "stringUnit": { "state": "new", "value": "" } }
                }
            }
        }
    }"#;

    fn write_catalog(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).expect("seed catalog");
        path
    }

    fn fr() -> Language {
        Language::new("fr")
    }

    // ==================== Output Path Tests ====================

    #[test]
    fn test_output_path_overwrite() {
        let path = Path::new("App.xcstrings");
        assert_eq!(output_path(path, true), PathBuf::from("App.xcstrings"));
    }

    #[test]
    fn test_output_path_sibling() {
        let path = Path::new("locales/App.xcstrings");
        assert_eq!(
            output_path(path, false),
            PathBuf::from("locales/App.loc.xcstrings")
        );
    }

    // ==================== Confirmation Tests ====================

    #[test]
    fn test_confirm_defaults_to_yes() {
        assert!(confirm_large_run(210, &mut Cursor::new("\n")));
        assert!(confirm_large_run(210, &mut Cursor::new("")));
        assert!(confirm_large_run(210, &mut Cursor::new("y\n")));
    }

    #[test]
    fn test_confirm_rejects_on_n() {
        assert!(!confirm_large_run(210, &mut Cursor::new("n\n")));
        assert!(!confirm_large_run(210, &mut Cursor::new("NO\n")));
    }

    // ==================== Translation Tests ====================

    #[tokio::test]
    async fn test_translate_single_entry() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, "App.xcstrings", ONE_PENDING);

        let provider = Arc::new(FixedProvider::new("Bonjour"));
        let options = TranslateOptions {
            overwrite: true,
            skip_confirmation: true,
            ..Default::default()
        };

        let count = translate_catalog(provider.clone(), &path, &options, 4)
            .await
            .expect("Should translate");

        assert_eq!(count, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(catalog.state("Hello", &fr()), TranslationState::Translated);
        assert_eq!(
            catalog.translated_value("Hello", &fr()).as_deref(),
            Some("Bonjour")
        );
    }

    #[tokio::test]
    async fn test_translate_without_overwrite_writes_sibling() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, "App.xcstrings", ONE_PENDING);
        let original = std::fs::read_to_string(&path).expect("read");

        let provider = Arc::new(FixedProvider::new("Bonjour"));
        let options = TranslateOptions {
            skip_confirmation: true,
            ..Default::default()
        };

        let count = translate_catalog(provider, &path, &options, 4)
            .await
            .expect("Should translate");
        assert_eq!(count, 1);

        // original untouched, sibling holds the translation
        assert_eq!(std::fs::read_to_string(&path).expect("read"), original);
        let sibling = dir.path().join("App.loc.xcstrings");
        let catalog = Catalog::load(&sibling, None).expect("Should load sibling");
        assert_eq!(
            catalog.translated_value("Hello", &fr()).as_deref(),
            Some("Bonjour")
        );
    }

    #[tokio::test]
    async fn test_transport_failure_retries_then_succeeds() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, "App.xcstrings", ONE_PENDING);

        let provider = Arc::new(ScriptedProvider::new(vec![
            Err("connection reset".to_string()),
            Ok("Bonjour".to_string()),
        ]));
        let options = TranslateOptions {
            overwrite: true,
            skip_confirmation: true,
            ..Default::default()
        };

        let count = translate_catalog(provider.clone(), &path, &options, 4)
            .await
            .expect("Should translate");

        assert_eq!(count, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lint_rejection_skips_after_retry() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(
            &dir,
            "App.xcstrings",
            r#"{
                "sourceLanguage": "en",
                "strings": {
                    "Hello %@": {
                        "localizations": {
                            "fr": { "stringUnit": { "state": "new", "value": "" } }
                        }
                    }
                }
            }"#,
        );

        // drops the %@ specifier on both attempts
        let provider = Arc::new(FixedProvider::new("Bonjour"));
        let options = TranslateOptions {
            overwrite: true,
            skip_confirmation: true,
            ..Default::default()
        };

        let count = translate_catalog(provider.clone(), &path, &options, 4)
            .await
            .expect("Should complete");

        assert_eq!(count, 0, "linted-out entry is not counted");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2, "one retry");

        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(catalog.state("Hello %@", &fr()), TranslationState::New);
    }

    #[tokio::test]
    async fn test_needs_review_after_translating() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, "App.xcstrings", ONE_PENDING);

        let provider = Arc::new(FixedProvider::new("Bonjour"));
        let options = TranslateOptions {
            overwrite: true,
            set_needs_review_after_translating: true,
            skip_confirmation: true,
            ..Default::default()
        };

        translate_catalog(provider, &path, &options, 4)
            .await
            .expect("Should translate");

        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(
            catalog.state("Hello", &fr()),
            TranslationState::NeedsReview
        );
        assert_eq!(
            catalog.translated_value("Hello", &fr()).as_deref(),
            Some("Bonjour")
        );
    }

    #[tokio::test]
    async fn test_language_override_translates_added_language() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, "App.xcstrings", ONE_PENDING);

        let provider = Arc::new(FixedProvider::new("Hallo"));
        let options = TranslateOptions {
            target_languages: Some(vec![Language::new("de")]),
            overwrite: true,
            skip_confirmation: true,
            ..Default::default()
        };

        let count = translate_catalog(provider, &path, &options, 4)
            .await
            .expect("Should translate");
        assert_eq!(count, 1);

        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(
            catalog
                .translated_value("Hello", &Language::new("de"))
                .as_deref(),
            Some("Hallo")
        );
        // the fr entry was dropped by the override
        assert_eq!(catalog.translated_value("Hello", &fr()), None);
    }

    #[tokio::test]
    async fn test_nothing_pending_is_zero_without_calls() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(
            &dir,
            "App.xcstrings",
            r#"{
                "sourceLanguage": "en",
                "strings": {
                    "Hello": {
                        "localizations": {
                            "fr": { "stringUnit": { "state": "translated", "value": "Bonjour" } }
                        }
                    }
                }
            }"#,
        );

        let provider = Arc::new(FixedProvider::new("unused"));
        let options = TranslateOptions {
            overwrite: true,
            skip_confirmation: true,
            ..Default::default()
        };

        let count = translate_catalog(provider.clone(), &path, &options, 4)
            .await
            .expect("Should complete");
        assert_eq!(count, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
