//! Catalog review orchestration.
//!
//! Re-evaluates entries marked `needs_review` through the provider's
//! quality judgment. Approved entries flip back to `translated`; rejected
//! entries keep their state and the explanation is logged. The catalog is
//! persisted after every completed task so review progress survives an
//! interrupted run.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::catalog::{Catalog, Language, LocalizableString};
use crate::error::TranslateError;
use crate::pool::WorkerPool;
use crate::provider::{TranslationProvider, TranslationQuality};
use crate::retry::{with_retry, RetryConfig};
use crate::translator::{confirm_large_run, output_path, persist, CONFIRMATION_THRESHOLD};

#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Only review translations for these languages when present.
    pub target_languages: Option<Vec<Language>>,
    /// Write back into the input file instead of a `.loc.` sibling.
    pub overwrite: bool,
    /// Skip the large-run confirmation prompt.
    pub skip_confirmation: bool,
}

enum ReviewOutcome {
    Approved {
        key: String,
        language: Language,
    },
    Rejected {
        key: String,
        language: Language,
        explanation: String,
    },
    Failed,
}

/// Re-evaluate every `needs_review` entry of one catalog file.
///
/// Returns the number of entries that received a verdict, approved or
/// not. Fails fast with `EvaluationNotSupported` before any work when the
/// provider cannot judge quality.
pub async fn evaluate_catalog(
    provider: Arc<dyn TranslationProvider>,
    path: &Path,
    options: &ReviewOptions,
    concurrent_tasks: usize,
) -> Result<usize> {
    if !provider.supports_evaluation() {
        return Err(TranslateError::EvaluationNotSupported.into());
    }

    let mut catalog = Catalog::load(path, None)?;

    let filter: Option<BTreeSet<Language>> = options
        .target_languages
        .as_ref()
        .map(|languages| languages.iter().cloned().collect());
    let entries = catalog.review_entries(filter.as_ref());
    if entries.is_empty() {
        info!("{}: nothing to review", path.display());
        return Ok(0);
    }

    if entries.len() > CONFIRMATION_THRESHOLD && !options.skip_confirmation {
        let stdin = std::io::stdin();
        if !confirm_large_run(entries.len(), &mut stdin.lock()) {
            println!("Review canceled");
            std::process::exit(0);
        }
    }

    info!("{}: reviewing {} entries", path.display(), entries.len());
    let target = output_path(path, options.overwrite);

    let mut pool = WorkerPool::new(concurrent_tasks);
    for entry in entries {
        let provider = provider.clone();
        pool.spawn(async move { evaluate_entry(provider.as_ref(), &entry).await });
    }

    let mut processed = 0usize;
    while let Some(outcome) = pool.join_next().await {
        match outcome {
            ReviewOutcome::Approved { key, language } => {
                catalog.set_translated(&key, &language);
                processed += 1;
            }
            ReviewOutcome::Rejected {
                key,
                language,
                explanation,
            } => {
                info!(
                    "{}: {:?} kept in needs_review ({})",
                    language, key, explanation
                );
                processed += 1;
            }
            ReviewOutcome::Failed => {}
        }
        // checkpoint after every completed task, whatever the verdict
        persist(&catalog, &target);
    }

    Ok(processed)
}

/// One worker task: quality judgment, retried once on transport failure.
async fn evaluate_entry(
    provider: &dyn TranslationProvider,
    entry: &LocalizableString,
) -> ReviewOutcome {
    let Some(translation) = entry.translated_value.as_deref() else {
        return ReviewOutcome::Failed;
    };

    let operation_name = format!("Evaluate {:?} for {}", entry.key, entry.target_language);
    let result = with_retry(&RetryConfig::provider_call(), &operation_name, || async {
        provider
            .evaluate_quality(
                &entry.source_value,
                translation,
                &entry.target_language,
                entry.comment.as_deref(),
            )
            .await
    })
    .await;

    match result {
        Ok(verdict) => match verdict.quality {
            TranslationQuality::Good => ReviewOutcome::Approved {
                key: entry.key.clone(),
                language: entry.target_language.clone(),
            },
            TranslationQuality::Poor => ReviewOutcome::Rejected {
                key: entry.key.clone(),
                language: entry.target_language.clone(),
                explanation: verdict.explanation,
            },
        },
        Err(e) => {
            warn!(
                "{}: evaluation of {:?} failed after retry ({})",
                entry.target_language, entry.key, e
            );
            ReviewOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::catalog::TranslationState;
    use crate::provider::QualityVerdict;

    // ==================== Stub Providers ====================

    struct VerdictProvider {
        quality: TranslationQuality,
        calls: AtomicU32,
        fail_first: bool,
    }

    impl VerdictProvider {
        fn good() -> Self {
            Self {
                quality: TranslationQuality::Good,
                calls: AtomicU32::new(0),
                fail_first: false,
            }
        }

        fn poor() -> Self {
            Self {
                quality: TranslationQuality::Poor,
                calls: AtomicU32::new(0),
                fail_first: false,
            }
        }

        fn good_after_failure() -> Self {
            Self {
                quality: TranslationQuality::Good,
                calls: AtomicU32::new(0),
                fail_first: true,
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for VerdictProvider {
        async fn translate(
            &self,
            text: &str,
            _source_language: &Language,
            _target_language: &Language,
            _comment: Option<&str>,
        ) -> Result<String> {
            Ok(text.to_string())
        }

        fn supports_evaluation(&self) -> bool {
            true
        }

        async fn evaluate_quality(
            &self,
            _source: &str,
            _translation: &str,
            _language: &Language,
            _comment: Option<&str>,
        ) -> Result<QualityVerdict> {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && attempt == 0 {
                anyhow::bail!("connection reset");
            }
            Ok(QualityVerdict {
                quality: self.quality,
                explanation: "scripted verdict".to_string(),
            })
        }
    }

    struct NoEvaluation;

    #[async_trait]
    impl TranslationProvider for NoEvaluation {
        async fn translate(
            &self,
            text: &str,
            _source_language: &Language,
            _target_language: &Language,
            _comment: Option<&str>,
        ) -> Result<String> {
            Ok(text.to_string())
        }
    }

    // ==================== Fixtures ====================

    const NEEDS_REVIEW: &str = r#"{
        "sourceLanguage": "en",
        "strings": {
            "Hello": {
                "localizations": {
                    "fr": { "stringUnit": { "state": "needs_review", "value": "Bonjour" } }
                }
            }
        }
    }"#;

    fn write_catalog(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("App.xcstrings");
        std::fs::write(&path, text).expect("seed catalog");
        path
    }

    fn fr() -> Language {
        Language::new("fr")
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_review_fails_fast_without_evaluation_support() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, NEEDS_REVIEW);

        let result = evaluate_catalog(
            Arc::new(NoEvaluation),
            &path,
            &ReviewOptions::default(),
            4,
        )
        .await;

        let err = result.expect_err("Should fail fast");
        assert!(matches!(
            err.downcast_ref::<TranslateError>(),
            Some(TranslateError::EvaluationNotSupported)
        ));
    }

    #[tokio::test]
    async fn test_good_verdict_flips_state() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, NEEDS_REVIEW);

        let options = ReviewOptions {
            overwrite: true,
            ..Default::default()
        };
        let processed = evaluate_catalog(Arc::new(VerdictProvider::good()), &path, &options, 4)
            .await
            .expect("Should review");

        assert_eq!(processed, 1);
        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(catalog.state("Hello", &fr()), TranslationState::Translated);
        assert_eq!(
            catalog.translated_value("Hello", &fr()).as_deref(),
            Some("Bonjour")
        );
    }

    #[tokio::test]
    async fn test_poor_verdict_keeps_state() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, NEEDS_REVIEW);

        let options = ReviewOptions {
            overwrite: true,
            ..Default::default()
        };
        let processed = evaluate_catalog(Arc::new(VerdictProvider::poor()), &path, &options, 4)
            .await
            .expect("Should review");

        assert_eq!(processed, 1, "rejected entries still count as processed");
        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(
            catalog.state("Hello", &fr()),
            TranslationState::NeedsReview
        );
    }

    #[tokio::test]
    async fn test_transport_failure_retries_then_succeeds() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(&dir, NEEDS_REVIEW);

        let provider = Arc::new(VerdictProvider::good_after_failure());
        let options = ReviewOptions {
            overwrite: true,
            ..Default::default()
        };
        let processed = evaluate_catalog(provider.clone(), &path, &options, 4)
            .await
            .expect("Should review");

        assert_eq!(processed, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_language_filter_limits_review() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(
            &dir,
            r#"{
                "sourceLanguage": "en",
                "strings": {
                    "Hello": {
                        "localizations": {
                            "fr": { "stringUnit": { "state": "needs_review", "value": "Bonjour" } },
                            "de": { "stringUnit": { "state": "needs_review", "value": "Hallo" } }
                        }
                    }
                }
            }"#,
        );

        let options = ReviewOptions {
            target_languages: Some(vec![fr()]),
            overwrite: true,
            ..Default::default()
        };
        let processed = evaluate_catalog(Arc::new(VerdictProvider::good()), &path, &options, 4)
            .await
            .expect("Should review");

        assert_eq!(processed, 1);
        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(catalog.state("Hello", &fr()), TranslationState::Translated);
        assert_eq!(
            catalog.state("Hello", &Language::new("de")),
            TranslationState::NeedsReview
        );
    }

    #[tokio::test]
    async fn test_translated_entries_are_not_reviewed() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_catalog(
            &dir,
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

        let provider = Arc::new(VerdictProvider::poor());
        let options = ReviewOptions {
            overwrite: true,
            ..Default::default()
        };
        let processed = evaluate_catalog(provider.clone(), &path, &options, 4)
            .await
            .expect("Should review");

        assert_eq!(processed, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        // no state regression from translated
        let catalog = Catalog::load(&path, None).expect("Should reload");
        assert_eq!(catalog.state("Hello", &fr()), TranslationState::Translated);
    }
}
