//! Action coordinator.
//!
//! Dispatches one of the three CLI actions, aggregates counts across
//! files, and emits the closing summary line with elapsed wall time.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use crate::catalog::Language;
use crate::cli::{ReviewArgs, TranslateArgs, TranslateTextArgs};
use crate::config::Config;
use crate::evaluator::{evaluate_catalog, ReviewOptions};
use crate::finder::{find_translatable_files, FileType};
use crate::provider::TranslationProvider;
use crate::spec::{translate_specification, SpecTranslateOptions};
use crate::translator::{translate_catalog, TranslateOptions};

/// Source language assumed for bare-text translation.
const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Translate a single literal string and print one line per language.
pub async fn run_translate_text(
    provider: &dyn TranslationProvider,
    args: &TranslateTextArgs,
) -> Result<()> {
    let start = Instant::now();
    let source = Language::new(DEFAULT_SOURCE_LANGUAGE);

    let mut translated = 0usize;
    for code in &args.languages {
        let language = Language::new(code.clone());
        match provider
            .translate(&args.text, &source, &language, None)
            .await
        {
            Ok(value) => {
                println!("{}: {}", language, value);
                translated += 1;
            }
            Err(e) => warn!("{}: translation failed ({})", language, e),
        }
    }

    info!(
        "Translated {} strings in {}",
        translated,
        format_elapsed(start)
    );
    Ok(())
}

/// Translate every file found at the path, catalog or specification.
pub async fn run_translate_files(
    provider: Arc<dyn TranslationProvider>,
    config: &Config,
    args: &TranslateArgs,
) -> Result<usize> {
    let start = Instant::now();

    let file_type = FileType::infer(&args.path)?;
    let files = find_translatable_files(&args.path, file_type)?;

    let target_languages = parse_languages(&args.languages);
    let mut translated = 0usize;
    for file in &files {
        match file_type {
            FileType::StringCatalog => {
                let options = TranslateOptions {
                    target_languages: target_languages.clone(),
                    overwrite: args.overwrite,
                    set_needs_review_after_translating: args.needs_review,
                    skip_confirmation: args.skip_confirm,
                };
                translated +=
                    translate_catalog(provider.clone(), file, &options, config.concurrent_tasks)
                        .await?;
            }
            FileType::JsonSpecification => {
                let options = SpecTranslateOptions {
                    target_languages: target_languages.clone(),
                    only_files: if args.only_files.is_empty() {
                        None
                    } else {
                        Some(args.only_files.clone())
                    },
                    overwrite: args.overwrite,
                };
                translated += translate_specification(provider.as_ref(), file, &options).await?;
            }
        }
    }

    info!(
        "Translated {} strings in {}",
        translated,
        format_elapsed(start)
    );
    Ok(translated)
}

/// Review every catalog found at the path.
pub async fn run_review_files(
    provider: Arc<dyn TranslationProvider>,
    config: &Config,
    args: &ReviewArgs,
) -> Result<usize> {
    let start = Instant::now();

    let files = find_translatable_files(&args.path, FileType::StringCatalog)?;

    let options = ReviewOptions {
        target_languages: parse_languages(&args.languages),
        overwrite: args.overwrite,
        skip_confirmation: args.skip_confirm,
    };

    let mut reviewed = 0usize;
    for file in &files {
        reviewed +=
            evaluate_catalog(provider.clone(), file, &options, config.concurrent_tasks).await?;
    }

    info!("Reviewed {} strings in {}", reviewed, format_elapsed(start));
    Ok(reviewed)
}

/// An empty `--lang` list means "every language already in the file".
fn parse_languages(codes: &[String]) -> Option<Vec<Language>> {
    if codes.is_empty() {
        None
    } else {
        Some(codes.iter().map(|c| Language::new(c.clone())).collect())
    }
}

fn format_elapsed(start: Instant) -> String {
    format!("{:.1}s", start.elapsed().as_secs_f64())
}
