//! JSON specification driver.
//!
//! A specification declares a source locale, a set of target locales, and
//! a list of whole files to translate. File paths are templates relative
//! to the specification's directory, with `{locale}` standing in for the
//! locale's folder name. Unlike the catalog pipeline this driver is
//! serial per file; the fan-out is small and the outputs are whole files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::Language;
use crate::error::TranslateError;
use crate::provider::TranslationProvider;

/// Token replaced by a locale's folder name in file templates.
const LOCALE_TOKEN: &str = "{locale}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct JsonSpecification {
    pub source_locale: FileLocale,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub locales: Vec<FileLocale>,
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FileLocale {
    pub locale_id: String,
    /// Folder name on disk; defaults to the locale id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
}

impl FileLocale {
    pub fn folder(&self) -> &str {
        self.folder_name.as_deref().unwrap_or(&self.locale_id)
    }

    pub fn language(&self) -> Language {
        Language::new(self.locale_id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FileSpec {
    /// Path template relative to the specification's directory.
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Copy the file verbatim into each locale folder.
    #[serde(default)]
    pub skip_translation: bool,
}

impl JsonSpecification {
    /// Parse a specification file. Unknown fields are rejected.
    pub fn load(path: &Path) -> Result<JsonSpecification, TranslateError> {
        let text = fs::read_to_string(path).map_err(|e| TranslateError::FailedToParseLocale {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| TranslateError::FailedToParseLocale {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpecTranslateOptions {
    /// Only produce these locales when present.
    pub target_languages: Option<Vec<Language>>,
    /// Only process files with these basenames when present.
    pub only_files: Option<Vec<String>>,
    /// Replace outputs that already exist.
    pub overwrite: bool,
}

/// Fan one specification's files across its target locales.
///
/// Every source file must exist before any translation begins; a missing
/// source aborts the run with `FileNotFound`. Per-output provider
/// failures are logged and skipped. Returns 0: counts are per-string and
/// this driver moves whole files.
pub async fn translate_specification(
    provider: &dyn TranslationProvider,
    path: &Path,
    options: &SpecTranslateOptions,
) -> Result<usize> {
    let spec = JsonSpecification::load(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    // Pre-flight: resolve and check every source file up front
    let mut sources: Vec<PathBuf> = Vec::with_capacity(spec.files.len());
    for file in &spec.files {
        let source_path = base.join(substitute_locale(&file.file_url, spec.source_locale.folder()));
        if !source_path.is_file() {
            return Err(TranslateError::FileNotFound(source_path).into());
        }
        sources.push(source_path);
    }

    let source_language = spec.source_locale.language();

    for (file, source_path) in spec.files.iter().zip(&sources) {
        if let Some(only) = &options.only_files {
            let name = source_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !only.iter().any(|f| f == name) {
                debug!("Skipping {} (not selected)", name);
                continue;
            }
        }

        let text = fs::read_to_string(source_path)
            .with_context(|| format!("Failed to read {}", source_path.display()))?;
        let comment = combine_comments(spec.comment.as_deref(), file.comment.as_deref());

        for locale in &spec.locales {
            let language = locale.language();
            if language == source_language {
                continue;
            }
            if let Some(filter) = &options.target_languages {
                if !filter.contains(&language) {
                    continue;
                }
            }

            let output = base.join(substitute_locale(&file.file_url, locale.folder()));
            if output.exists() && !options.overwrite {
                info!(
                    "{} exists, skipping (pass --overwrite to replace)",
                    output.display()
                );
                continue;
            }

            let output_text = if file.skip_translation {
                text.clone()
            } else {
                match provider
                    .translate(&text, &source_language, &language, comment.as_deref())
                    .await
                {
                    Ok(translated) => translated,
                    Err(e) => {
                        warn!(
                            "{}: translating {} failed ({})",
                            language,
                            source_path.display(),
                            e
                        );
                        continue;
                    }
                }
            };

            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&output, output_text)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {}", output.display());
        }
    }

    Ok(0)
}

fn substitute_locale(template: &str, folder: &str) -> String {
    template.replace(LOCALE_TOKEN, folder)
}

fn combine_comments(spec: Option<&str>, file: Option<&str>) -> Option<String> {
    match (spec, file) {
        (Some(a), Some(b)) => Some(format!("{}\n{}", a, b)),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    }
}
