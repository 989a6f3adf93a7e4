use std::path::PathBuf;

use thiserror::Error;

/// Domain errors surfaced by the translation pipeline.
///
/// Provider transport errors stay as plain `anyhow` errors with context;
/// the kinds here are the ones callers need to match on (fail-fast in
/// review mode, fatal file-type and pre-flight failures, retryable
/// per-entry failures).
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The path's extension does not match a known file type.
    #[error("unhandled file type: {}", .0.display())]
    UnhandledFileType(PathBuf),

    /// Filesystem enumeration failed while searching for files.
    #[error("could not search directory {}: {}", .path.display(), .source)]
    CouldNotSearchDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The provider responded without a usable translation.
    #[error("no translation returned")]
    NoTranslationReturned,

    /// The translation dropped format specifiers or placeholders.
    #[error("translation failed linting")]
    TranslationFailedLinting,

    /// The provider does not implement quality evaluation.
    #[error("the translation provider does not support quality evaluation")]
    EvaluationNotSupported,

    /// A source file named by a JSON specification is missing.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A JSON specification could not be parsed.
    #[error("failed to parse locale specification {}: {}", .path.display(), .reason)]
    FailedToParseLocale { path: PathBuf, reason: String },

    /// Persisting a catalog after a mutation failed.
    #[error("failed to save translation to {}: {}", .path.display(), .reason)]
    FailedToSaveTranslation { path: PathBuf, reason: String },
}
