//! Discovery of translatable files.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::TranslateError;

/// The two file formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    StringCatalog,
    JsonSpecification,
}

impl FileType {
    /// Infer the type from a path's extension.
    ///
    /// `xcstrings` is a string catalog, `json` is a specification, and a
    /// missing extension (typically a directory of catalogs) defaults to
    /// string catalog. Anything else is an unhandled file type.
    pub fn infer(path: &Path) -> Result<FileType, TranslateError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("xcstrings") => Ok(FileType::StringCatalog),
            Some("json") => Ok(FileType::JsonSpecification),
            None => Ok(FileType::StringCatalog),
            Some(_) => Err(TranslateError::UnhandledFileType(path.to_path_buf())),
        }
    }

    /// The file extension this type matches on disk.
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::StringCatalog => "xcstrings",
            FileType::JsonSpecification => "json",
        }
    }
}

/// Enumerate translatable files at `path` for the given type.
///
/// A matching regular file yields itself; a directory is walked
/// depth-first, skipping hidden entries. A missing path or a search that
/// matches nothing yields an empty list with a warning.
pub fn find_translatable_files(
    path: &Path,
    file_type: FileType,
) -> Result<Vec<PathBuf>, TranslateError> {
    if path.is_file() {
        if has_extension(path, file_type.extension()) {
            return Ok(vec![path.to_path_buf()]);
        }
        warn!("{} does not match a translatable file type", path.display());
        return Ok(Vec::new());
    }

    if !path.is_dir() {
        warn!("No translatable files found at {}", path.display());
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    // the root itself is exempt from the hidden filter so a search rooted
    // in a dot-directory still works
    let walker = WalkDir::new(path)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
    for entry in walker {
        let entry = entry.map_err(|source| TranslateError::CouldNotSearchDirectory {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), file_type.extension()) {
            found.push(entry.into_path());
        }
    }

    if found.is_empty() {
        warn!("No translatable files found at {}", path.display());
    }
    Ok(found)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}
