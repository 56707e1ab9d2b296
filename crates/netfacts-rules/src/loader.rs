//! Directive document loader
//!
//! Load documents from strings, files or a directory of parser files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::DirectiveError;
use crate::schema::Document;

/// File extensions picked up when loading a directory
pub const VALID_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Errors that can occur when loading documents
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parse and validate a document. JSON is accepted as YAML.
pub fn load_document_from_str(text: &str) -> Result<Document, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    Ok(Document::from_yaml(&value)?)
}

/// Load a document from a file, recording it as the document's origin
pub fn load_document_from_file(path: &Path) -> Result<Document, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    load_document_from_str(&text)
        .map(|document| document.with_origin(path))
        .map_err(|e| LoadError::InFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
}

/// Load every parser file directly inside `dir`.
///
/// Files are taken in file-name order; only the first file for each stem
/// is loaded (`facts.json` shadows `facts.yaml`). Subdirectories are ignored.
pub fn load_documents_from_dir(dir: &Path) -> Result<Vec<Document>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
        let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
        if path.is_file() && has_valid_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut seen = HashSet::new();
    let mut documents = Vec::new();
    for path in paths {
        let Some(stem) = path.file_stem().map(|s| s.to_os_string()) else {
            continue;
        };
        if !seen.insert(stem) {
            tracing::debug!("skipping {}, stem already loaded", path.display());
            continue;
        }
        tracing::debug!("loading {}", path.display());
        documents.push(load_document_from_file(&path)?);
    }

    Ok(documents)
}

fn has_valid_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VALID_EXTENSIONS.contains(&ext))
}
