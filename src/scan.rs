//! Source directory scanning.
//!
//! Stage 1 of the build. Lists the markdown files at the root of the source
//! directory and produces the site's ordered document list.
//!
//! ## Directory Structure
//!
//! ```text
//! docs/                    # Source root
//! ├── config.toml          # Site configuration (optional, not a document)
//! ├── template.html        # Page template (optional, not a document)
//! ├── public/              # Static files (not scanned)
//! ├── index.md             # Key -1: sorts first
//! ├── 1-intro.md           # Key 1
//! ├── 2-install.md         # Key 2
//! └── 10-faq.md            # Key 10 (numeric, not lexical)
//! ```
//!
//! ## Ordering
//!
//! Files are first listed in file-name order so builds are reproducible on
//! every platform, then stable-sorted by [`naming::sort_key`]. Files sharing a
//! key therefore keep their file-name order.

use crate::naming;
use crate::types::Document;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Scan the source root and return its documents in site order.
///
/// Each document's `sequence_index` is its position in the returned list.
pub fn scan(root: &Path) -> Result<Vec<Document>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::SourceNotFound(root.to_path_buf()));
    }

    let mut files = collect_document_files(root)?;
    order_files(&mut files);

    let mut documents = Vec::with_capacity(files.len());
    for (sequence_index, (file_name, path)) in files.into_iter().enumerate() {
        let raw_text = fs::read_to_string(&path).map_err(|source| ScanError::Read {
            path: path.clone(),
            source,
        })?;
        documents.push(Document {
            file_name,
            source_path: path,
            raw_text,
            sequence_index,
        });
    }

    tracing::debug!(document_count = documents.len(), "Source scan completed");
    Ok(documents)
}

fn collect_document_files(root: &Path) -> Result<Vec<(String, PathBuf)>, ScanError> {
    let files = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_document(p))
        .filter_map(|p| {
            let name = p.file_name()?.to_string_lossy().into_owned();
            (!name.starts_with('.')).then_some((name, p))
        })
        .collect();
    Ok(files)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Sort by file name, then stable-sort by numeric key.
fn order_files(files: &mut [(String, PathBuf)]) {
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files.sort_by_key(|(name, _)| naming::sort_key(name));
}
