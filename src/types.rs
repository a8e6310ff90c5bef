//! Shared types passed between the scan, render and write stages.

use crate::naming;
use std::path::PathBuf;

/// One source markdown file.
///
/// Read once per build and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// File name with extension, e.g. `1-intro.md`
    pub file_name: String,
    /// Absolute or source-relative path the text was read from
    pub source_path: PathBuf,
    /// Markdown, optionally led by a metadata comment block
    pub raw_text: String,
    /// Position within the site's ordered document list
    pub sequence_index: usize,
}

impl Document {
    /// File name without extension; drives titles and routes.
    pub fn base_name(&self) -> String {
        naming::base_name(&self.file_name)
    }
}

/// Final output unit: where it goes and what it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Path relative to the output directory
    pub output_path: PathBuf,
    /// Fully composed HTML
    pub html: String,
    /// Resolved page title (for reporting)
    pub title: String,
}
