//! CLI output formatting for the scan, check and build commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every document is
//! shown by its position in the site and its title, with filesystem paths as
//! secondary context: an indented `Source:` line while scanning, an arrow to
//! the output path once rendered.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Documents
//! 001 index
//!     Source: index.md
//! 002 1-intro
//!     Source: 1-intro.md
//!
//! Config
//!     config.toml
//!     public/
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Fixture Docs → index.html
//! 002 Introduction → 1-intro.html
//!
//! Assets
//!     js/app.js
//!     css/style.css
//!
//! Generated 2 pages, copied 1 public file
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::site::BuildReport;
use crate::types::{Document, Page};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 Introduction → 1-intro.html`
fn page_line(index: usize, title: &str, output_path: &Path) -> String {
    format!(
        "{} {} → {}",
        format_index(index),
        title,
        output_path.display()
    )
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the ordered document list and the site's support files.
///
/// `present` lists which support files exist, in display order.
pub fn format_scan_output(documents: &[Document], present: &[&str]) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    if documents.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for doc in documents {
        lines.push(format!(
            "{} {}",
            format_index(doc.sequence_index + 1),
            doc.base_name()
        ));
        lines.push(format!("{}Source: {}", indent(1), doc.file_name));
    }

    if !present.is_empty() {
        lines.push(String::new());
        lines.push("Config".to_string());
        for name in present {
            lines.push(format!("{}{}", indent(1), name));
        }
    }
    lines
}

/// Support files found in a source directory, in display order.
pub fn support_files(source_root: &Path) -> Vec<&'static str> {
    [
        ("config.toml", source_root.join("config.toml").is_file()),
        ("template.html", source_root.join("template.html").is_file()),
        ("public/", source_root.join("public").is_dir()),
    ]
    .into_iter()
    .filter_map(|(name, exists)| exists.then_some(name))
    .collect()
}

/// Print scan output to stdout.
pub fn print_scan_output(documents: &[Document], source_root: &Path) {
    for line in format_scan_output(documents, &support_files(source_root)) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format pages rendered by `check`.
pub fn format_check_output(pages: &[Page]) -> Vec<String> {
    let mut lines: Vec<String> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| page_line(i + 1, &page.title, &page.output_path))
        .collect();
    lines.push(String::new());
    lines.push(format!("Rendered {}", plural(pages.len(), "page", "pages")));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(pages: &[Page]) {
    for line in format_check_output(pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a finished build.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .enumerate()
        .map(|(i, (path, title))| page_line(i + 1, title, path))
        .collect();

    if !report.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &report.assets {
            lines.push(format!("{}{}", indent(1), asset.display()));
        }
    }

    lines.push(String::new());
    let mut summary = format!("Generated {}", plural(report.pages.len(), "page", "pages"));
    if report.public_files > 0 {
        summary.push_str(&format!(
            ", copied {}",
            plural(report.public_files, "public file", "public files")
        ));
    }
    lines.push(summary);
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn document(name: &str, index: usize) -> Document {
        Document {
            file_name: name.to_string(),
            source_path: PathBuf::from(name),
            raw_text: String::new(),
            sequence_index: index,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_wide() {
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
        assert_eq!(plural(3, "page", "pages"), "3 pages");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_output_lists_documents_in_order() {
        let docs = vec![document("index.md", 0), document("1-intro.md", 1)];
        let lines = format_scan_output(&docs, &["config.toml", "public/"]);
        assert_eq!(
            lines,
            vec![
                "Documents",
                "001 index",
                "    Source: index.md",
                "002 1-intro",
                "    Source: 1-intro.md",
                "",
                "Config",
                "    config.toml",
                "    public/",
            ]
        );
    }

    #[test]
    fn scan_output_empty_source() {
        let lines = format_scan_output(&[], &[]);
        assert_eq!(lines, vec!["Documents", "    (none)"]);
    }

    #[test]
    fn support_files_detects_present_entries() {
        let tmp = TempDir::new().unwrap();
        assert!(support_files(tmp.path()).is_empty());

        std::fs::write(tmp.path().join("config.toml"), "").unwrap();
        std::fs::create_dir(tmp.path().join("public")).unwrap();
        assert_eq!(support_files(tmp.path()), vec!["config.toml", "public/"]);
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_lines() {
        let pages = vec![Page {
            output_path: PathBuf::from("1-intro.html"),
            html: String::new(),
            title: "Introduction".to_string(),
        }];
        assert_eq!(
            format_check_output(&pages),
            vec!["001 Introduction → 1-intro.html", "", "Rendered 1 page"]
        );
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_output_lines() {
        let report = BuildReport {
            pages: vec![
                (PathBuf::from("index.html"), "Docs".to_string()),
                (PathBuf::from("1-intro/index.html"), "Introduction".to_string()),
            ],
            assets: vec![PathBuf::from("js/app.js"), PathBuf::from("css/style.css")],
            public_files: 1,
        };
        assert_eq!(
            format_build_output(&report),
            vec![
                "001 Docs → index.html",
                "002 Introduction → 1-intro/index.html",
                "",
                "Assets",
                "    js/app.js",
                "    css/style.css",
                "",
                "Generated 2 pages, copied 1 public file",
            ]
        );
    }

    #[test]
    fn build_output_without_public_files() {
        let report = BuildReport {
            pages: vec![],
            assets: vec![],
            public_files: 0,
        };
        assert_eq!(format_build_output(&report), vec!["", "Generated 0 pages"]);
    }
}
