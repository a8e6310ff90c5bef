//! Shared test utilities for the docsite test suite.
//!
//! Provides fixture setup and lookup helpers for rendered pages.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let report = site::check(tmp.path(), &ctx).unwrap();
//!
//! let intro = find_page(&report.pages, "1-intro.html").unwrap();
//! assert_page_contains(intro, "<h1 id=\"introduction\">");
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::types::Page;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/docs/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_dir_recursive(&fixtures_dir(), tmp.path()).unwrap();
    tmp
}

/// Path of the pristine fixture documents.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/docs")
}

/// Number of markdown documents in the fixtures.
pub fn fixture_document_count() -> usize {
    std::fs::read_dir(fixtures_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .count()
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Page lookups
// =========================================================================

/// Find a rendered page by output path.
pub fn find_page<'a>(pages: &'a [Page], output_path: &str) -> Option<&'a Page> {
    pages
        .iter()
        .find(|p| p.output_path == Path::new(output_path))
}

/// Output paths of all pages, in order.
pub fn page_paths(pages: &[Page]) -> Vec<String> {
    pages
        .iter()
        .map(|p| p.output_path.to_string_lossy().into_owned())
        .collect()
}

/// Assert a page's HTML contains a fragment, showing the page on failure.
pub fn assert_page_contains(page: &Page, fragment: &str) {
    assert!(
        page.html.contains(fragment),
        "{} does not contain {fragment:?}\n---\n{}",
        page.output_path.display(),
        page.html
    );
}
