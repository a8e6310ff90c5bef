//! Filename conventions: ordering keys, base names, and output routes.
//!
//! Documents are ordered by the first run of digits found anywhere in their
//! file name. `1-intro.md`, `intro-1.md` and `ch1.md` all sort with key `1`;
//! names without digits sort as key `-1`, i.e. before every numbered one.
//!
//! ## Routes
//!
//! The base name (file name without extension) decides where a page lands and
//! how other pages link to it:
//!
//! | Document      | Flat routing      | Nested routing          | Link         |
//! |---------------|-------------------|-------------------------|--------------|
//! | `1-intro.md`  | `1-intro.html`    | `1-intro/index.html`    | `/1-intro.html` or `/1-intro/` |
//! | `index.md`    | `index.html`      | `index.html`            | `/`          |

use crate::config::Routing;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::{Path, PathBuf};

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Sort key for a file name: the first run of ASCII digits, or `-1`.
///
/// - `"1-intro.md"` → `1`
/// - `"020-setup.md"` → `20`
/// - `"chapter12-part3.md"` → `12`
/// - `"about.md"` → `-1`
///
/// Runs too long for an `i64` saturate to `i64::MAX`.
pub fn sort_key(file_name: &str) -> i64 {
    let digits: String = file_name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        -1
    } else {
        digits.parse().unwrap_or(i64::MAX)
    }
}

/// File name without its final extension (`"1-intro.md"` → `"1-intro"`).
pub fn base_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// Output path of a page relative to the output directory.
pub fn output_path(base: &str, routing: Routing, index_document: &str) -> PathBuf {
    if base == index_document {
        return PathBuf::from("index.html");
    }
    match routing {
        Routing::Flat => PathBuf::from(format!("{base}.html")),
        Routing::Nested => Path::new(base).join("index.html"),
    }
}

/// Root-relative link to a page. The index document links to `/`.
///
/// The base path is not applied here; the composer rewrites every
/// root-relative URL of the finished page in one pass.
pub fn page_href(base: &str, routing: Routing, index_document: &str) -> String {
    if base == index_document {
        return "/".to_string();
    }
    let encoded = utf8_percent_encode(base, URI_COMPONENT);
    match routing {
        Routing::Flat => format!("/{encoded}.html"),
        Routing::Nested => format!("/{encoded}/"),
    }
}
