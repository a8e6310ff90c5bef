//! Page composition: template placeholders and base path rewriting.
//!
//! Templates are plain HTML with placeholders written as comments:
//!
//! ```html
//! <title><!-- TITLE --></title>
//! <nav class="global-navigation"><!-- NAVIGATION --></nav>
//! <main><!-- CONTENT --></main>
//! <aside><!-- TOC --></aside>
//! ```
//!
//! | Placeholder    | Value                                        | Escaped |
//! |----------------|----------------------------------------------|---------|
//! | `CONTENT`      | page body with pager                         | no      |
//! | `TOC`          | `<nav class="toc">` block or empty           | no      |
//! | `NAVIGATION`   | main `<ul>` with the current page marked     | no      |
//! | `TITLE`        | declared title, first heading, or base name  | yes     |
//! | `DESCRIPTION`  | declared or derived description              | yes     |
//! | `AUTHOR`       | author                                       | yes     |
//! | `DATE`         | calendar date of `CREATED_AT`                | yes     |
//! | `CREATED_AT`   | ISO-8601                                     | yes     |
//! | `MODIFIED_AT`  | ISO-8601                                     | yes     |
//! | `SITE_NAME`    | `site_name` from config                      | yes     |
//! | `SITE_TITLE`   | `site_title` from config                     | yes     |
//! | *extra keys*   | unknown metadata keys, upper-cased           | yes     |
//!
//! Substitution is a single pass: inserted values are never scanned for
//! further placeholders, and placeholders without a value are left as they
//! are. Afterwards every root-relative URL gets the configured base path.

use crate::metadata::Metadata;
use chrono::DateTime;
use maud::html;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

const BUILTIN_TEMPLATE: &str = include_str!("../static/template.html");

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*([A-Z][A-Z0-9_]*)\s*-->").expect("placeholder regex")
});

/// `src="/…"`, `href='/…'`, `href=/…`, `url(/…)`, `url("/…")`, not `//host`.
static ROOT_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<lead>(?:src|href)\s*=\s*["']?|url\(\s*["']?)/(?P<next>[^/])"#)
        .expect("root-relative url regex")
});

/// Where a template came from, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    BuiltIn,
    File(std::path::PathBuf),
}

/// The shared page template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    origin: TemplateOrigin,
}

impl Template {
    pub fn builtin() -> Self {
        Self {
            source: BUILTIN_TEMPLATE.to_string(),
            origin: TemplateOrigin::BuiltIn,
        }
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin: TemplateOrigin::BuiltIn,
        }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            source: std::fs::read_to_string(path)?,
            origin: TemplateOrigin::File(path.to_path_buf()),
        })
    }

    /// Explicit path, else `<source>/template.html`, else the built-in one.
    pub fn locate(explicit: Option<&Path>, source_dir: &Path) -> std::io::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = source_dir.join("template.html");
        if local.is_file() {
            return Self::load(&local);
        }
        Ok(Self::builtin())
    }

    pub fn origin(&self) -> &TemplateOrigin {
        &self.origin
    }

    /// Substitute placeholders in one pass.
    pub fn render(&self, values: &Placeholders) -> String {
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures| {
                match values.get(&caps[1]) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Placeholder values, stored ready to insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
}

impl Placeholders {
    /// Insert markup as is.
    pub fn html(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Insert text, HTML-escaped.
    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.values
            .insert(name.to_string(), html! { (value) }.into_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Everything that varies per page.
#[derive(Debug, Clone)]
pub struct PageParts<'a> {
    pub body: &'a str,
    pub toc: &'a str,
    pub navigation: &'a str,
    pub metadata: &'a Metadata,
    /// Resolved description (declared or derived)
    pub description: &'a str,
    pub site_name: &'a str,
    pub site_title: &'a str,
}

/// Placeholder name for an extra metadata key: `og-image` → `OG_IMAGE`.
pub fn placeholder_name(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Build the placeholder table for one page.
pub fn placeholders(parts: &PageParts<'_>) -> Placeholders {
    let meta = parts.metadata;
    let mut values = Placeholders::default();

    // Extras first so built-in names win on collision
    for (key, value) in &meta.extra {
        values.text(&placeholder_name(key), value);
    }

    values
        .html("CONTENT", parts.body)
        .html("TOC", parts.toc)
        .html("NAVIGATION", parts.navigation)
        .text("TITLE", meta.display_title())
        .text("DESCRIPTION", parts.description)
        .text("AUTHOR", &meta.author)
        .text("DATE", &calendar_date(&meta.created_at))
        .text("CREATED_AT", &meta.created_at)
        .text("MODIFIED_AT", &meta.modified_at)
        .text("SITE_NAME", parts.site_name)
        .text("SITE_TITLE", parts.site_title);
    values
}

/// `2024-03-01T12:00:00.000Z` → `2024-03-01`; anything unparseable as is.
fn calendar_date(iso: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| iso.to_string())
}

/// Fill the template for one page and apply the base path.
pub fn compose(template: &Template, parts: &PageParts<'_>, base_url: &str) -> String {
    let html = template.render(&placeholders(parts));
    rewrite_root_relative(&html, base_url).into_owned()
}

/// Insert `base_url` after the leading slash of every root-relative URL.
///
/// `"/"` and `""` leave the HTML untouched, as do protocol-relative
/// (`//host/…`), absolute, and relative URLs.
pub fn rewrite_root_relative<'a>(html: &'a str, base_url: &str) -> Cow<'a, str> {
    let base = base_url.trim_matches('/');
    if base.is_empty() {
        return Cow::Borrowed(html);
    }
    ROOT_RELATIVE.replace_all(html, |caps: &Captures| {
        format!("{}/{}/{}", &caps["lead"], base, &caps["next"])
    })
}
