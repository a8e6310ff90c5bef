//! Document metadata extraction and resolution.
//!
//! A document may open with an HTML comment holding `key: value` lines:
//!
//! ```markdown
//! <!--
//! title: Getting Started
//! author: Jane Doe
//! date: 2024-03-01
//! description: Install the tool and build your first site.
//! -->
//!
//! # Getting Started
//! ```
//!
//! ## Tokenizing
//!
//! The comment body is split into lines, blank lines are discarded, and each
//! remaining line is split once on its first colon. Both halves are trimmed,
//! so `url: https://example.com` keeps the colons of its value. A line without
//! any colon is dropped with a warning.
//!
//! ## Resolution
//!
//! Every field always ends up with a value:
//!
//! - **title**: `title` key → file base name
//! - **author**: `author` key → configured default (`"Anonymous"`)
//! - **created_at**: `createdAt` key → `date` key → timestamp source → build time
//! - **modified_at**: `modifiedAt` key → `date` key → timestamp source → build time
//! - **description**: `description` key → empty (derived from content later,
//!   see [`derive_description`])
//!
//! Unrecognized keys are kept in [`Metadata::extra`] for the template.

use crate::render::Fence;
use crate::timestamps::{self, FileTimes};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Leading comment block: optional whitespace, `<!--`, body, `-->` ending its line.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*<!--(?s:(.*?))-->[ \t]*(?:\r?\n|\z)").expect("front matter regex")
});

/// Where a resolved title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// `title:` line in the comment block
    Declared,
    /// File base name fallback
    FileName,
}

/// Fully resolved metadata of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub title_source: TitleSource,
    pub author: String,
    /// ISO-8601
    pub created_at: String,
    /// ISO-8601
    pub modified_at: String,
    /// Empty when not declared
    pub description: String,
    /// Text of the first level-1 heading, if any
    pub heading: Option<String>,
    /// Unrecognized keys, verbatim
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Title for display: declared title, else first heading, else base name.
    pub fn display_title(&self) -> &str {
        match (self.title_source, &self.heading) {
            (TitleSource::FileName, Some(heading)) => heading,
            _ => &self.title,
        }
    }
}

/// Inputs to fall back on when the document is silent.
#[derive(Debug, Clone)]
pub struct MetadataDefaults<'a> {
    pub base_name: &'a str,
    pub author: &'a str,
    /// From the timestamp source, if it knew the file
    pub file_times: Option<FileTimes>,
    pub build_time: DateTime<Utc>,
}

/// Metadata plus the markdown that follows the comment block.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
}

/// Key/value pairs tokenized from a comment block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub entries: Vec<(String, String)>,
    /// Non-blank lines without a colon, dropped
    pub skipped: Vec<String>,
}

impl FrontMatter {
    /// Last value for a recognized key, ignoring empty values.
    fn get(&self, key: Key) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, v)| Key::from_name(k) == Some(key) && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Title,
    Author,
    Date,
    CreatedAt,
    ModifiedAt,
    Description,
}

impl Key {
    /// Case-insensitive, `created_at` / `createdAt` / `created-at` alike.
    fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "date" => Some(Self::Date),
            "createdat" => Some(Self::CreatedAt),
            "modifiedat" => Some(Self::ModifiedAt),
            "description" => Some(Self::Description),
            _ => None,
        }
    }
}

/// Split raw text into the comment block body (if any) and the remaining markdown.
pub fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    match FRONT_MATTER.captures(raw) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            (caps.get(1).map(|m| m.as_str()), &raw[whole..])
        }
        None => (None, raw),
    }
}

/// Tokenize a comment block body into key/value pairs.
pub fn parse_front_matter(block: &str) -> FrontMatter {
    let mut front = FrontMatter::default();
    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(':') {
            Some((key, value)) => front
                .entries
                .push((key.trim().to_string(), value.trim().to_string())),
            None => front.skipped.push(line.to_string()),
        }
    }
    front
}

/// Extract metadata from a raw document, overlaying declared keys on defaults.
///
/// Never fails: a missing or malformed block yields all defaults.
pub fn extract<'a>(raw: &'a str, defaults: &MetadataDefaults<'_>) -> Extracted<'a> {
    let (block, body) = split_front_matter(raw);
    let front = block.map(parse_front_matter).unwrap_or_default();

    for line in &front.skipped {
        tracing::warn!(
            document = defaults.base_name,
            line = line.as_str(),
            "Ignoring metadata line without a colon"
        );
    }

    let title = resolve(&[front.get(Key::Title)]);
    let title_source = if title.is_some() {
        TitleSource::Declared
    } else {
        TitleSource::FileName
    };

    let fallback = defaults
        .file_times
        .unwrap_or_else(|| FileTimes::at(defaults.build_time));
    let date = front.get(Key::Date);
    let created_at = resolve(&[front.get(Key::CreatedAt), date])
        .map(|v| normalize_date(&v, defaults.base_name))
        .unwrap_or_else(|| timestamps::iso8601(fallback.created));
    let modified_at = resolve(&[front.get(Key::ModifiedAt), date])
        .map(|v| normalize_date(&v, defaults.base_name))
        .unwrap_or_else(|| timestamps::iso8601(fallback.modified));

    let extra = front
        .entries
        .iter()
        .filter(|(k, _)| Key::from_name(k).is_none())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Extracted {
        metadata: Metadata {
            title: title.unwrap_or_else(|| defaults.base_name.to_string()),
            title_source,
            author: resolve(&[front.get(Key::Author), Some(defaults.author)])
                .unwrap_or_default(),
            created_at,
            modified_at,
            description: resolve(&[front.get(Key::Description)]).unwrap_or_default(),
            heading: first_heading(body),
            extra,
        },
        body,
    }
}

/// Resolve a metadata field from multiple sources.
///
/// Takes optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Normalize a declared date to ISO-8601 UTC; unparseable values are kept verbatim.
fn normalize_date(value: &str, document: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return timestamps::iso8601(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return timestamps::iso8601(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return timestamps::iso8601(midnight.and_utc());
    }
    tracing::warn!(document, value, "Metadata date is not ISO-8601, using it verbatim");
    value.to_string()
}

/// Text of the first ATX level-1 heading outside fenced code.
fn first_heading(markdown: &str) -> Option<String> {
    let mut fence: Option<Fence> = None;
    for line in markdown.lines() {
        if let Some(open) = fence {
            if open.closes(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            continue;
        }
        let trimmed = line.trim_start();
        if let Some(text) = trimmed.strip_prefix("# ") {
            let text = text.trim().trim_end_matches('#').trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Derive a plain-text description from rendered HTML.
///
/// Tags are stripped, the contents of `<nav>`, `<script>` and `<style>`
/// elements are skipped, character references are decoded, whitespace is
/// collapsed, and text longer than `max_chars` characters is cut and
/// suffixed with `...`. The result is plain text, not HTML.
pub fn derive_description(html: &str, max_chars: usize) -> String {
    let text = decode_entities(&strip_html_tags(html));
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

const SKIPPED_ELEMENTS: &[&str] = &["nav", "script", "style"];

/// Elements whose boundaries separate words.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "summary", "table", "td", "th", "tr", "ul",
];

/// Strip tags, dropping text inside skipped elements.
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut skip_depth = 0usize;
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        if skip_depth == 0 {
            result.push_str(&rest[..open]);
        }
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[open + 1..open + close];
        let (closing, name) = match tag.strip_prefix('/') {
            Some(name) => (true, name),
            None => (false, tag),
        };
        let name = name
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if SKIPPED_ELEMENTS.contains(&name.as_str()) {
            if closing {
                skip_depth = skip_depth.saturating_sub(1);
            } else {
                skip_depth += 1;
            }
        }
        if BLOCK_ELEMENTS.contains(&name.as_str()) {
            result.push(' ');
        }
        rest = &rest[open + close + 1..];
    }
    if skip_depth == 0 {
        result.push_str(rest);
    }
    result
}

/// Decode the character references the markdown renderer emits.
///
/// Unknown references are kept as written.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
