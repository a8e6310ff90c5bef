//! Markdown to HTML transformation.
//!
//! Runs each document through a fixed pipeline:
//!
//! 1. [`inject_toc_marker`]: add a `## Table of contents` heading after the
//!    first heading of the configured level (or at the very top)
//! 2. Parse with GFM extensions (tables, strikethrough, task lists, alerts)
//!    and optionally footnotes
//! 3. Give every heading an `id` anchor
//! 4. Insert a nested list linking to the headings that follow the marker
//! 5. Link bare `https://` and `www.` URLs the way GFM autolinks do
//! 6. Serialize with `pulldown_cmark::html`
//!
//! The output is a pure function of the markdown and the config. The list
//! is emitted one tag per line so [`crate::toc::split`] can cut it back out.

use crate::config::SiteConfig;
use maud::html;
use pulldown_cmark::{
    CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
    html as md_html,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Visible text of the marker heading.
pub const TOC_MARKER_TEXT: &str = "Table of contents";
/// Anchor the marker heading always receives.
pub const TOC_MARKER_ID: &str = "table-of-contents";

const TOC_MARKER_LINE: &str = "## Table of contents";

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?://|www\.)[^\s<]+").expect("bare url regex"));

/// An open fenced code block: its marker character and run length.
///
/// Only a run of the same character, at least as long, closes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// The fence `line` opens, if it is an opening fence line.
    pub(crate) fn open(line: &str) -> Option<Self> {
        let rest = line.trim_start();
        let marker = rest.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = rest.len() - rest.trim_start_matches(marker).len();
        if len < 3 {
            return None;
        }
        // Backtick info strings may not contain backticks
        if marker == '`' && rest[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    /// Whether `line` closes this fence.
    pub(crate) fn closes(&self, line: &str) -> bool {
        let rest = line.trim();
        let len = rest.len() - rest.trim_start_matches(self.marker).len();
        len >= self.len && len == rest.len()
    }
}

/// Insert the marker heading after the first ATX heading of `after_level`.
///
/// Headings inside fenced code blocks don't count. Without a matching
/// heading the marker is prepended. Text already carrying the marker is
/// returned unchanged.
pub fn inject_toc_marker(markdown: &str, after_level: u8) -> String {
    if markdown.lines().any(|l| l.trim_end() == TOC_MARKER_LINE) {
        return markdown.to_string();
    }

    let mut fence: Option<Fence> = None;
    let mut offset = 0;
    for line in markdown.split_inclusive('\n') {
        let end = offset + line.len();
        offset = end;

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

        if atx_level(line) == Some(after_level) {
            let (head, tail) = markdown.split_at(end);
            let newline = if head.ends_with('\n') { "" } else { "\n" };
            return format!("{head}{newline}\n{TOC_MARKER_LINE}\n\n{tail}");
        }
    }

    format!("{TOC_MARKER_LINE}\n\n{markdown}")
}

/// Level of an ATX heading line (`## Title` → 2), at most three spaces indented.
fn atx_level(line: &str) -> Option<u8> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let hashes = rest.len() - rest.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    match rest[hashes..].chars().next() {
        None | Some(' ') | Some('\t') | Some('\n') | Some('\r') => u8::try_from(hashes).ok(),
        _ => None,
    }
}

fn parser_options(config: &SiteConfig) -> Options {
    let mut options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_HEADING_ATTRIBUTES;
    if config.markdown.footnotes {
        options |= Options::ENABLE_FOOTNOTES;
    }
    options
}

/// Convert a document's markdown (metadata block already removed) to HTML.
pub fn render_markdown(markdown: &str, config: &SiteConfig) -> String {
    let source = if config.toc.enabled {
        inject_toc_marker(markdown, config.toc.after_level)
    } else {
        markdown.to_string()
    };

    let mut events: Vec<Event> =
        TextMergeStream::new(Parser::new_ext(&source, parser_options(config))).collect();
    let headings = assign_heading_ids(&mut events, config.toc.enabled);

    let marker = headings.iter().position(|h| h.is_marker);
    let toc_entries: Vec<&Heading> = match marker {
        Some(m) => headings[m + 1..]
            .iter()
            .filter(|h| h.level <= config.toc.max_depth)
            .collect(),
        None => Vec::new(),
    };

    let events = match marker.map(|m| &headings[m]) {
        Some(m) if toc_entries.is_empty() => {
            // Nothing to list: drop the marker heading as well
            events
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !(m.start..=m.end).contains(i))
                .map(|(_, e)| e)
                .collect()
        }
        Some(m) => {
            let list = toc_list(&toc_entries);
            events.insert(m.end + 1, Event::Html(CowStr::from(list)));
            events
        }
        None => events,
    };

    let mut out = String::with_capacity(source.len() * 2);
    md_html::push_html(&mut out, autolink(events).into_iter());
    out
}

/// Link bare `http://`, `https://` and `www.` URLs in text.
///
/// Text inside code blocks, links and images is left alone.
fn autolink(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut opaque = 0usize;
    for event in events {
        match &event {
            Event::Start(Tag::CodeBlock(_) | Tag::Link { .. } | Tag::Image { .. }) => opaque += 1,
            Event::End(TagEnd::CodeBlock | TagEnd::Link | TagEnd::Image) => {
                opaque = opaque.saturating_sub(1);
            }
            Event::Text(text) if opaque == 0 && BARE_URL.is_match(text) => {
                link_urls(text, &mut out);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    out
}

/// Split `text` into text and link events.
///
/// A URL must start the text or follow whitespace or one of `*_~(`.
fn link_urls<'a>(text: &str, out: &mut Vec<Event<'a>>) {
    let mut last = 0;
    for found in BARE_URL.find_iter(text) {
        let boundary = text[..found.start()]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || matches!(c, '*' | '_' | '~' | '('));
        let url = trim_url(found.as_str());
        let host = url
            .split_once("://")
            .map(|(_, rest)| rest)
            .or_else(|| url.strip_prefix("www."))
            .unwrap_or_default();
        if !boundary || host.is_empty() {
            continue;
        }

        if found.start() > last {
            out.push(Event::Text(CowStr::from(text[last..found.start()].to_string())));
        }
        let href = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(CowStr::from(url.to_string())));
        out.push(Event::End(TagEnd::Link));
        last = found.start() + url.len();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Drop trailing punctuation and unbalanced closing parentheses.
fn trim_url(mut url: &str) -> &str {
    while let Some(last) = url.chars().next_back() {
        let trim = match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !trim {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

/// A heading as seen in the event stream.
#[derive(Debug, Clone, PartialEq)]
struct Heading {
    level: u8,
    id: String,
    text: String,
    /// Event indices of the start and end tags
    start: usize,
    end: usize,
    is_marker: bool,
}

/// Fill in missing heading ids and report every heading in document order.
fn assign_heading_ids(events: &mut [Event<'_>], toc_enabled: bool) -> Vec<Heading> {
    let mut ids = HeadingIds::default();
    let mut marker_seen = false;
    if toc_enabled {
        ids.reserve(TOC_MARKER_ID);
    }

    // First pass: gather levels, text and explicit ids
    let mut headings = Vec::new();
    let mut current: Option<(usize, u8, Option<String>, String)> = None;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((i, heading_level(*level), id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, _, buf)) = current.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((start, level, explicit, text)) = current.take() {
                    let is_marker = toc_enabled
                        && !marker_seen
                        && level == 2
                        && text.trim() == TOC_MARKER_TEXT;
                    marker_seen |= is_marker;
                    let id = match (is_marker, explicit) {
                        (true, _) => TOC_MARKER_ID.to_string(),
                        (false, Some(explicit)) => ids.claim(&explicit),
                        (false, None) => ids.unique(&slugify(&text)),
                    };
                    headings.push(Heading {
                        level,
                        id,
                        text: text.trim().to_string(),
                        start,
                        end: i,
                        is_marker,
                    });
                }
            }
            _ => {}
        }
    }

    // Second pass: write ids back into the start tags
    for heading in &headings {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[heading.start] {
            *id = Some(CowStr::from(heading.id.clone()));
        }
    }
    headings
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Hands out unique heading anchors in document order.
#[derive(Debug, Default)]
struct HeadingIds {
    used: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl HeadingIds {
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Explicit `{#id}` anchors are kept as written unless already taken.
    fn claim(&mut self, id: &str) -> String {
        if self.used.insert(id.to_string()) {
            return id.to_string();
        }
        let unique = self.unique(id);
        tracing::warn!(id, replacement = %unique, "Duplicate heading id");
        unique
    }

    /// `base`, else `base-1`, `base-2`, ... whichever is free first.
    fn unique(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            let candidate = if *counter == 0 {
                base.to_string()
            } else {
                format!("{base}-{counter}")
            };
            *counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Lowercase alphanumerics; every other run becomes a single hyphen.
///
/// `"Hello, World!"` → `"hello-world"`, `"시작하기 Guide"` → `"시작하기-guide"`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut gap = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.extend(c.to_lowercase());
        } else {
            gap = true;
        }
    }
    slug
}

/// Nested `<ul>` of links, one tag per line.
fn toc_list(entries: &[&Heading]) -> String {
    let Some(first) = entries.first() else {
        return String::new();
    };
    let mut html = String::from("<ul>\n");
    let mut levels = vec![first.level];
    let mut item_open = false;

    for entry in entries {
        let top = levels.last().copied().unwrap_or(first.level);
        if entry.level > top && item_open {
            html.push_str("\n<ul>\n");
            levels.push(entry.level);
        } else {
            while levels.len() > 1 && levels.last().is_some_and(|&l| entry.level < l) {
                html.push_str("</li>\n</ul>\n");
                levels.pop();
            }
            if item_open {
                html.push_str("</li>\n");
            }
        }
        let link = html! { a href={ "#" (entry.id) } { (entry.text) } };
        html.push_str("<li>");
        html.push_str(&link.into_string());
        item_open = true;
    }

    if item_open {
        html.push_str("</li>\n");
    }
    while levels.len() > 1 {
        html.push_str("</ul>\n</li>\n");
        levels.pop();
    }
    html.push_str("</ul>\n");
    html
}
