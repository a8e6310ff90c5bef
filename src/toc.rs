//! Table-of-contents extraction.
//!
//! The renderer leaves the generated TOC inline, right after the marker
//! heading. [`split`] cuts the marker heading and its list out of the page
//! body so the template can place the TOC elsewhere.
//!
//! Scanning is line based and driven by [`State`]:
//!
//! ```text
//! SeekMarker ──marker line──▶ ExpectList ──"<ul"──▶ InList{depth} ──depth 0──▶ Done
//! ```
//!
//! Once the list balances, every remaining line is copied untouched, so
//! markup appended after the content (pagers, footers) can't end the list
//! early or be swallowed by it.

use crate::render::{TOC_MARKER_ID, TOC_MARKER_TEXT};

/// A rendered page body with its TOC cut out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TocSplit {
    /// Body without the marker heading and list
    pub body: String,
    /// `<nav class="toc">…</nav>`, or empty
    pub toc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekMarker,
    ExpectList,
    InList { depth: usize },
    Done,
}

fn is_marker(line: &str) -> bool {
    let Some(rest) = line.trim().strip_prefix("<h2 id=\"") else {
        return false;
    };
    rest.strip_prefix(TOC_MARKER_ID)
        .and_then(|r| r.strip_prefix("\">"))
        .and_then(|r| r.strip_suffix("</h2>"))
        .is_some_and(|text| text == TOC_MARKER_TEXT)
}

/// Net `<ul` opens minus `</ul>` closes on one line.
fn list_delta(line: &str) -> isize {
    let opens = line.matches("<ul").count();
    let closes = line.matches("</ul>").count();
    opens as isize - closes as isize
}

/// Separate the TOC from the body.
///
/// A missing marker, a marker with no list after it, or a list that never
/// closes all return the input unchanged with an empty TOC.
pub fn split(html: &str) -> TocSplit {
    let mut state = State::SeekMarker;
    let mut body = String::with_capacity(html.len());
    let mut list = String::new();

    for line in html.split_inclusive('\n') {
        state = match state {
            State::SeekMarker if is_marker(line) => State::ExpectList,
            State::SeekMarker | State::Done => {
                body.push_str(line);
                state
            }
            State::ExpectList if line.trim().is_empty() => State::ExpectList,
            State::ExpectList if line.trim_start().starts_with("<ul") => {
                list.push_str(line);
                match usize::try_from(list_delta(line)) {
                    Ok(0) => State::Done,
                    Ok(depth) => State::InList { depth },
                    Err(_) => return unchanged(html),
                }
            }
            State::ExpectList => {
                tracing::debug!("TOC marker without a list, leaving body as is");
                return unchanged(html);
            }
            State::InList { depth } => {
                list.push_str(line);
                let next = depth as isize + list_delta(line);
                match usize::try_from(next) {
                    Ok(0) => State::Done,
                    Ok(depth) => State::InList { depth },
                    Err(_) => return unchanged(html),
                }
            }
        };
    }

    if state != State::Done {
        if state != State::SeekMarker {
            tracing::debug!("Unterminated TOC, leaving body as is");
        }
        return unchanged(html);
    }

    TocSplit {
        body,
        toc: format!("<nav class=\"toc\">\n{list}</nav>"),
    }
}

fn unchanged(html: &str) -> TocSplit {
    TocSplit {
        body: html.to_string(),
        toc: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::render::render_markdown;
    use pretty_assertions::assert_eq;

    const MARKER: &str = "<h2 id=\"table-of-contents\">Table of contents</h2>\n";

    #[test]
    fn no_marker_is_noop() {
        let html = "<h1 id=\"a\">A</h1>\n<p>Text</p>\n";
        let split = split(html);
        assert_eq!(split.body, html);
        assert_eq!(split.toc, "");
    }

    #[test]
    fn extracts_flat_list() {
        let html = format!(
            "<h1 id=\"a\">A</h1>\n{MARKER}<ul>\n<li><a href=\"#b\">B</a></li>\n</ul>\n<h2 id=\"b\">B</h2>\n"
        );
        let split = split(&html);
        assert_eq!(split.body, "<h1 id=\"a\">A</h1>\n<h2 id=\"b\">B</h2>\n");
        assert_eq!(
            split.toc,
            "<nav class=\"toc\">\n<ul>\n<li><a href=\"#b\">B</a></li>\n</ul>\n</nav>"
        );
    }

    #[test]
    fn nested_lists_stay_balanced() {
        let list = "<ul>\n<li><a href=\"#a\">A</a>\n<ul>\n<li><a href=\"#b\">B</a>\n<ul>\n<li><a href=\"#c\">C</a></li>\n</ul>\n</li>\n</ul>\n</li>\n<li><a href=\"#d\">D</a></li>\n</ul>\n";
        let html = format!("{MARKER}{list}<h2 id=\"a\">A</h2>\n<ul>\n<li>body list</li>\n</ul>\n");
        let split = split(&html);

        assert_eq!(split.toc, format!("<nav class=\"toc\">\n{list}</nav>"));
        // Body keeps its own list intact
        assert_eq!(
            split.body,
            "<h2 id=\"a\">A</h2>\n<ul>\n<li>body list</li>\n</ul>\n"
        );
        assert_eq!(split.toc.matches("<ul").count(), split.toc.matches("</ul>").count());
        assert_eq!(split.body.matches("<ul").count(), split.body.matches("</ul>").count());
    }

    #[test]
    fn trailing_navigation_is_kept_in_body() {
        let html = format!(
            "{MARKER}<ul>\n<li><a href=\"#x\">X</a></li>\n</ul>\n<h2 id=\"x\">X</h2>\n<nav class=\"pager\">\n<a href=\"/next.html\">Next</a>\n</nav>\n"
        );
        let split = split(&html);
        assert!(split.body.ends_with("<nav class=\"pager\">\n<a href=\"/next.html\">Next</a>\n</nav>\n"));
        assert!(!split.toc.contains("pager"));
    }

    #[test]
    fn blank_lines_between_marker_and_list() {
        let html = format!("{MARKER}\n\n<ul>\n<li>x</li>\n</ul>\n");
        let split = split(&html);
        assert_eq!(split.body, "");
        assert!(split.toc.contains("<li>x</li>"));
    }

    #[test]
    fn marker_without_list_is_noop() {
        let html = format!("{MARKER}<p>no list</p>\n");
        let split = split(&html);
        assert_eq!(split.body, html);
        assert_eq!(split.toc, "");
    }

    #[test]
    fn unterminated_list_is_noop() {
        let html = format!("{MARKER}<ul>\n<li>x</li>\n");
        let split = split(&html);
        assert_eq!(split.body, html);
        assert_eq!(split.toc, "");
    }

    #[test]
    fn marker_at_end_is_noop() {
        let split = split(MARKER);
        assert_eq!(split.body, MARKER);
        assert_eq!(split.toc, "");
    }

    #[test]
    fn excess_closing_tags_are_noop() {
        let html = format!("{MARKER}<ul></ul></ul>\n");
        assert_eq!(split(&html).toc, "");
    }

    #[test]
    fn single_line_list() {
        let html = format!("{MARKER}<ul><li>x</li></ul>\n<p>after</p>\n");
        let split = split(&html);
        assert_eq!(split.body, "<p>after</p>\n");
        assert_eq!(split.toc, "<nav class=\"toc\">\n<ul><li>x</li></ul>\n</nav>");
    }

    #[test]
    fn only_first_marker_is_used() {
        let html = format!("{MARKER}<ul>\n</ul>\n{MARKER}<ul>\n</ul>\n");
        let split = split(&html);
        assert_eq!(split.body, format!("{MARKER}<ul>\n</ul>\n"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(split(""), TocSplit::default());
    }

    #[test]
    fn splits_rendered_markdown() {
        let md = "# Guide\n\n## Install\n\n### From source\n\n## Use\n";
        let html = render_markdown(md, &SiteConfig::default());
        let split = split(&html);

        assert_eq!(
            split.body,
            "<h1 id=\"guide\">Guide</h1>\n<h2 id=\"install\">Install</h2>\n<h3 id=\"from-source\">From source</h3>\n<h2 id=\"use\">Use</h2>\n"
        );
        assert!(split.toc.starts_with("<nav class=\"toc\">\n<ul>\n"));
        assert!(split.toc.contains("<a href=\"#from-source\">From source</a>"));
        assert!(split.toc.ends_with("</ul>\n</nav>"));
    }
}
