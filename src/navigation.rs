//! Site navigation: the main page list and previous/next pagers.
//!
//! Both are derived from the ordered [`DocumentList`], which is built once per
//! build and passed to every page render.
//!
//! ## Pager rules
//!
//! | Position            | Previous            | Next         |
//! |---------------------|---------------------|--------------|
//! | list of 0 or 1      | none                | none         |
//! | first               | none                | second       |
//! | last (or beyond)    | second-to-last      | none         |
//! | otherwise           | position - 1        | position + 1 |

use crate::config::SiteConfig;
use crate::naming;
use crate::types::Document;
use maud::{Markup, html};

/// One document as it appears in navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub base_name: String,
    /// Display text: the site title for the index document, else the base name
    pub label: String,
    /// Root-relative link, before base path rewriting
    pub href: String,
}

/// The site's documents in build order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentList {
    entries: Vec<NavEntry>,
}

impl DocumentList {
    pub fn new(documents: &[Document], config: &SiteConfig) -> Self {
        let entries = documents
            .iter()
            .map(|doc| {
                let base_name = doc.base_name();
                let is_index = base_name == config.index_document;
                NavEntry {
                    label: if is_index {
                        config.site_title.clone()
                    } else {
                        base_name.clone()
                    },
                    href: naming::page_href(&base_name, config.routing, &config.index_document),
                    base_name,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Previous/next neighbours of the document at `position`.
    pub fn links(&self, position: usize) -> NavigationLinks<'_> {
        let len = self.entries.len();
        if len < 2 {
            return NavigationLinks::default();
        }
        if position == 0 {
            NavigationLinks {
                previous: None,
                next: self.entries.get(1),
            }
        } else if position >= len - 1 {
            NavigationLinks {
                previous: self.entries.get(len - 2),
                next: None,
            }
        } else {
            NavigationLinks {
                previous: self.entries.get(position - 1),
                next: self.entries.get(position + 1),
            }
        }
    }
}

/// Neighbours of one document in the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationLinks<'a> {
    pub previous: Option<&'a NavEntry>,
    pub next: Option<&'a NavEntry>,
}

impl NavigationLinks<'_> {
    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }
}

/// Previous/next block appended below the page content. Empty without links.
pub fn render_pager(links: &NavigationLinks<'_>) -> Markup {
    if links.is_empty() {
        return html! {};
    }
    html! {
        nav.pager aria-label="Pages" {
            @if let Some(prev) = links.previous {
                a.pager-previous href=(prev.href) rel="prev" {
                    span.pager-direction { "Previous" }
                    " "
                    span.pager-title { (prev.label) }
                }
            }
            @if let Some(next) = links.next {
                a.pager-next href=(next.href) rel="next" {
                    span.pager-direction { "Next" }
                    " "
                    span.pager-title { (next.label) }
                }
            }
        }
    }
}

/// Main navigation list with the document at `current` marked.
pub fn render_site_nav(list: &DocumentList, current: usize) -> Markup {
    html! {
        ul {
            @for (i, entry) in list.entries().iter().enumerate() {
                @let is_current = i == current;
                li class=[is_current.then_some("current")] {
                    a href=(entry.href) aria-current=[is_current.then_some("page")] {
                        (entry.label)
                    }
                }
            }
        }
    }
}
