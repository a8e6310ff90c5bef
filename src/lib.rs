//! # docsite
//!
//! A minimal static site generator for documentation written as numbered
//! markdown files. The source directory is the site: every `*.md` file
//! becomes one page, ordered by the first number in its file name, linked
//! to its neighbours, and wrapped in a shared template.
//!
//! # Architecture: Scan, Render, Write
//!
//! ```text
//! 1. Scan    docs/        →  Vec<Document>   (ordered, read once)
//! 2. Render  documents    →  Vec<Page>       (parallel, pure)
//! 3. Write   pages        →  dist/           (pages, assets, public/)
//! ```
//!
//! Rendering a page never reads or writes the filesystem (apart from the
//! optional timestamp source), so each step of the page pipeline can be
//! tested on strings alone. Nothing is written before every page rendered.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists and orders the source documents |
//! | [`metadata`] | Leading comment block → title, author, dates, description |
//! | [`render`] | Markdown → HTML with heading anchors and a generated TOC |
//! | [`toc`] | Cuts the generated TOC out of the rendered body |
//! | [`navigation`] | Main navigation list and previous/next pagers |
//! | [`compose`] | Template placeholders and base path rewriting |
//! | [`site`] | Drives the pipeline over all documents and writes the output |
//! | [`config`] | `config.toml` loading, merging over defaults, and validation |
//! | [`naming`] | Ordering keys, base names, output paths and links |
//! | [`timestamps`] | Per-document created/modified times from git or the filesystem |
//! | [`types`] | Shared `Document` and `Page` records |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Comments As Placeholders
//!
//! Templates are plain HTML and placeholders are HTML comments
//! (`<!-- CONTENT -->`). A template opens in a browser as is, and a
//! placeholder the build doesn't know stays an invisible comment.
//!
//! ## Maud For Generated Markup
//!
//! Navigation, pagers and TOC links are built with
//! [Maud](https://maud.lambda.xyz/), so every interpolated title is escaped.
//! The page template itself stays user-editable HTML.
//!
//! ## Numeric Ordering From File Names
//!
//! `2-install.md` sorts before `10-faq.md`. The key is the first run of
//! digits anywhere in the name, parsed by [`naming::sort_key`]; names without
//! digits sort first. No front-matter field or index file decides order.

pub mod compose;
pub mod config;
pub mod metadata;
pub mod naming;
pub mod navigation;
pub mod output;
pub mod render;
pub mod scan;
pub mod site;
pub mod timestamps;
pub mod toc;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
