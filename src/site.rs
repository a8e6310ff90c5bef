//! Site build: render every document and write the output tree.
//!
//! ## Page pipeline
//!
//! Each page is a pure function of its document, the shared
//! [`DocumentList`], and the [`RenderContext`]:
//!
//! 1. Extract metadata and strip the comment block ([`metadata::extract`])
//! 2. Render markdown with heading anchors and TOC ([`render::render_markdown`])
//! 3. Append the previous/next pager
//! 4. Cut the TOC out of the body ([`toc::split`])
//! 5. Fill the template and apply the base path ([`compose::compose`])
//!
//! Pages are rendered in parallel with rayon. Nothing is written until every
//! page has rendered, so a bad document can't leave a half-updated site.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html               # index.md
//! ├── 1-intro.html             # flat routing (nested: 1-intro/index.html)
//! ├── 2-usage.html
//! ├── css/style.css            # Built-in assets
//! ├── js/app.js
//! └── favicon.ico              # Anything under docs/public/, copied as is
//! ```

use crate::compose::{self, PageParts, Template};
use crate::config::SiteConfig;
use crate::metadata::{self, MetadataDefaults};
use crate::navigation::{self, DocumentList};
use crate::naming;
use crate::render;
use crate::scan::{self, ScanError};
use crate::timestamps::TimestampSource;
use crate::toc;
use crate::types::{Document, Page};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const APP_JS: &str = include_str!("../static/app.js");
const STYLE_CSS: &str = include_str!("../static/style.css");

/// Built-in assets and their paths relative to the output root.
const ASSETS: &[(&str, &str)] = &[("js/app.js", APP_JS), ("css/style.css", STYLE_CSS)];

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to copy public files: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Everything shared, read-only, by all page renders of one build.
pub struct RenderContext<'a> {
    pub config: &'a SiteConfig,
    pub template: &'a Template,
    pub timestamps: &'a dyn TimestampSource,
    /// Fallback for documents the timestamp source knows nothing about
    pub build_time: DateTime<Utc>,
}

/// What a build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Written pages in document order: output path and title
    pub pages: Vec<(PathBuf, String)>,
    /// Built-in asset paths written
    pub assets: Vec<PathBuf>,
    /// Files copied from `<source>/public`
    pub public_files: usize,
}

/// What `check` found: the ordered documents and their rendered pages.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub documents: Vec<Document>,
    pub pages: Vec<Page>,
}

/// Render one document at its position in the list.
pub fn render_page(document: &Document, list: &DocumentList, ctx: &RenderContext<'_>) -> Page {
    let config = ctx.config;
    let base_name = document.base_name();
    let defaults = MetadataDefaults {
        base_name: &base_name,
        author: &config.default_author,
        file_times: ctx.timestamps.file_times(&document.source_path),
        build_time: ctx.build_time,
    };
    let extracted = metadata::extract(&document.raw_text, &defaults);
    let meta = &extracted.metadata;

    let fragment = render::render_markdown(extracted.body, config);
    let pager = navigation::render_pager(&list.links(document.sequence_index)).into_string();
    let with_pager = if pager.is_empty() {
        fragment
    } else {
        format!("{fragment}{pager}\n")
    };
    let split = toc::split(&with_pager);

    let description = metadata::resolve(&[Some(meta.description.as_str())])
        .unwrap_or_else(|| metadata::derive_description(&split.body, config.description_length));
    let site_nav = navigation::render_site_nav(list, document.sequence_index).into_string();

    let parts = PageParts {
        body: &split.body,
        toc: &split.toc,
        navigation: &site_nav,
        metadata: meta,
        description: &description,
        site_name: &config.site_name,
        site_title: &config.site_title,
    };

    Page {
        output_path: naming::output_path(&base_name, config.routing, &config.index_document),
        html: compose::compose(ctx.template, &parts, &config.base_url),
        title: meta.display_title().to_string(),
    }
}

/// Render every document in parallel, preserving document order.
pub fn render_site(documents: &[Document], ctx: &RenderContext<'_>) -> Vec<Page> {
    let list = DocumentList::new(documents, ctx.config);
    documents
        .par_iter()
        .map(|doc| render_page(doc, &list, ctx))
        .collect()
}

/// Scan and render without touching the output directory.
pub fn check(source: &Path, ctx: &RenderContext<'_>) -> Result<CheckReport, BuildError> {
    let documents = scan::scan(source)?;
    let pages = render_site(&documents, ctx);
    Ok(CheckReport { documents, pages })
}

/// Full build: scan, render, then write pages, assets and public files.
pub fn build(source: &Path, output: &Path, ctx: &RenderContext<'_>) -> Result<BuildReport, BuildError> {
    let documents = scan::scan(source)?;
    create_dir(output)?;

    let pages = render_site(&documents, ctx);
    tracing::info!(pages = pages.len(), "Rendered site");

    write_pages(output, &pages)?;
    let assets = write_assets(output)?;
    let public_files = copy_public(&source.join("public"), output)?;

    Ok(BuildReport {
        pages: pages
            .into_iter()
            .map(|p| (p.output_path, p.title))
            .collect(),
        assets,
        public_files,
    })
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_pages(output: &Path, pages: &[Page]) -> Result<(), BuildError> {
    let mut seen = HashSet::new();
    for page in pages {
        if !seen.insert(&page.output_path) {
            tracing::warn!(
                path = %page.output_path.display(),
                "Two documents map to the same output path, the later one wins"
            );
        }
        let path = output.join(&page.output_path);
        write_file(&path, &page.html)?;
        tracing::debug!(path = %path.display(), "Wrote page");
    }
    Ok(())
}

fn write_assets(output: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut written = Vec::with_capacity(ASSETS.len());
    for &(rel, contents) in ASSETS {
        write_file(&output.join(rel), contents)?;
        written.push(PathBuf::from(rel));
    }
    Ok(written)
}

/// Copy `<source>/public` into the output root. Returns the number of files.
///
/// Runs after the built-in assets so a public `css/style.css` replaces ours.
fn copy_public(public: &Path, output: &Path) -> Result<usize, BuildError> {
    if !public.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(public).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(public) else {
            continue;
        };
        let target = output.join(rel);
        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                create_dir(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|source| BuildError::Write {
                path: target.clone(),
                source,
            })?;
            copied += 1;
        }
    }
    tracing::debug!(files = copied, "Copied public files");
    Ok(copied)
}
