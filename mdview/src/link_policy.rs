//! Link classification for URLs activated inside a rendered document
//!
//! Every candidate URL is sorted into exactly one [`LinkTarget`]. The result
//! depends only on the candidate, the current document path and what exists
//! on disk, so the same inputs always classify the same way.

use crate::location::{decode_fragment, DocumentLocation};
use std::path::{Path, PathBuf};
use url::Url;

/// File extensions treated as Markdown documents (compared case-insensitively)
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd", "mkdn", "mdtxt", "mdtext"];

/// URL schemes handed to the operating system instead of the viewer
pub const EXTERNAL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Index files probed, in priority order, when a link points at a directory
pub const DIRECTORY_INDEX_NAMES: &[&str] = &[
    "README.md",
    "readme.md",
    "Readme.md",
    "README.markdown",
    "readme.markdown",
    "INDEX.md",
    "index.md",
];

/// Where an activated link should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Scroll within the current document to this element id
    InPageAnchor(String),
    /// Open another Markdown document, possibly at an anchor
    MarkdownTarget(DocumentLocation),
    /// Hand off to the operating system
    External(Url),
    /// Suppress the navigation entirely
    Blocked,
}

/// Classify a candidate URL relative to the open document
///
/// # Parameters
/// * `candidate` - URL or relative reference as it appears in the document
/// * `current_document` - Normalized path of the open document, if any
///
/// # Returns
/// The single [`LinkTarget`] the candidate falls into
pub fn classify(candidate: &str, current_document: Option<&Path>) -> LinkTarget {
    let candidate = candidate.trim();

    if let Some(anchor) = in_page_anchor(candidate, current_document) {
        return LinkTarget::InPageAnchor(anchor);
    }

    if let Some(url) = external_url(candidate) {
        return LinkTarget::External(url);
    }

    if let Some(location) = markdown_target(candidate, current_document) {
        return LinkTarget::MarkdownTarget(location);
    }

    log::debug!("Blocked link: {}", candidate);
    LinkTarget::Blocked
}

/// Anchor id if `candidate` points into the current document
///
/// A fragment-only reference qualifies, as does any reference resolving to
/// the current document's path with a non-empty fragment.
pub fn in_page_anchor(candidate: &str, current_document: Option<&Path>) -> Option<String> {
    let current = current_document?;

    if let Some(fragment) = candidate.strip_prefix('#') {
        return decode_fragment(fragment);
    }

    let resolved = resolve(candidate, Some(current))?;
    if resolved.scheme() != "file" {
        return None;
    }

    let anchor = resolved.fragment().and_then(decode_fragment)?;
    let location = DocumentLocation::from_url(&resolved).ok()?;
    location.is_same_document(current).then_some(anchor)
}

/// Markdown document a local reference points at, following directory indexes
pub fn markdown_target(candidate: &str, current_document: Option<&Path>) -> Option<DocumentLocation> {
    let resolved = resolve(candidate, current_document)?;
    if resolved.scheme() != "file" {
        return None;
    }

    let location = DocumentLocation::from_url(&resolved).ok()?;
    if has_markdown_extension(location.path()) {
        return Some(location);
    }

    let (directory, anchor) = location.into_parts();
    let index = resolve_directory_index(&directory)?;
    Some(DocumentLocation::new(index).with_anchor(anchor))
}

/// Whether the path carries one of [`MARKDOWN_EXTENSIONS`]
pub fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// First index file present in `directory`, or `None` if it is not a
/// directory or holds no index
pub fn resolve_directory_index(directory: &Path) -> Option<PathBuf> {
    if !directory.is_dir() {
        return None;
    }

    DIRECTORY_INDEX_NAMES
        .iter()
        .map(|name| directory.join(name))
        .find(|candidate| candidate.exists())
}

fn external_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    EXTERNAL_SCHEMES
        .contains(&url.scheme())
        .then_some(url)
}

/// Resolve a reference to an absolute URL
///
/// Scheme-less references resolve against the current document; without a
/// current document they cannot be resolved.
fn resolve(candidate: &str, current_document: Option<&Path>) -> Option<Url> {
    match Url::parse(candidate) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::from_file_path(current_document?).ok()?;
            base.join(candidate).ok()
        }
        Err(e) => {
            log::debug!("Unparseable link {}: {}", candidate, e);
            None
        }
    }
}
