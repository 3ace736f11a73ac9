//! Document locations and path normalization
//!
//! A location names a Markdown file on disk plus an optional anchor taken
//! from a URL fragment. Identity is the normalized path alone: two locations
//! that differ only by fragment refer to the same document.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur when turning user input into a document location
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The URL uses a scheme other than `file`
    #[error("not a local file URL: {0}")]
    NotLocalFile(String),

    /// The URL is a `file` URL but has no usable filesystem path
    #[error("file URL has no local path: {0}")]
    InvalidFileUrl(String),
}

/// A normalized document path with an optional anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    path: PathBuf,
    anchor: Option<String>,
}

impl DocumentLocation {
    /// Create a location for `path`, normalizing it
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            anchor: None,
        }
    }

    /// Attach an anchor; empty anchors are dropped
    pub fn with_anchor(mut self, anchor: Option<String>) -> Self {
        self.anchor = anchor.filter(|a| !a.is_empty());
        self
    }

    /// Build a location from a `file:` URL, stripping query and fragment
    ///
    /// The fragment becomes the anchor after percent-decoding.
    pub fn from_url(url: &Url) -> Result<Self, LocationError> {
        if url.scheme() != "file" {
            return Err(LocationError::NotLocalFile(url.to_string()));
        }

        let mut stripped = url.clone();
        stripped.set_query(None);
        stripped.set_fragment(None);
        let path = stripped
            .to_file_path()
            .map_err(|()| LocationError::InvalidFileUrl(url.to_string()))?;

        Ok(Self::new(path).with_anchor(url.fragment().and_then(decode_fragment)))
    }

    /// Parse either a `file:` URL or a plain filesystem path
    ///
    /// Relative paths are resolved against the working directory.
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        match Url::parse(input) {
            Ok(url) if url.scheme() == "file" => Self::from_url(&url),
            // Single-letter schemes are Windows drive prefixes, not URLs
            Ok(url) if url.scheme().len() > 1 => Err(LocationError::NotLocalFile(input.to_string())),
            _ => Ok(Self::new(input)),
        }
    }

    /// The normalized document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The decoded anchor, if any
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Whether this location names the same document as `other`
    pub fn is_same_document(&self, other: &Path) -> bool {
        self.path == normalize_path(other)
    }

    /// Split into the normalized path and the anchor
    pub fn into_parts(self) -> (PathBuf, Option<String>) {
        (self.path, self.anchor)
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Some(anchor) => write!(f, "{}#{}", self.path.display(), anchor),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

impl From<PathBuf> for DocumentLocation {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for DocumentLocation {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

/// Percent-decode a URL fragment into an anchor identifier
///
/// Returns `None` for an empty fragment. Invalid UTF-8 after decoding keeps
/// the fragment as written.
pub fn decode_fragment(fragment: &str) -> Option<String> {
    if fragment.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(fragment)
        .decode_utf8()
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| fragment.to_string());
    Some(decoded)
}

/// Make a path absolute and remove `.` and `..` components lexically
///
/// Symlinks are not resolved, so the result does not depend on the file
/// existing. `..` at the filesystem root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    normalized
}

/// Whether two paths name the same document after normalization
pub fn same_document(lhs: &Path, rhs: &Path) -> bool {
    normalize_path(lhs) == normalize_path(rhs)
}
