//! Markdown render engine boundary
//!
//! The viewer core never parses Markdown itself. It hands the source text and
//! options to a [`RenderEngine`] and receives an HTML fragment, a table of
//! contents and diagnostics back.

mod markdown;

pub use markdown::{slugify, MarkdownEngine};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything an engine needs to render one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub text: String,
    pub enable_gfm: bool,
    pub enable_diagrams: bool,
    pub enable_math: bool,
    pub base_directory: PathBuf,
    pub sandbox_root_directory: PathBuf,
    pub theme: String,
}

/// Engine output for one document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineResponse {
    pub html: String,
    #[serde(default)]
    pub table_of_contents: Vec<TocEntry>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// One heading in the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level, 1 through 6
    pub level: u8,
    pub title: String,
    /// Element id of the heading in the rendered HTML
    pub anchor: String,
}

/// A non-fatal finding reported while rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// Engine failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not render the document
    #[error("{0}")]
    Failure(String),

    /// The request or response could not cross the engine boundary
    #[error("{0}")]
    Serialization(String),
}

/// A Markdown renderer
///
/// Implementations must be callable from a blocking worker thread.
pub trait RenderEngine: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<EngineResponse, EngineError>;
}

/// Options as they travel across a JSON boundary
#[derive(Serialize)]
struct WireOptions<'a> {
    enable_gfm: bool,
    enable_diagrams: bool,
    enable_math: bool,
    base_dir: &'a Path,
    allowed_root_dir: &'a Path,
    theme: &'a str,
}

impl<'a> From<&'a RenderRequest> for WireOptions<'a> {
    fn from(request: &'a RenderRequest) -> Self {
        Self {
            enable_gfm: request.enable_gfm,
            enable_diagrams: request.enable_diagrams,
            enable_math: request.enable_math,
            base_dir: &request.base_directory,
            allowed_root_dir: &request.sandbox_root_directory,
            theme: &request.theme,
        }
    }
}

/// Adapter for engines that exchange JSON strings, such as a C ABI renderer
///
/// The wrapped call receives the Markdown text and the options encoded as
/// JSON and returns either the encoded [`EngineResponse`] or an error message.
pub struct JsonBoundary<F> {
    call: F,
}

impl<F> JsonBoundary<F>
where
    F: Fn(&str, &str) -> Result<String, String> + Send + Sync,
{
    pub fn new(call: F) -> Self {
        Self { call }
    }
}

impl<F> RenderEngine for JsonBoundary<F>
where
    F: Fn(&str, &str) -> Result<String, String> + Send + Sync,
{
    fn render(&self, request: &RenderRequest) -> Result<EngineResponse, EngineError> {
        let options = serde_json::to_string(&WireOptions::from(request))
            .map_err(|e| EngineError::Serialization(format!("cannot encode options: {}", e)))?;

        let encoded = (self.call)(&request.text, &options).map_err(EngineError::Failure)?;

        serde_json::from_str(&encoded)
            .map_err(|e| EngineError::Serialization(format!("cannot decode engine output: {}", e)))
    }
}
