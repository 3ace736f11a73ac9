//! Render orchestration
//!
//! Turns a document path into a [`RenderedPayload`]: read the file under a
//! scoped grant, locate the sandbox root, call the render engine once and wrap
//! the fragment in the HTML shell. Nothing is cached between calls.

use crate::assets::{BundledAssets, ResourceLoader};
use crate::config::ViewerConfig;
use crate::engine::{Diagnostic, EngineError, EngineResponse, MarkdownEngine, RenderEngine, RenderRequest, TocEntry};
use crate::operation::CancelToken;
use crate::sandbox::{find_sandbox_root, AmbientAccess, ConfinedAccess, ReadAccess};
use crate::shell::{self, ShellOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Everything the content bridge needs to display one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPayload {
    pub document: PathBuf,
    /// Complete HTML document including the shell
    pub html: String,
    pub table_of_contents: Vec<TocEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub base_directory: PathBuf,
    pub sandbox_root_directory: PathBuf,
    /// Nonce authorizing the shell's scripts
    pub nonce: String,
}

impl RenderedPayload {
    /// Directory the content surface may read local assets from
    pub fn read_access_root(&self) -> &Path {
        &self.sandbox_root_directory
    }
}

/// Errors that can occur while rendering a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Cannot read {path}: {reason}", path = .path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("{path} is not valid UTF-8", path = .path.display())]
    InvalidEncoding { path: PathBuf },

    #[error("Markdown engine failed: {0}")]
    EngineFailure(String),

    #[error("Engine data could not be encoded or decoded: {0}")]
    SerializationFailure(String),

    #[error("Read access denied for {path}", path = .path.display())]
    SandboxAccessDenied { path: PathBuf },
}

impl From<EngineError> for RenderError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Failure(detail) => RenderError::EngineFailure(detail),
            EngineError::Serialization(detail) => RenderError::SerializationFailure(detail),
        }
    }
}

/// Result of a cancellable render
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(RenderedPayload),
    Failed(RenderError),
    /// The token was cancelled at a yield point; no payload was produced
    Cancelled,
}

struct SourceText {
    text: String,
    base_directory: PathBuf,
    sandbox_root_directory: PathBuf,
}

/// Produces payloads for documents
pub struct RenderOrchestrator {
    engine: Arc<dyn RenderEngine>,
    assets: Arc<dyn ResourceLoader>,
    access: Arc<dyn ReadAccess>,
    config: ViewerConfig,
}

impl RenderOrchestrator {
    pub fn new(
        engine: Arc<dyn RenderEngine>,
        assets: Arc<dyn ResourceLoader>,
        access: Arc<dyn ReadAccess>,
        config: ViewerConfig,
    ) -> Self {
        Self {
            engine,
            assets,
            access,
            config,
        }
    }

    /// Built-in engine and assets, with read access taken from `config`
    ///
    /// An empty `allowed_roots` list leaves reads unrestricted.
    pub fn from_config(config: ViewerConfig) -> Self {
        let assets = match &config.assets_dir {
            Some(dir) => BundledAssets::with_directory(dir),
            None => BundledAssets::new(),
        };
        let access: Arc<dyn ReadAccess> = if config.allowed_roots.is_empty() {
            Arc::new(AmbientAccess)
        } else {
            Arc::new(ConfinedAccess::new(config.allowed_roots.clone()))
        };

        Self::new(Arc::new(MarkdownEngine::new()), Arc::new(assets), access, config)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Render a document
    ///
    /// # Parameters
    /// * `document` - Normalized path of the Markdown file
    ///
    /// # Returns
    /// * `Ok(RenderedPayload)` - The complete payload
    /// * `Err(RenderError)` - The first failure encountered
    pub fn render(&self, document: &Path) -> Result<RenderedPayload, RenderError> {
        let source = self.read_source(document)?;
        let response = self.invoke_engine(&source)?;
        Ok(self.assemble(document, source, response))
    }

    /// Render a document, checking `token` after the read and after the engine
    pub fn render_cancellable(&self, document: &Path, token: &CancelToken) -> RenderOutcome {
        if token.is_cancelled() {
            return RenderOutcome::Cancelled;
        }

        let source = match self.read_source(document) {
            Ok(source) => source,
            Err(e) => return RenderOutcome::Failed(e),
        };
        if token.is_cancelled() {
            return RenderOutcome::Cancelled;
        }

        let response = match self.invoke_engine(&source) {
            Ok(response) => response,
            Err(e) => return RenderOutcome::Failed(e),
        };
        if token.is_cancelled() {
            return RenderOutcome::Cancelled;
        }

        RenderOutcome::Rendered(self.assemble(document, source, response))
    }

    /// The document's text if it can still be read, for display after a
    /// failed render
    pub fn raw_text(&self, document: &Path) -> Option<String> {
        let _grant = self.access.acquire(document).ok()?;
        fs::read_to_string(document).ok()
    }

    fn read_source(&self, document: &Path) -> Result<SourceText, RenderError> {
        let _grant = self.access.acquire(document).map_err(|e| {
            log::warn!("{}", e);
            RenderError::SandboxAccessDenied {
                path: document.to_path_buf(),
            }
        })?;

        let bytes = fs::read(document).map_err(|e| RenderError::UnreadableFile {
            path: document.to_path_buf(),
            reason: e.to_string(),
        })?;
        let text = String::from_utf8(bytes).map_err(|_| RenderError::InvalidEncoding {
            path: document.to_path_buf(),
        })?;

        let base_directory = document.parent().unwrap_or(document).to_path_buf();
        let sandbox_root_directory = find_sandbox_root(&base_directory, &self.config.repository_markers);
        log::debug!(
            "Read {} ({} bytes), sandbox root {}",
            document.display(),
            text.len(),
            sandbox_root_directory.display()
        );

        Ok(SourceText {
            text,
            base_directory,
            sandbox_root_directory,
        })
    }

    fn invoke_engine(&self, source: &SourceText) -> Result<EngineResponse, RenderError> {
        let request = RenderRequest {
            text: source.text.clone(),
            enable_gfm: self.config.render.enable_gfm,
            enable_diagrams: self.config.render.enable_diagrams,
            enable_math: self.config.render.enable_math,
            base_directory: source.base_directory.clone(),
            sandbox_root_directory: source.sandbox_root_directory.clone(),
            theme: self.config.theme.clone(),
        };

        self.engine.render(&request).map_err(|e| {
            log::warn!("Render engine error: {}", e);
            RenderError::from(e)
        })
    }

    fn assemble(&self, document: &Path, source: SourceText, response: EngineResponse) -> RenderedPayload {
        let nonce = shell::new_nonce();
        let title = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let options = ShellOptions {
            title: &title,
            theme: &self.config.theme,
            render: &self.config.render,
            diagrams: &self.config.diagrams,
        };
        let html = shell::build_document(&response.html, &nonce, &options, self.assets.as_ref());

        RenderedPayload {
            document: document.to_path_buf(),
            html,
            table_of_contents: response.table_of_contents,
            diagnostics: response.diagnostics,
            base_directory: source.base_directory,
            sandbox_root_directory: source.sandbox_root_directory,
            nonce,
        }
    }
}
