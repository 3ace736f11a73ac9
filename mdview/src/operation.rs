//! In-flight render operations and cooperative cancellation

use crate::render::{RenderError, RenderOrchestrator, RenderOutcome, RenderedPayload};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Identifies one render operation within a controller
pub type OperationId = u64;

/// Shared cancellation flag checked by the render worker at its yield points
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a finished render worker reports back
#[derive(Debug)]
pub enum CompletionResult {
    Rendered(RenderedPayload),
    Failed {
        error: RenderError,
        /// Document text, when it could still be read
        raw_text: Option<String>,
    },
    Cancelled,
}

/// Message sent from the render worker to the controller
#[derive(Debug)]
pub struct RenderCompletion {
    pub operation: OperationId,
    pub document: PathBuf,
    /// Anchor requested together with the navigation
    pub anchor: Option<String>,
    pub result: CompletionResult,
}

/// Handle to a render running on the blocking pool
///
/// The worker always reports exactly one [`RenderCompletion`], including after
/// cancellation, so the receiving side never waits on a silent worker.
#[derive(Debug)]
pub struct RenderOperation {
    id: OperationId,
    document: PathBuf,
    token: CancelToken,
}

impl RenderOperation {
    /// Start rendering `document` on the blocking pool
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        id: OperationId,
        orchestrator: Arc<RenderOrchestrator>,
        document: PathBuf,
        anchor: Option<String>,
        completions: UnboundedSender<RenderCompletion>,
    ) -> Self {
        let token = CancelToken::new();
        let worker_token = token.clone();
        let worker_document = document.clone();

        log::debug!("Render operation {} started for {}", id, document.display());
        tokio::task::spawn_blocking(move || {
            let result = match orchestrator.render_cancellable(&worker_document, &worker_token) {
                RenderOutcome::Rendered(payload) => CompletionResult::Rendered(payload),
                RenderOutcome::Cancelled => CompletionResult::Cancelled,
                RenderOutcome::Failed(_) if worker_token.is_cancelled() => CompletionResult::Cancelled,
                RenderOutcome::Failed(error) => CompletionResult::Failed {
                    raw_text: orchestrator.raw_text(&worker_document),
                    error,
                },
            };

            let completion = RenderCompletion {
                operation: id,
                document: worker_document,
                anchor,
                result,
            };
            if completions.send(completion).is_err() {
                log::debug!("Render operation {} finished after its controller was dropped", id);
            }
        });

        Self { id, document, token }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Ask the worker to stop at its next yield point
    pub fn cancel(&self) {
        log::debug!("Render operation {} cancelled", self.id);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
