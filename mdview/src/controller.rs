//! Navigation controller
//!
//! Owns the current document, the history stacks, the in-flight render
//! operation and the pending anchor. Presentation code observes it through
//! [`ViewerEvent`]s sent on a channel plus accessor methods; the content
//! bridge reports back through [`NavigationController::anchor_consumed`].
//!
//! Renders run on the blocking pool and report back over an internal channel.
//! A completion is applied only when its operation id matches the active
//! operation, so the visible state always follows the most recent request.

use crate::history::{HistoryAction, NavigationHistory};
use crate::location::{normalize_path, DocumentLocation};
use crate::operation::{CompletionResult, OperationId, RenderCompletion, RenderOperation};
use crate::render::{RenderError, RenderOrchestrator, RenderedPayload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What the viewer is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    Loading {
        document: PathBuf,
    },
    Loaded {
        document: PathBuf,
        payload: Arc<RenderedPayload>,
    },
    Failed {
        document: PathBuf,
        error: RenderError,
        raw_text: Option<String>,
    },
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// A render started; previous content and errors are cleared
    Loading { document: PathBuf },
    /// A payload is ready to present, with the anchor to scroll to after load
    Displayed {
        payload: Arc<RenderedPayload>,
        anchor: Option<String>,
    },
    /// A render failed; `raw_text` is the document source if still readable
    Failed {
        document: PathBuf,
        message: String,
        raw_text: Option<String>,
    },
    /// Scroll the displayed document to this anchor
    AnchorRequested(String),
    HistoryChanged { can_go_back: bool, can_go_forward: bool },
    /// Whether the "grant folder access" affordance should be shown
    FolderAccessNeeded(bool),
}

/// Whether a completion changed the visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDisposition {
    Applied,
    Discarded,
}

/// Navigation state machine for one viewer
pub struct NavigationController {
    orchestrator: Arc<RenderOrchestrator>,
    history: NavigationHistory,
    current: Option<PathBuf>,
    display: DisplayState,
    pending_anchor: Option<String>,
    needs_folder_access: bool,
    operation: Option<RenderOperation>,
    next_operation: OperationId,
    completions_tx: UnboundedSender<RenderCompletion>,
    completions_rx: UnboundedReceiver<RenderCompletion>,
    events: UnboundedSender<ViewerEvent>,
}

impl NavigationController {
    /// Create an idle controller publishing to `events`
    pub fn new(orchestrator: Arc<RenderOrchestrator>, events: UnboundedSender<ViewerEvent>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            history: NavigationHistory::new(),
            current: None,
            display: DisplayState::Idle,
            pending_anchor: None,
            needs_folder_access: false,
            operation: None,
            next_operation: 0,
            completions_tx,
            completions_rx,
            events,
        }
    }

    /// Open a document reached by normal navigation
    ///
    /// Reopening the current document does not re-render; its anchor, if
    /// any, is scrolled to instead. Rendering needs a tokio runtime.
    pub fn open(&mut self, location: DocumentLocation) {
        self.navigate(location, HistoryAction::PushCurrent);
    }

    /// Open a document handed over from outside the viewer (file picker,
    /// command line, drag and drop); history starts over
    pub fn open_from_external_source(&mut self, location: DocumentLocation) {
        self.navigate(location, HistoryAction::Reset);
    }

    pub fn go_back(&mut self) {
        let Some(previous) = self.history.step_back(self.current.as_deref()) else {
            return;
        };
        self.publish_history();
        self.navigate(DocumentLocation::new(previous), HistoryAction::Preserve);
    }

    pub fn go_forward(&mut self) {
        let Some(next) = self.history.step_forward(self.current.as_deref()) else {
            return;
        };
        self.publish_history();
        self.navigate(DocumentLocation::new(next), HistoryAction::Preserve);
    }

    /// Re-render the current document; history and pending anchor are kept
    pub fn refresh(&mut self) {
        let Some(document) = self.current.clone() else {
            return;
        };
        log::info!("Refreshing {}", document.display());
        self.start_render(document, None);
    }

    /// Scroll the current document to `anchor` without re-rendering
    pub fn navigate_to_anchor(&mut self, anchor: impl Into<String>) {
        let anchor = anchor.into();
        if anchor.is_empty() || self.current.is_none() {
            return;
        }

        self.pending_anchor = Some(anchor.clone());
        // While loading, the anchor travels with the next Displayed event
        if matches!(self.display, DisplayState::Loaded { .. }) {
            self.emit(ViewerEvent::AnchorRequested(anchor));
        }
    }

    /// The bridge scrolled to `anchor`
    pub fn anchor_consumed(&mut self, anchor: &str) {
        if self.pending_anchor.as_deref() == Some(anchor) {
            log::debug!("Anchor {} consumed", anchor);
            self.pending_anchor = None;
        }
    }

    /// The content surface could not load local assets
    pub fn request_folder_access(&mut self) {
        if !self.needs_folder_access {
            self.needs_folder_access = true;
            self.emit(ViewerEvent::FolderAccessNeeded(true));
        }
    }

    /// The user granted folder access; re-render to pick up local assets
    pub fn folder_access_granted(&mut self) {
        if self.needs_folder_access {
            self.needs_folder_access = false;
            self.emit(ViewerEvent::FolderAccessNeeded(false));
        }
        self.refresh();
    }

    /// Wait for the next render completion and apply it
    ///
    /// Returns `None` only if the completion channel closed, which cannot
    /// happen while the controller is alive.
    pub async fn process_next_completion(&mut self) -> Option<CompletionDisposition> {
        let completion = self.completions_rx.recv().await?;
        Some(self.apply_completion(completion))
    }

    /// Apply every completion that has already arrived, without waiting
    pub fn process_ready_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply_completion(completion) == CompletionDisposition::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Process completions until no render is in flight
    pub async fn wait_until_settled(&mut self) {
        while self.operation.is_some() {
            if self.process_next_completion().await.is_none() {
                break;
            }
        }
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn current_document(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Payload currently on display, if any
    pub fn payload(&self) -> Option<&Arc<RenderedPayload>> {
        match &self.display {
            DisplayState::Loaded { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn pending_anchor(&self) -> Option<&str> {
        self.pending_anchor.as_deref()
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    pub fn is_loading(&self) -> bool {
        self.operation.is_some()
    }

    pub fn needs_folder_access(&self) -> bool {
        self.needs_folder_access
    }

    fn navigate(&mut self, location: DocumentLocation, action: HistoryAction) {
        let (document, anchor) = location.into_parts();

        if action == HistoryAction::Reset {
            self.history.reset();
            self.publish_history();
        }

        if self.is_current(&document) {
            log::debug!("{} already open", document.display());
            if let Some(anchor) = anchor {
                self.navigate_to_anchor(anchor);
            }
            return;
        }

        if action == HistoryAction::PushCurrent {
            self.history.apply(action, self.current.as_deref());
            self.publish_history();
        }

        log::info!("Opening {}", document.display());
        self.current = Some(document.clone());
        self.pending_anchor = None;
        self.start_render(document, anchor);
    }

    fn is_current(&self, document: &Path) -> bool {
        self.current
            .as_deref()
            .is_some_and(|current| normalize_path(current) == normalize_path(document))
    }

    fn start_render(&mut self, document: PathBuf, anchor: Option<String>) {
        if let Some(previous) = self.operation.take() {
            previous.cancel();
        }

        self.next_operation += 1;
        self.display = DisplayState::Loading {
            document: document.clone(),
        };
        self.emit(ViewerEvent::Loading {
            document: document.clone(),
        });

        self.operation = Some(RenderOperation::spawn(
            self.next_operation,
            Arc::clone(&self.orchestrator),
            document,
            anchor,
            self.completions_tx.clone(),
        ));
    }

    fn apply_completion(&mut self, completion: RenderCompletion) -> CompletionDisposition {
        let is_active = self
            .operation
            .as_ref()
            .is_some_and(|operation| operation.id() == completion.operation);
        if !is_active || matches!(completion.result, CompletionResult::Cancelled) {
            log::debug!("Discarding stale render operation {}", completion.operation);
            return CompletionDisposition::Discarded;
        }
        self.operation = None;

        let document = completion.document;
        match completion.result {
            CompletionResult::Rendered(payload) => {
                log::info!(
                    "Rendered {} ({} headings, {} diagnostics)",
                    document.display(),
                    payload.table_of_contents.len(),
                    payload.diagnostics.len()
                );
                for diagnostic in &payload.diagnostics {
                    log::warn!("{}: {}", diagnostic.code, diagnostic.message);
                }

                let payload = Arc::new(payload);
                // An anchor requested while loading wins over the one from the link
                self.pending_anchor = self.pending_anchor.take().or(completion.anchor);
                self.display = DisplayState::Loaded {
                    document,
                    payload: Arc::clone(&payload),
                };
                self.emit(ViewerEvent::Displayed {
                    payload,
                    anchor: self.pending_anchor.clone(),
                });
            }
            CompletionResult::Failed { error, raw_text } => {
                log::warn!("Render failed: {}", error);
                self.pending_anchor = None;
                self.emit(ViewerEvent::Failed {
                    document: document.clone(),
                    message: error.to_string(),
                    raw_text: raw_text.clone(),
                });
                self.display = DisplayState::Failed {
                    document,
                    error,
                    raw_text,
                };
            }
            CompletionResult::Cancelled => return CompletionDisposition::Discarded,
        }

        CompletionDisposition::Applied
    }

    fn publish_history(&self) {
        self.emit(ViewerEvent::HistoryChanged {
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
        });
    }

    fn emit(&self, event: ViewerEvent) {
        if self.events.send(event).is_err() {
            log::trace!("No listener for viewer events");
        }
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        if let Some(operation) = self.operation.take() {
            operation.cancel();
        }
    }
}
