//! Content bridge between the controller and an embedded content surface
//!
//! Pushes rendered payloads into the surface, runs the scroll-to-anchor
//! protocol once the surface reports load completion, and intercepts
//! navigation attempts made from inside the rendered document.

use crate::link_policy::{self, LinkTarget};
use crate::location::{decode_fragment, normalize_path, DocumentLocation};
use crate::render::RenderedPayload;
use crate::shell::escape_html;
use serde_json::Value;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

/// Errors reported by a content surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("content surface rejected {path}: {reason}", path = .path.display())]
    LoadRejected {
        path: std::path::PathBuf,
        reason: String,
    },

    #[error("script evaluation failed: {0}")]
    Script(String),
}

/// An embedded web view or anything that behaves like one
pub trait ContentSurface {
    /// Load an HTML file, allowing reads beneath `read_access_root`
    fn load_local_file(&mut self, file: &Path, read_access_root: &Path) -> Result<(), SurfaceError>;

    /// Load HTML from a string, resolving relative URLs against `base_directory`
    fn load_raw_content(&mut self, html: &str, base_directory: &Path) -> Result<(), SurfaceError>;

    /// Run a script in the loaded document and return its result
    fn evaluate_script(&mut self, script: &str) -> Result<Value, SurfaceError>;
}

/// What triggered a navigation inside the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOrigin {
    /// The user followed a link in the same window
    LinkActivated,
    /// The document asked for a new window (`target="_blank"`, middle click)
    NewWindowRequested,
    /// Programmatic loads, including the bridge's own
    Other,
}

/// Whether the surface should proceed with a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Cancel,
}

/// Requests from the bridge to the rest of the viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The surface scrolled to this anchor
    AnchorConsumed(String),
    /// Local assets could not be made available; content was loaded without them
    LocalAssetsUnavailable,
    OpenDocument(DocumentLocation),
    OpenExternal(Url),
    ScrollToAnchor(String),
}

/// How the current content reached the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    LocalFile,
    RawContent,
}

/// Result of [`ContentBridge::present`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Loaded(LoadMode),
    /// Same HTML and base directory as already shown; nothing reloaded
    Unchanged,
}

struct Presented {
    payload: Arc<RenderedPayload>,
    mode: LoadMode,
}

/// Drives one content surface
pub struct ContentBridge<S> {
    surface: S,
    events: UnboundedSender<BridgeEvent>,
    presented: Option<Presented>,
    content_file: Option<NamedTempFile>,
    pending_anchor: Option<String>,
    load_complete: bool,
}

impl<S: ContentSurface> ContentBridge<S> {
    pub fn new(surface: S, events: UnboundedSender<BridgeEvent>) -> Self {
        Self {
            surface,
            events,
            presented: None,
            content_file: None,
            pending_anchor: None,
            load_complete: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Document currently presented
    pub fn current_document(&self) -> Option<&Path> {
        self.presented
            .as_ref()
            .map(|presented| presented.payload.document.as_path())
    }

    pub fn load_mode(&self) -> Option<LoadMode> {
        self.presented.as_ref().map(|presented| presented.mode)
    }

    pub fn pending_anchor(&self) -> Option<&str> {
        self.pending_anchor.as_deref()
    }

    /// Whether the surface has reported completion of the last load
    pub fn is_load_complete(&self) -> bool {
        self.load_complete
    }

    /// Show `payload`, scrolling to `anchor` once loaded
    ///
    /// The HTML is written to a hidden file in the document's directory and
    /// loaded with read access to the sandbox root, so relative images and
    /// links resolve. If that fails the HTML is loaded from memory and
    /// [`BridgeEvent::LocalAssetsUnavailable`] is sent.
    pub fn present(
        &mut self,
        payload: Arc<RenderedPayload>,
        anchor: Option<String>,
    ) -> Result<PresentOutcome, SurfaceError> {
        if self.is_presenting(&payload) {
            if anchor.is_some() {
                self.pending_anchor = anchor;
            }
            if self.load_complete {
                self.scroll_to_pending_anchor();
            }
            return Ok(PresentOutcome::Unchanged);
        }

        let mode = self.load(&payload)?;
        log::debug!("Presented {} via {:?}", payload.document.display(), mode);
        self.pending_anchor = anchor;
        self.load_complete = false;
        self.presented = Some(Presented { payload, mode });
        Ok(PresentOutcome::Loaded(mode))
    }

    /// Forget the presented document, its content file and any pending anchor
    pub fn clear(&mut self) {
        self.presented = None;
        self.content_file = None;
        self.pending_anchor = None;
        self.load_complete = false;
    }

    /// Replace the presented document with an error page
    ///
    /// The page shows `raw_text` below the message when the source could
    /// still be read.
    pub fn show_failure(
        &mut self,
        document: &Path,
        message: &str,
        raw_text: Option<&str>,
    ) -> Result<(), SurfaceError> {
        self.clear();
        let base_directory = document.parent().unwrap_or(document);
        self.surface
            .load_raw_content(&failure_page(document, message, raw_text), base_directory)
    }

    /// Record an anchor for the presented document and scroll if loaded
    pub fn request_anchor(&mut self, anchor: impl Into<String>) {
        self.pending_anchor = Some(anchor.into());
        if self.load_complete {
            self.scroll_to_pending_anchor();
        }
    }

    /// The surface finished loading the presented content
    pub fn load_completed(&mut self) {
        self.load_complete = true;
        self.scroll_to_pending_anchor();
    }

    /// Decide a navigation attempted from inside the document
    pub fn navigation_attempt(&mut self, url: &str, origin: NavigationOrigin) -> NavigationDecision {
        if origin == NavigationOrigin::Other {
            return NavigationDecision::Allow;
        }

        let new_window = origin == NavigationOrigin::NewWindowRequested;
        let target = match self.shown_anchor(url) {
            Some(anchor) => LinkTarget::InPageAnchor(anchor),
            None => link_policy::classify(url, self.current_document()),
        };
        match target {
            LinkTarget::InPageAnchor(anchor) => {
                if !new_window {
                    return NavigationDecision::Allow;
                }
                self.send(BridgeEvent::ScrollToAnchor(anchor));
            }
            LinkTarget::MarkdownTarget(location) => self.send(BridgeEvent::OpenDocument(location)),
            LinkTarget::External(url) => {
                if new_window {
                    log::debug!("Suppressed new-window request for {}", url);
                } else {
                    self.send(BridgeEvent::OpenExternal(url));
                }
            }
            LinkTarget::Blocked => log::debug!("Cancelled navigation to {}", url),
        }

        NavigationDecision::Cancel
    }

    /// Anchor of a `file:` URL pointing into what the surface shows
    ///
    /// The surface reports in-page clicks against the content file it loaded,
    /// or against the base directory for raw content, not the Markdown path.
    fn shown_anchor(&self, url: &str) -> Option<String> {
        let url = Url::parse(url.trim()).ok()?;
        if url.scheme() != "file" {
            return None;
        }
        let anchor = url.fragment().and_then(decode_fragment)?;
        let path = normalize_path(&url.to_file_path().ok()?);

        let presented = self.presented.as_ref()?;
        let shown = match presented.mode {
            LoadMode::LocalFile => self.content_file.as_ref()?.path(),
            LoadMode::RawContent => presented.payload.base_directory.as_path(),
        };
        (path == normalize_path(shown)).then_some(anchor)
    }

    fn is_presenting(&self, payload: &RenderedPayload) -> bool {
        self.presented.as_ref().is_some_and(|presented| {
            presented.payload.html == payload.html && presented.payload.base_directory == payload.base_directory
        })
    }

    fn load(&mut self, payload: &RenderedPayload) -> Result<LoadMode, SurfaceError> {
        match write_content_file(&payload.html, &payload.base_directory) {
            Ok(file) => match self
                .surface
                .load_local_file(file.path(), payload.read_access_root())
            {
                Ok(()) => {
                    self.content_file = Some(file);
                    return Ok(LoadMode::LocalFile);
                }
                Err(e) => log::warn!("Local load failed: {}", e),
            },
            Err(e) => log::warn!(
                "Cannot write content file in {}: {}",
                payload.base_directory.display(),
                e
            ),
        }

        self.surface
            .load_raw_content(&payload.html, &payload.base_directory)?;
        self.content_file = None;
        self.send(BridgeEvent::LocalAssetsUnavailable);
        Ok(LoadMode::RawContent)
    }

    fn scroll_to_pending_anchor(&mut self) {
        let Some(anchor) = self.pending_anchor.clone() else {
            return;
        };

        match self.surface.evaluate_script(&scroll_script(&anchor)) {
            Ok(Value::Bool(true)) => {
                self.pending_anchor = None;
                self.send(BridgeEvent::AnchorConsumed(anchor));
            }
            Ok(_) => log::debug!("Anchor {} not present in document", anchor),
            Err(e) => log::warn!("Scroll to {} failed: {}", anchor, e),
        }
    }

    fn send(&self, event: BridgeEvent) {
        if self.events.send(event).is_err() {
            log::trace!("No listener for bridge events");
        }
    }
}

/// Script that scrolls to the element with id `anchor`, evaluating to `true`
/// if it exists and `false` otherwise
pub fn scroll_script(anchor: &str) -> String {
    let id = serde_json::to_string(anchor).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(function () {{ var target = document.getElementById({}); \
         if (!target) {{ return false; }} \
         target.scrollIntoView({{ block: 'start' }}); return true; }})()",
        id
    )
}

fn failure_page(document: &Path, message: &str, raw_text: Option<&str>) -> String {
    let mut output = String::new();
    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    output.push_str("<meta http-equiv=\"Content-Security-Policy\" content=\"default-src 'none'\">\n");
    output.push_str(&format!(
        "<title>{}</title>\n",
        escape_html(&document.display().to_string())
    ));
    output.push_str("</head>\n<body>\n");
    output.push_str(&format!("<p class=\"render-error\">{}</p>\n", escape_html(message)));
    if let Some(text) = raw_text {
        output.push_str(&format!("<pre class=\"raw-text\">{}</pre>\n", escape_html(text)));
    }
    output.push_str("</body>\n</html>\n");
    output
}

fn write_content_file(html: &str, directory: &Path) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(".mdview-")
        .suffix(".html")
        .tempfile_in(directory)?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessSurface, SurfaceLoad};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn payload(dir: &Path, html: &str) -> Arc<RenderedPayload> {
        Arc::new(RenderedPayload {
            document: dir.join("a.md"),
            html: html.to_string(),
            table_of_contents: Vec::new(),
            diagnostics: Vec::new(),
            base_directory: dir.to_path_buf(),
            sandbox_root_directory: dir.to_path_buf(),
            nonce: "n".to_string(),
        })
    }

    fn bridge(surface: HeadlessSurface) -> (ContentBridge<HeadlessSurface>, UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ContentBridge::new(surface, tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<BridgeEvent>) -> Vec<BridgeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_present_loads_local_file_in_base_directory() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());

        let outcome = bridge.present(payload(dir.path(), "<p>hi</p>"), None).unwrap();
        assert_eq!(outcome, PresentOutcome::Loaded(LoadMode::LocalFile));

        match bridge.surface().last_load() {
            Some(SurfaceLoad::LocalFile { file, read_access_root }) => {
                assert_eq!(file.parent(), Some(dir.path()));
                assert!(file.file_name().unwrap().to_string_lossy().starts_with(".mdview-"));
                assert_eq!(read_access_root, dir.path());
                assert_eq!(fs::read_to_string(file).unwrap(), "<p>hi</p>");
            }
            other => panic!("unexpected load: {:?}", other),
        }
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_unwritable_directory_falls_back_to_raw_content() {
        let missing = PathBuf::from("/nonexistent/mdview/docs");
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());

        let outcome = bridge.present(payload(&missing, "<p>hi</p>"), None).unwrap();
        assert_eq!(outcome, PresentOutcome::Loaded(LoadMode::RawContent));
        assert_eq!(drain(&mut rx), vec![BridgeEvent::LocalAssetsUnavailable]);
    }

    #[test]
    fn test_rejected_local_load_falls_back_to_raw_content() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::refusing_local_files());

        let outcome = bridge.present(payload(dir.path(), "<p>hi</p>"), None).unwrap();
        assert_eq!(outcome, PresentOutcome::Loaded(LoadMode::RawContent));
        assert_eq!(bridge.load_mode(), Some(LoadMode::RawContent));
        assert_eq!(drain(&mut rx), vec![BridgeEvent::LocalAssetsUnavailable]);
    }

    #[test]
    fn test_identical_payload_is_not_reloaded_but_anchor_runs() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());
        let html = "<h2 id=\"usage\">Usage</h2>";

        bridge.present(payload(dir.path(), html), None).unwrap();
        bridge.load_completed();
        let outcome = bridge
            .present(payload(dir.path(), html), Some("usage".to_string()))
            .unwrap();

        assert_eq!(outcome, PresentOutcome::Unchanged);
        assert_eq!(bridge.surface().loads().len(), 1);
        assert_eq!(drain(&mut rx), vec![BridgeEvent::AnchorConsumed("usage".to_string())]);
    }

    #[test]
    fn test_anchor_waits_for_load_completion() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());

        bridge
            .present(payload(dir.path(), "<h2 id=\"setup\">Setup</h2>"), Some("setup".to_string()))
            .unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(bridge.pending_anchor(), Some("setup"));

        bridge.load_completed();
        assert_eq!(drain(&mut rx), vec![BridgeEvent::AnchorConsumed("setup".to_string())]);
        assert_eq!(bridge.pending_anchor(), None);

        // Consumed exactly once
        bridge.load_completed();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_missing_anchor_is_silent() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());

        bridge
            .present(payload(dir.path(), "<p>no headings</p>"), Some("nowhere".to_string()))
            .unwrap();
        bridge.load_completed();

        assert!(drain(&mut rx).is_empty());
        assert_eq!(bridge.pending_anchor(), Some("nowhere"));
    }

    #[test]
    fn test_link_activation_decisions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "# A").unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());
        bridge.present(payload(dir.path(), "<p>a</p>"), None).unwrap();

        let click = NavigationOrigin::LinkActivated;
        assert_eq!(bridge.navigation_attempt("#top", click), NavigationDecision::Allow);
        assert_eq!(bridge.navigation_attempt("b.md#x", click), NavigationDecision::Cancel);
        assert_eq!(bridge.navigation_attempt("https://example.com", click), NavigationDecision::Cancel);
        assert_eq!(bridge.navigation_attempt("picture.png", click), NavigationDecision::Cancel);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match &events[0] {
            BridgeEvent::OpenDocument(location) => {
                assert_eq!(location.path(), dir.path().join("b.md").as_path());
                assert_eq!(location.anchor(), Some("x"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(&events[1], BridgeEvent::OpenExternal(url) if url.as_str() == "https://example.com/"));
    }

    #[test]
    fn test_new_window_requests() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());
        bridge.present(payload(dir.path(), "<p>a</p>"), None).unwrap();

        let popup = NavigationOrigin::NewWindowRequested;
        assert_eq!(bridge.navigation_attempt("#top", popup), NavigationDecision::Cancel);
        assert_eq!(bridge.navigation_attempt("c.md", popup), NavigationDecision::Cancel);
        assert_eq!(bridge.navigation_attempt("https://example.com", popup), NavigationDecision::Cancel);

        let events = drain(&mut rx);
        assert_eq!(events[0], BridgeEvent::ScrollToAnchor("top".to_string()));
        assert!(matches!(&events[1], BridgeEvent::OpenDocument(_)));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_anchor_on_content_file_stays_in_page() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::new());
        bridge
            .present(payload(dir.path(), "<h2 id=\"details\">Details</h2>"), None)
            .unwrap();
        let file = match bridge.surface().last_load() {
            Some(SurfaceLoad::LocalFile { file, .. }) => file.clone(),
            other => panic!("unexpected load: {:?}", other),
        };
        let url = format!("{}#details", Url::from_file_path(&file).unwrap());

        assert_eq!(
            bridge.navigation_attempt(&url, NavigationOrigin::LinkActivated),
            NavigationDecision::Allow
        );
        assert!(drain(&mut rx).is_empty());

        assert_eq!(
            bridge.navigation_attempt(&url, NavigationOrigin::NewWindowRequested),
            NavigationDecision::Cancel
        );
        assert_eq!(drain(&mut rx), vec![BridgeEvent::ScrollToAnchor("details".to_string())]);
        assert_eq!(bridge.current_document(), Some(dir.path().join("a.md").as_path()));
    }

    #[test]
    fn test_anchor_on_raw_content_base_stays_in_page() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# Readme").unwrap();
        let (mut bridge, mut rx) = bridge(HeadlessSurface::refusing_local_files());
        bridge
            .present(payload(dir.path(), "<h2 id=\"details\">Details</h2>"), None)
            .unwrap();
        assert_eq!(drain(&mut rx), vec![BridgeEvent::LocalAssetsUnavailable]);

        let base = Url::from_directory_path(dir.path()).unwrap();
        let decision = bridge.navigation_attempt(&format!("{}#details", base), NavigationOrigin::LinkActivated);

        assert_eq!(decision, NavigationDecision::Allow);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(bridge.current_document(), Some(dir.path().join("a.md").as_path()));

        // Without a fragment the directory link still opens its index
        bridge.navigation_attempt(base.as_str(), NavigationOrigin::LinkActivated);
        match drain(&mut rx).as_slice() {
            [BridgeEvent::OpenDocument(location)] => {
                assert_eq!(location.path(), dir.path().join("README.md").as_path());
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    /// Headless surface that can be switched to reject every load
    struct BrokenSurface {
        inner: HeadlessSurface,
        broken: bool,
    }

    impl BrokenSurface {
        fn rejection(&self, path: &Path) -> Result<(), SurfaceError> {
            if self.broken {
                return Err(SurfaceError::LoadRejected {
                    path: path.to_path_buf(),
                    reason: "surface unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    impl ContentSurface for BrokenSurface {
        fn load_local_file(&mut self, file: &Path, read_access_root: &Path) -> Result<(), SurfaceError> {
            self.rejection(file)?;
            self.inner.load_local_file(file, read_access_root)
        }

        fn load_raw_content(&mut self, html: &str, base_directory: &Path) -> Result<(), SurfaceError> {
            self.rejection(base_directory)?;
            self.inner.load_raw_content(html, base_directory)
        }

        fn evaluate_script(&mut self, script: &str) -> Result<Value, SurfaceError> {
            self.inner.evaluate_script(script)
        }
    }

    #[test]
    fn test_failed_present_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let surface = BrokenSurface {
            inner: HeadlessSurface::new(),
            broken: false,
        };
        let mut bridge = ContentBridge::new(surface, tx);
        let first = "<h2 id=\"one\">One</h2>";
        bridge
            .present(payload(dir.path(), first), Some("later".to_string()))
            .unwrap();
        bridge.load_completed();
        assert_eq!(bridge.pending_anchor(), Some("later"));

        bridge.surface_mut().broken = true;
        let result = bridge.present(payload(dir.path(), "<p>two</p>"), Some("two".to_string()));

        assert!(result.is_err());
        assert_eq!(bridge.pending_anchor(), Some("later"));
        assert!(bridge.is_load_complete());
        assert_eq!(bridge.load_mode(), Some(LoadMode::LocalFile));
        assert!(drain(&mut rx).is_empty());

        let content_files = fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .is_ok_and(|entry| entry.file_name().to_string_lossy().starts_with(".mdview-"))
            })
            .count();
        assert_eq!(content_files, 1);

        bridge.surface_mut().broken = false;
        let outcome = bridge.present(payload(dir.path(), first), None).unwrap();
        assert_eq!(outcome, PresentOutcome::Unchanged);
    }

    #[test]
    fn test_clear_forgets_presented_document() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, _rx) = bridge(HeadlessSurface::new());
        bridge
            .present(payload(dir.path(), "<p>a</p>"), Some("top".to_string()))
            .unwrap();
        let file = match bridge.surface().last_load() {
            Some(SurfaceLoad::LocalFile { file, .. }) => file.clone(),
            other => panic!("unexpected load: {:?}", other),
        };

        bridge.clear();

        assert_eq!(bridge.current_document(), None);
        assert_eq!(bridge.load_mode(), None);
        assert_eq!(bridge.pending_anchor(), None);
        assert!(!file.exists());
    }

    #[test]
    fn test_failure_page_replaces_content() {
        let dir = TempDir::new().unwrap();
        let (mut bridge, _rx) = bridge(HeadlessSurface::new());
        bridge
            .present(payload(dir.path(), "<h1 id=\"alpha\">Alpha</h1>"), None)
            .unwrap();

        bridge
            .show_failure(&dir.path().join("b.md"), "engine exited", Some("# Beta <b>"))
            .unwrap();

        let html = bridge.surface().html().unwrap();
        assert!(!html.contains("id=\"alpha\""));
        assert!(html.contains("engine exited"));
        assert!(html.contains("<pre class=\"raw-text\"># Beta &lt;b&gt;</pre>"));
        assert_eq!(
            bridge.surface().last_load(),
            Some(&SurfaceLoad::RawContent {
                base_directory: dir.path().to_path_buf()
            })
        );
        assert_eq!(bridge.current_document(), None);
    }

    #[test]
    fn test_programmatic_loads_are_allowed() {
        let (mut bridge, _rx) = bridge(HeadlessSurface::new());
        assert_eq!(
            bridge.navigation_attempt("file:///anything.html", NavigationOrigin::Other),
            NavigationDecision::Allow
        );
    }

    #[test]
    fn test_scroll_script_encodes_anchor() {
        let script = scroll_script("a\"b");
        assert!(script.contains("getElementById(\"a\\\"b\")"));
    }
}
