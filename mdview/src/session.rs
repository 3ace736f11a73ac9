//! A viewer session: one controller wired to one content bridge
//!
//! Routes controller events into the bridge (present payloads, scroll
//! requests) and bridge events back into the controller (consumed anchors,
//! link navigation, folder access), handing external links to the OS.

use crate::bridge::{BridgeEvent, ContentBridge, ContentSurface, NavigationDecision, NavigationOrigin};
use crate::controller::{NavigationController, ViewerEvent};
use crate::render::RenderOrchestrator;
use std::io;
use std::process::Command;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use url::Url;

/// Hands external URLs to whatever the platform uses to open them
pub trait ExternalOpener {
    fn open_external(&self, url: &Url) -> io::Result<()>;
}

/// Opens URLs with the platform's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open_external(&self, url: &Url) -> io::Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]);
            command
        } else {
            Command::new("xdg-open")
        };

        command.arg(url.as_str()).spawn().map(|_| ())
    }
}

/// Controller, bridge and the routing between them
pub struct ViewerSession<S: ContentSurface> {
    controller: NavigationController,
    bridge: ContentBridge<S>,
    viewer_events: UnboundedReceiver<ViewerEvent>,
    bridge_events: UnboundedReceiver<BridgeEvent>,
    opener: Box<dyn ExternalOpener>,
}

impl<S: ContentSurface> ViewerSession<S> {
    pub fn new(orchestrator: Arc<RenderOrchestrator>, surface: S, opener: Box<dyn ExternalOpener>) -> Self {
        let (viewer_tx, viewer_events) = mpsc::unbounded_channel();
        let (bridge_tx, bridge_events) = mpsc::unbounded_channel();
        Self {
            controller: NavigationController::new(orchestrator, viewer_tx),
            bridge: ContentBridge::new(surface, bridge_tx),
            viewer_events,
            bridge_events,
            opener,
        }
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    /// Controller access for issuing navigation; call [`Self::route`] after
    pub fn controller_mut(&mut self) -> &mut NavigationController {
        &mut self.controller
    }

    pub fn bridge(&self) -> &ContentBridge<S> {
        &self.bridge
    }

    pub fn surface(&self) -> &S {
        self.bridge.surface()
    }

    /// Deliver pending events in both directions until none are left
    ///
    /// Returns the controller events seen, for the presentation layer.
    pub fn route(&mut self) -> Vec<ViewerEvent> {
        let mut observed = Vec::new();
        loop {
            let mut progressed = false;

            while let Ok(event) = self.viewer_events.try_recv() {
                progressed = true;
                self.deliver_to_bridge(&event);
                observed.push(event);
            }

            while let Ok(event) = self.bridge_events.try_recv() {
                progressed = true;
                self.deliver_to_controller(event);
            }

            if !progressed {
                return observed;
            }
        }
    }

    /// Route events and apply render completions until nothing is in flight
    pub async fn settle(&mut self) -> Vec<ViewerEvent> {
        let mut observed = self.route();
        while self.controller.is_loading() {
            self.controller.wait_until_settled().await;
            observed.extend(self.route());
        }
        observed
    }

    /// The surface finished loading; runs the anchor protocol
    pub fn load_completed(&mut self) -> Vec<ViewerEvent> {
        self.bridge.load_completed();
        self.route()
    }

    /// A navigation attempted from inside the content
    pub fn navigation_attempt(&mut self, url: &str, origin: NavigationOrigin) -> NavigationDecision {
        let decision = self.bridge.navigation_attempt(url, origin);
        self.route();
        decision
    }

    fn deliver_to_bridge(&mut self, event: &ViewerEvent) {
        match event {
            ViewerEvent::Displayed { payload, anchor } => {
                if let Err(e) = self.bridge.present(Arc::clone(payload), anchor.clone()) {
                    log::error!("Cannot present {}: {}", payload.document.display(), e);
                }
            }
            ViewerEvent::AnchorRequested(anchor) => self.bridge.request_anchor(anchor.clone()),
            ViewerEvent::Loading { .. } => self.bridge.clear(),
            ViewerEvent::Failed {
                document,
                message,
                raw_text,
            } => {
                if let Err(e) = self.bridge.show_failure(document, message, raw_text.as_deref()) {
                    log::error!("Cannot show failure for {}: {}", document.display(), e);
                }
            }
            ViewerEvent::HistoryChanged { .. } | ViewerEvent::FolderAccessNeeded(_) => {}
        }
    }

    fn deliver_to_controller(&mut self, event: BridgeEvent) {
        match event {
            BridgeEvent::AnchorConsumed(anchor) => self.controller.anchor_consumed(&anchor),
            BridgeEvent::LocalAssetsUnavailable => self.controller.request_folder_access(),
            BridgeEvent::OpenDocument(location) => self.controller.open(location),
            BridgeEvent::ScrollToAnchor(anchor) => self.controller.navigate_to_anchor(anchor),
            BridgeEvent::OpenExternal(url) => {
                log::info!("Opening {} externally", url);
                if let Err(e) = self.opener.open_external(&url) {
                    log::warn!("Cannot open {}: {}", url, e);
                }
            }
        }
    }
}
