//! mdview - Markdown document viewer core
//!
//! Navigation and rendering orchestration for a viewer that displays
//! Markdown files from disk: link classification, rendering into a
//! self-contained HTML shell, back/forward history with cancellable
//! background renders, and the bridge to an embedded content surface.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod assets;
pub mod bridge;
pub mod config;
pub mod controller;
pub mod engine;
pub mod headless;
pub mod history;
pub mod link_policy;
pub mod location;
pub mod operation;
pub mod render;
pub mod sandbox;
pub mod session;
pub mod shell;

pub use bridge::{ContentBridge, ContentSurface, NavigationDecision, NavigationOrigin};
pub use config::ViewerConfig;
pub use controller::{DisplayState, NavigationController, ViewerEvent};
pub use link_policy::LinkTarget;
pub use location::DocumentLocation;
pub use render::{RenderError, RenderOrchestrator, RenderedPayload};
pub use session::ViewerSession;
