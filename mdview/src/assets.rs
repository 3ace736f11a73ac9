//! Static assets injected into the HTML shell

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Assets the shell embeds inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellAsset {
    Stylesheet,
    DiagramEngine,
    MathEngine,
    InteractionScript,
}

impl ShellAsset {
    /// Scripts in the order they are injected
    pub const SCRIPTS: [ShellAsset; 3] = [
        ShellAsset::DiagramEngine,
        ShellAsset::MathEngine,
        ShellAsset::InteractionScript,
    ];

    /// File name looked up in an asset override directory
    pub fn file_name(self) -> &'static str {
        match self {
            ShellAsset::Stylesheet => "viewer.css",
            ShellAsset::DiagramEngine => "mermaid.min.js",
            ShellAsset::MathEngine => "mathjax.js",
            ShellAsset::InteractionScript => "viewer-shell.js",
        }
    }
}

/// Source of shell asset text
///
/// An asset that is not available yields an empty string.
pub trait ResourceLoader: Send + Sync {
    fn load_asset(&self, asset: ShellAsset) -> String;
}

/// Assets compiled into the binary, optionally overridden from a directory
///
/// The diagram and math engines are not bundled; supply them through the
/// override directory to enable client-side rendering.
#[derive(Debug, Clone, Default)]
pub struct BundledAssets {
    override_dir: Option<PathBuf>,
}

impl BundledAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer files from `dir` over the bundled copies
    pub fn with_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    fn bundled(asset: ShellAsset) -> &'static str {
        match asset {
            ShellAsset::Stylesheet => include_str!("../assets/viewer.css"),
            ShellAsset::InteractionScript => include_str!("../assets/viewer-shell.js"),
            ShellAsset::DiagramEngine | ShellAsset::MathEngine => "",
        }
    }
}

impl ResourceLoader for BundledAssets {
    fn load_asset(&self, asset: ShellAsset) -> String {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(asset.file_name());
            match fs::read_to_string(&path) {
                Ok(text) => return text,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => log::warn!("Cannot read asset {}: {}", path.display(), e),
            }
        }

        Self::bundled(asset).to_string()
    }
}
