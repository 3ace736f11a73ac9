//! Viewer configuration from mdview.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no config is given
pub const DEFAULT_CONFIG_FILE: &str = "mdview.toml";

/// Main viewer configuration from mdview.toml
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Theme name passed to the render engine and set as the body class
    pub theme: String,

    /// Directory names whose presence marks a repository root
    pub repository_markers: Vec<String>,

    /// Directory whose files replace the bundled shell assets
    pub assets_dir: Option<PathBuf>,

    /// Directories documents may be read from; empty means unrestricted
    pub allowed_roots: Vec<PathBuf>,

    /// Markdown feature switches
    pub render: RenderConfig,

    /// Diagram pan and zoom parameters
    pub diagrams: DiagramConfig,
}

/// Markdown feature switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tables, task lists, strikethrough and footnotes
    pub enable_gfm: bool,

    /// Render `mermaid` fences as diagrams
    pub enable_diagrams: bool,

    /// Typeset `$...$` and `$$...$$` math
    pub enable_math: bool,
}

/// Diagram interaction parameters handed to the viewer script
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Smallest zoom factor
    pub min_scale: f64,

    /// Largest zoom factor
    pub max_scale: f64,

    /// Pixels moved per pan step
    pub pan_step: f64,

    /// Padding kept around a diagram when fitting it to the viewport
    pub fit_padding: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            theme: "github-light".to_string(),
            repository_markers: vec![".git".to_string()],
            assets_dir: None,
            allowed_roots: Vec::new(),
            render: RenderConfig::default(),
            diagrams: DiagramConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enable_gfm: true,
            enable_diagrams: true,
            enable_math: true,
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 6.0,
            pan_step: 80.0,
            fit_padding: 18.0,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ViewerConfig)` - Successfully loaded and validated configuration
    /// * `Err(ConfigError)` - Error reading, parsing or validating the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: ViewerConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Load the explicit file if given, else `mdview.toml` from the working
    /// directory if present, else the defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::debug!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            log::debug!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            return Self::load(local);
        }

        Ok(Self::default())
    }

    /// Check value ranges serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let diagrams = &self.diagrams;
        if diagrams.min_scale.is_nan() || diagrams.min_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "diagrams.min_scale must be positive, got {}",
                diagrams.min_scale
            )));
        }
        if diagrams.max_scale < diagrams.min_scale {
            return Err(ConfigError::Invalid(format!(
                "diagrams.max_scale ({}) is below diagrams.min_scale ({})",
                diagrams.max_scale, diagrams.min_scale
            )));
        }
        if diagrams.pan_step <= 0.0 || diagrams.fit_padding < 0.0 {
            return Err(ConfigError::Invalid(
                "diagrams.pan_step must be positive and diagrams.fit_padding non-negative".to_string(),
            ));
        }
        if self.repository_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "repository_markers must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur when loading or saving the viewer configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// A value is outside its allowed range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
