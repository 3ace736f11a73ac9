//! Content surface without a display
//!
//! Keeps the loaded HTML in memory and answers the scroll script by looking
//! for the element id in the markup. Drives the `browse` command and tests.

use crate::bridge::{ContentSurface, SurfaceError};
use crate::shell::escape_html;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One load request received by the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceLoad {
    LocalFile { file: PathBuf, read_access_root: PathBuf },
    RawContent { base_directory: PathBuf },
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    loads: Vec<SurfaceLoad>,
    html: Option<String>,
    scripts: Vec<String>,
    refuse_local_files: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that rejects every local file load, like a web view without
    /// file access
    pub fn refusing_local_files() -> Self {
        Self {
            refuse_local_files: true,
            ..Self::default()
        }
    }

    pub fn loads(&self) -> &[SurfaceLoad] {
        &self.loads
    }

    pub fn last_load(&self) -> Option<&SurfaceLoad> {
        self.loads.last()
    }

    /// HTML of the document currently loaded
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Scripts evaluated so far, oldest first
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    fn has_element(&self, id: &str) -> bool {
        let needle = format!("id=\"{}\"", escape_html(id));
        self.html.as_deref().is_some_and(|html| html.contains(&needle))
    }
}

impl ContentSurface for HeadlessSurface {
    fn load_local_file(&mut self, file: &Path, read_access_root: &Path) -> Result<(), SurfaceError> {
        if self.refuse_local_files {
            return Err(SurfaceError::LoadRejected {
                path: file.to_path_buf(),
                reason: "local file access disabled".to_string(),
            });
        }

        let html = fs::read_to_string(file).map_err(|e| SurfaceError::LoadRejected {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })?;

        self.html = Some(html);
        self.loads.push(SurfaceLoad::LocalFile {
            file: file.to_path_buf(),
            read_access_root: read_access_root.to_path_buf(),
        });
        Ok(())
    }

    fn load_raw_content(&mut self, html: &str, base_directory: &Path) -> Result<(), SurfaceError> {
        self.html = Some(html.to_string());
        self.loads.push(SurfaceLoad::RawContent {
            base_directory: base_directory.to_path_buf(),
        });
        Ok(())
    }

    fn evaluate_script(&mut self, script: &str) -> Result<Value, SurfaceError> {
        self.scripts.push(script.to_string());
        match element_lookup(script) {
            Some(id) => Ok(Value::Bool(self.has_element(&id))),
            None => Ok(Value::Null),
        }
    }
}

/// The id passed to `document.getElementById` in a script, if any
fn element_lookup(script: &str) -> Option<String> {
    static LOOKUP: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = LOOKUP
        .get_or_init(|| Regex::new(r#"getElementById\(("(?:[^"\\]|\\.)*")\)"#).ok())
        .as_ref()?;

    let literal = pattern.captures(script)?.get(1)?.as_str();
    serde_json::from_str(literal).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::scroll_script;

    #[test]
    fn test_scroll_script_finds_existing_element() {
        let mut surface = HeadlessSurface::new();
        surface
            .load_raw_content("<h2 id=\"usage\">Usage</h2>", Path::new("/repo"))
            .unwrap();

        assert_eq!(surface.evaluate_script(&scroll_script("usage")).unwrap(), Value::Bool(true));
        assert_eq!(surface.evaluate_script(&scroll_script("other")).unwrap(), Value::Bool(false));
        assert_eq!(surface.scripts().len(), 2);
    }

    #[test]
    fn test_unknown_scripts_evaluate_to_null() {
        let mut surface = HeadlessSurface::new();
        assert_eq!(surface.evaluate_script("1 + 1").unwrap(), Value::Null);
    }

    #[test]
    fn test_element_lookup_decodes_escapes() {
        assert_eq!(element_lookup(&scroll_script("a\"b")), Some("a\"b".to_string()));
    }

    #[test]
    fn test_refusing_surface_rejects_local_files() {
        let mut surface = HeadlessSurface::refusing_local_files();
        assert!(surface
            .load_local_file(Path::new("/repo/.mdview-x.html"), Path::new("/repo"))
            .is_err());
        assert!(surface.loads().is_empty());
    }
}
