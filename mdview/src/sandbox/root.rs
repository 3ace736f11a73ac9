//! Repository root discovery

use std::path::{Path, PathBuf};

/// Walk up from `base_directory` to the nearest directory holding one of
/// `markers` as a subdirectory
///
/// Falls back to `base_directory` when no ancestor carries a marker. Nothing
/// is cached; every call walks the filesystem again.
pub fn find_sandbox_root(base_directory: &Path, markers: &[String]) -> PathBuf {
    base_directory
        .ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).is_dir()))
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base_directory.to_path_buf())
}
