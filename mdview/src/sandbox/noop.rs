//! No-op process sandbox for unsupported platforms

use super::error::{SandboxError, SandboxStatus};
use std::path::PathBuf;

/// Enter the sandbox (no-op implementation)
///
/// Returns `SandboxStatus::Unsupported`; reads and writes stay unrestricted.
pub fn enter_sandbox(
    _read_paths: &[PathBuf],
    _write_paths: &[PathBuf],
) -> Result<SandboxStatus, SandboxError> {
    log::warn!("Sandboxing is not available on this platform");
    Ok(SandboxStatus::Unsupported)
}

/// Check if sandboxing is available on this platform
pub fn is_sandboxing_available() -> bool {
    false
}
