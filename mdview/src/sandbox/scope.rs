//! Scoped read access to document files

use super::error::SandboxError;
use crate::location::normalize_path;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Decides whether a document may be read and hands out a grant for it
pub trait ReadAccess: Send + Sync {
    /// Acquire read access to `path` for the lifetime of the returned grant
    fn acquire(&self, path: &Path) -> Result<ReadGrant, SandboxError>;
}

type ReleaseHook = Box<dyn FnOnce(&Path) + Send>;

/// Read access held for one file; released when dropped
pub struct ReadGrant {
    path: PathBuf,
    on_release: Option<ReleaseHook>,
}

impl ReadGrant {
    /// A grant with nothing to release
    pub fn unscoped(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            on_release: None,
        }
    }

    /// A grant that runs `release` when dropped
    pub fn with_release(path: impl Into<PathBuf>, release: impl FnOnce(&Path) + Send + 'static) -> Self {
        Self {
            path: path.into(),
            on_release: Some(Box::new(release)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for ReadGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGrant")
            .field("path", &self.path)
            .field("scoped", &self.on_release.is_some())
            .finish()
    }
}

impl Drop for ReadGrant {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release(&self.path);
        }
    }
}

/// Unrestricted access: every read is allowed
#[derive(Debug, Default, Clone, Copy)]
pub struct AmbientAccess;

impl ReadAccess for AmbientAccess {
    fn acquire(&self, path: &Path) -> Result<ReadGrant, SandboxError> {
        Ok(ReadGrant::unscoped(path))
    }
}

/// Reads confined to a set of granted directories
///
/// Directories can be added at runtime, which is how a user grants access to
/// a folder after a read was denied.
#[derive(Debug, Default)]
pub struct ConfinedAccess {
    roots: RwLock<Vec<PathBuf>>,
}

impl ConfinedAccess {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: RwLock::new(roots.into_iter().map(|root| normalize_path(&root)).collect()),
        }
    }

    /// Allow reads beneath `directory` from now on
    pub fn grant(&self, directory: &Path) {
        let directory = normalize_path(directory);
        let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
        if !roots.contains(&directory) {
            log::info!("Granted read access to {}", directory.display());
            roots.push(directory);
        }
    }

    /// Currently granted directories
    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `path` lies beneath a granted directory
    pub fn permits(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|root| path.starts_with(root))
    }
}

impl ReadAccess for ConfinedAccess {
    fn acquire(&self, path: &Path) -> Result<ReadGrant, SandboxError> {
        if !self.permits(path) {
            return Err(SandboxError::AccessDenied(path.to_path_buf()));
        }

        log::debug!("Acquired read grant for {}", path.display());
        Ok(ReadGrant::with_release(path, |released| {
            log::debug!("Released read grant for {}", released.display());
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_grant_release_runs_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        {
            let grant = ReadGrant::with_release("/repo/a.md", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(grant.path(), Path::new("/repo/a.md"));
            assert_eq!(released.load(Ordering::SeqCst), 0);
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ambient_access_allows_everything() {
        assert!(AmbientAccess.acquire(Path::new("/etc/hosts")).is_ok());
    }

    #[test]
    fn test_confined_access_denies_outside_roots() {
        let access = ConfinedAccess::new([PathBuf::from("/repo")]);

        assert!(access.acquire(Path::new("/repo/docs/a.md")).is_ok());
        assert_eq!(
            access.acquire(Path::new("/repo/../etc/passwd")).unwrap_err(),
            SandboxError::AccessDenied(PathBuf::from("/repo/../etc/passwd"))
        );
        assert!(!access.permits(Path::new("/repository/a.md")));
    }

    #[test]
    fn test_runtime_grant_extends_roots() {
        let access = ConfinedAccess::new(Vec::new());
        assert!(!access.permits(Path::new("/notes/a.md")));

        access.grant(Path::new("/notes"));
        access.grant(Path::new("/notes/"));

        assert!(access.permits(Path::new("/notes/a.md")));
        assert_eq!(access.roots(), vec![PathBuf::from("/notes")]);
    }
}
