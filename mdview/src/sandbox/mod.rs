//! Sandboxing for document reads and for the render process
//!
//! Two layers live here:
//! - Read confinement ([`ReadAccess`]): every document read goes through a
//!   scoped [`ReadGrant`], and [`ConfinedAccess`] limits reads to granted
//!   directories. [`find_sandbox_root`] locates the repository root that
//!   bounds local resources.
//! - Process confinement ([`enter_sandbox`]), used by one-shot renders:
//!   - On Linux 5.13+: landlock (filesystem) + seccomp (syscall filtering)
//!   - On other platforms: no-op that logs a warning
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use mdview::sandbox::enter_sandbox;
//!
//! let read = vec![PathBuf::from("/path/to/repo")];
//! let write = vec![PathBuf::from("/path/to/output")];
//!
//! match enter_sandbox(&read, &write) {
//!     Ok(status) => println!("Sandbox active: {}", status),
//!     Err(e) => eprintln!("Sandbox failed: {}", e),
//! }
//! ```

mod error;
mod root;
mod scope;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod noop;

pub use error::{SandboxError, SandboxStatus};
pub use root::find_sandbox_root;
pub use scope::{AmbientAccess, ConfinedAccess, ReadAccess, ReadGrant};

#[cfg(target_os = "linux")]
pub use linux::{enter_sandbox, is_sandboxing_available};

#[cfg(not(target_os = "linux"))]
pub use noop::{enter_sandbox, is_sandboxing_available};
