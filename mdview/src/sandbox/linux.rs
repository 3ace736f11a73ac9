//! Linux process sandbox using landlock and seccomp

use super::error::{SandboxError, SandboxStatus};
use landlock::{
    Access, AccessFs, BitFlags, PathBeneath, Ruleset, RulesetAttr, RulesetCreated,
    RulesetCreatedAttr, RulesetStatus, ABI,
};
use seccompiler::{BpfProgram, SeccompAction, SeccompFilter, SeccompRule};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Enter the sandbox with filesystem and syscall restrictions
///
/// This function performs two levels of sandboxing:
/// 1. Landlock: read-only access beneath `read_paths`, full access beneath
///    `write_paths`, nothing elsewhere
/// 2. Seccomp: Blocks network, exec, and fork syscalls
///
/// # Arguments
/// * `read_paths` - Directories the renderer reads from (repository root, asset directory)
/// * `write_paths` - Directories output is written to
///
/// # Returns
/// Status indicating what protections are active
pub fn enter_sandbox(
    read_paths: &[PathBuf],
    write_paths: &[PathBuf],
) -> Result<SandboxStatus, SandboxError> {
    let mut landlock_ok = false;
    let mut seccomp_ok = false;

    match setup_landlock(read_paths, write_paths) {
        Ok(()) => {
            log::info!("Landlock filesystem restriction active");
            landlock_ok = true;
        }
        Err(e) => {
            log::warn!("Failed to initialize landlock: {}", e);
        }
    }

    match setup_seccomp() {
        Ok(()) => {
            log::info!("Seccomp syscall filtering active");
            seccomp_ok = true;
        }
        Err(e) => {
            log::warn!("Failed to initialize seccomp: {}", e);
        }
    }

    let status = match (landlock_ok, seccomp_ok) {
        (true, true) => SandboxStatus::Full,
        (true, false) => SandboxStatus::FilesystemOnly,
        (false, true) => SandboxStatus::NetworkExecOnly,
        (false, false) => SandboxStatus::None,
    };

    Ok(status)
}

/// Set up landlock filesystem restriction
fn setup_landlock(read_paths: &[PathBuf], write_paths: &[PathBuf]) -> Result<(), SandboxError> {
    // V1 is sufficient for read/write separation
    let abi = ABI::V1;

    let mut ruleset = Ruleset::default()
        .handle_access(AccessFs::from_all(abi))
        .map_err(|e| SandboxError::LandlockError(format!("Failed to create ruleset: {}", e)))?
        .create()
        .map_err(|e| SandboxError::LandlockError(format!("Failed to create ruleset: {}", e)))?;

    for path in read_paths {
        ruleset = add_path_rule(ruleset, path, AccessFs::from_read(abi))?;
    }
    for path in write_paths {
        ruleset = add_path_rule(ruleset, path, AccessFs::from_all(abi))?;
    }

    let status = ruleset
        .restrict_self()
        .map_err(|e| SandboxError::LandlockError(format!("Failed to restrict self: {}", e)))?;

    match status.ruleset {
        RulesetStatus::FullyEnforced => log::info!("Landlock fully enforced"),
        RulesetStatus::PartiallyEnforced => {
            log::warn!("Landlock partially enforced (some restrictions may not be active)")
        }
        RulesetStatus::NotEnforced => {
            return Err(SandboxError::LandlockError(
                "Landlock not enforced".to_string(),
            ))
        }
    }

    Ok(())
}

fn add_path_rule(
    ruleset: RulesetCreated,
    path: &Path,
    access: BitFlags<AccessFs>,
) -> Result<RulesetCreated, SandboxError> {
    let canonical_path = path.canonicalize().map_err(|e| {
        SandboxError::LandlockError(format!(
            "Failed to canonicalize path {}: {}",
            path.display(),
            e
        ))
    })?;

    let dir_fd = std::fs::File::open(&canonical_path).map_err(|e| {
        SandboxError::LandlockError(format!(
            "Failed to open path {}: {}",
            canonical_path.display(),
            e
        ))
    })?;

    let ruleset = ruleset
        .add_rule(PathBeneath::new(dir_fd, access))
        .map_err(|e| SandboxError::LandlockError(format!("Failed to add rule for path: {}", e)))?;

    log::debug!("Added landlock rule for path: {}", path.display());
    Ok(ruleset)
}

/// Set up seccomp syscall filtering
///
/// Blocks network, exec, and fork syscalls
fn setup_seccomp() -> Result<(), SandboxError> {
    let mut filter_map: BTreeMap<i64, Vec<SeccompRule>> = BTreeMap::new();

    let network_syscalls = [
        libc::SYS_socket,
        libc::SYS_socketpair,
        libc::SYS_connect,
        libc::SYS_bind,
        libc::SYS_listen,
        libc::SYS_accept,
        libc::SYS_accept4,
    ];
    let exec_syscalls = [libc::SYS_execve, libc::SYS_execveat];
    // clone stays allowed: the blocking render workers are threads
    let fork_syscalls = [libc::SYS_fork, libc::SYS_vfork];

    for syscall in network_syscalls
        .iter()
        .chain(exec_syscalls.iter())
        .chain(fork_syscalls.iter())
    {
        filter_map.insert(*syscall, vec![]);
    }

    let filter = SeccompFilter::new(
        filter_map,
        SeccompAction::Allow,
        SeccompAction::Errno(libc::EPERM as u32),
        std::env::consts::ARCH.try_into().map_err(|e| {
            SandboxError::SeccompError(format!("Unsupported architecture: {:?}", e))
        })?,
    )
    .map_err(|e| SandboxError::SeccompError(format!("Failed to create filter: {}", e)))?;

    let bpf_program: BpfProgram = filter
        .try_into()
        .map_err(|e| SandboxError::SeccompError(format!("Failed to compile filter: {}", e)))?;

    seccompiler::apply_filter(&bpf_program)
        .map_err(|e| SandboxError::SeccompError(format!("Failed to apply filter: {}", e)))?;

    Ok(())
}

/// Check if sandboxing is available on this platform
pub fn is_sandboxing_available() -> bool {
    Ruleset::default()
        .handle_access(AccessFs::from_all(ABI::V1))
        .and_then(|r| r.create())
        .is_ok()
}
