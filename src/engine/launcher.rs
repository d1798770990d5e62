//! Launcher executable discovery.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve the launcher used to run the engine module.
///
/// An explicit path must point at an existing file. A bare name is searched
/// for on `PATH`.
pub fn resolve_launcher(launcher: &Path) -> Result<PathBuf> {
    if launcher.components().count() > 1 {
        if launcher.is_file() {
            return Ok(launcher.to_path_buf());
        }
        return Err(Error::Configuration(format!(
            "launcher not found at {}",
            launcher.display()
        )));
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    find_in_path(launcher.as_os_str(), &path_var).ok_or_else(|| {
        Error::Configuration(format!(
            "{} not found in PATH. Install with: cargo install wasmtime-cli",
            launcher.display()
        ))
    })
}

fn find_in_path(name: &OsStr, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
