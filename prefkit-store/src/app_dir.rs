//! Process-wide application directory
//!
//! Stores opened by name (without an explicit directory) live here. On
//! desktop a relative name resolves under the per-user configuration root and
//! is created on demand; on Android and iOS the host app must pass an
//! absolute directory that already exists. Absolute paths are always used
//! verbatim.

use crate::{Error, Result};
use directories::BaseDirs;
use parking_lot::RwLock;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

const MOBILE: bool = cfg!(any(target_os = "android", target_os = "ios"));

static APP_DIR: OnceLock<RwLock<Option<PathBuf>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<PathBuf>> {
    APP_DIR.get_or_init(|| RwLock::new(None))
}

/// Resolve `name` to a directory without touching the global setting.
pub fn resolve_app_dir(name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("app directory name is empty".to_string()));
    }

    let requested = Path::new(name);
    if requested.is_absolute() {
        if MOBILE {
            if !requested.is_dir() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("app directory {} does not exist", requested.display()),
                )));
            }
        } else {
            fs::create_dir_all(requested)?;
        }
        return Ok(requested.to_path_buf());
    }

    if MOBILE {
        return Err(Error::InvalidArgument(format!(
            "app directory must be an absolute path on this platform: `{name}`"
        )));
    }

    // Relative names must stay under the configuration root
    if !requested
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(Error::InvalidArgument(format!(
            "app directory name must not contain `.`, `..` or a drive prefix: `{name}`"
        )));
    }

    let base = BaseDirs::new().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no per-user configuration directory on this system",
        ))
    })?;
    let dir = base.config_dir().join(requested);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Resolve and install the application directory. Affects later opens only.
pub fn set_app_dir(name: &str) -> Result<PathBuf> {
    let dir = resolve_app_dir(name)?;
    tracing::debug!("Preferences app directory set to {}", dir.display());
    *slot().write() = Some(dir.clone());
    Ok(dir)
}

/// The configured directory, or [`Error::AppDirNotSet`].
pub fn app_dir() -> Result<PathBuf> {
    slot().read().clone().ok_or(Error::AppDirNotSet)
}

/// Forget the configured directory.
pub fn reset_app_dir() {
    *slot().write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(resolve_app_dir(""), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_relative_name_cannot_escape_config_root() {
        for name in ["..", "../../tmp/x", "app/../../etc", "./app"] {
            assert!(
                matches!(resolve_app_dir(name), Err(Error::InvalidArgument(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_absolute_path_verbatim() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("app");
        let resolved = resolve_app_dir(dir.to_str().unwrap()).unwrap();
        assert_eq!(resolved, dir);
        assert!(dir.is_dir());
    }
}
