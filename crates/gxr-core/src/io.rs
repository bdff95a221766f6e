//! Cache directory helpers for manifests shipped inside the application.
//!
//! Runtimes load action manifests from the filesystem, so embedded manifest
//! data has to be materialized somewhere first. That somewhere is a per-app
//! subdirectory of the user cache directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// The per-application cache directory, created if missing.
/// `$XDG_CACHE_HOME/<app_name>` when set, otherwise `~/.cache/<app_name>`.
pub fn cache_path(app_name: &str) -> Result<PathBuf> {
    let base = match env::var_os("XDG_CACHE_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home::home_dir()
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no home directory",
                ))
            })?
            .join(".cache"),
    };
    let path = base.join(app_name);
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Write one resource into `cache_dir` and return its full path. An existing
/// file is overwritten so a changed manifest always wins over a stale copy.
pub fn write_resource_to_cache(
    cache_dir: &Path,
    file_name: &str,
    contents: &[u8],
) -> Result<PathBuf> {
    let path = cache_dir.join(file_name);
    fs::write(&path, contents)?;
    debug!(path = %path.display(), bytes = contents.len(), "cached resource");
    Ok(path)
}

/// Load a manifest from its two cached JSON files.
pub fn load_manifest_from_cache(
    cache_dir: &Path,
    actions_file: &str,
    bindings_file: &str,
) -> Result<crate::Manifest> {
    crate::Manifest::from_files(
        &cache_dir.join(actions_file),
        &cache_dir.join(bindings_file),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_are_written_and_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_resource_to_cache(dir.path(), "actions.json", b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");

        let path2 = write_resource_to_cache(dir.path(), "actions.json", b"{\"a\":1}").unwrap();
        assert_eq!(path, path2);
        assert_eq!(fs::read(&path).unwrap(), b"{\"a\":1}");
    }
}
