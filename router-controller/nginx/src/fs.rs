use anyhow::{Context, Result};
use std::{
    fs::Permissions,
    io::{self, Write},
    os::unix::fs::PermissionsExt,
    path::Path,
};

/// Prefix of the temporary files [`write_atomic`] creates next to their targets.
pub(crate) const TEMP_PREFIX: &str = ".router-";

/// Replaces `path` with `contents`, readable according to `mode`.
///
/// The contents are written to a temporary file in the same directory, which is given `mode`
/// before any contents are written and is then renamed over `path`. Readers observe either the
/// previous file or the complete new one. A temporary file orphaned by a crash is swept from the
/// SSL directory by the next certificate pass; elsewhere it is left in place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    tmp.as_file()
        .set_permissions(Permissions::from_mode(mode))
        .with_context(|| format!("setting mode {:o} for {}", mode, path.display()))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .with_context(|| format!("writing {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;

    Ok(())
}

/// Removes `path`, treating an already-absent file as success.
pub(crate) fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Asserts that `path` holds `contents` with exactly `mode`.
    pub(crate) fn assert_file(path: &Path, contents: &str, mode: u32) {
        let actual = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
        assert_eq!(actual, contents, "contents of {}", path.display());
        let actual_mode = std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(
            actual_mode,
            mode,
            "mode of {}: {:o} != {:o}",
            path.display(),
            actual_mode,
            mode
        );
    }

    #[test]
    fn write_atomic_replaces_contents_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.key");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, Permissions::from_mode(0o666)).unwrap();

        write_atomic(&path, b"new", 0o600).unwrap();
        assert_file(&path, "new", 0o600);

        // No temporary files are left behind.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn write_atomic_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("test.crt");
        assert!(write_atomic(&path, b"cert", 0o644).is_err());
    }

    #[test]
    fn remove_if_exists_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        assert!(!remove_if_exists(&path).unwrap());
        std::fs::write(&path, "present").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }
}
