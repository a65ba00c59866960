use crate::{
    fs::{remove_if_exists, write_atomic},
    PUBLIC_MODE,
};
use anyhow::Result;
use router_controller_core::RouterConfig;
use std::path::Path;
use tracing::{debug, instrument};

const DH_PARAM_FILE: &str = "dhparam.pem";

/// Writes the configured DH parameters to `dhparam.pem`, or removes the file when none are
/// configured.
#[instrument(skip(config))]
pub fn write_dh_param(config: &RouterConfig, ssl_dir: &Path) -> Result<()> {
    let path = ssl_dir.join(DH_PARAM_FILE);
    match config.ssl.dh_param.as_deref() {
        Some(dh_param) if !dh_param.is_empty() => {
            write_atomic(&path, dh_param.as_bytes(), PUBLIC_MODE)?;
            debug!("Wrote DH parameters");
        }
        _ => {
            if remove_if_exists(&path)? {
                debug!("Removed DH parameters");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::tests::assert_file;

    fn config(dh_param: Option<&str>) -> RouterConfig {
        let mut config = RouterConfig::default();
        config.ssl.dh_param = dh_param.map(ToString::to_string);
        config
    }

    #[test]
    fn writes_dh_param() {
        let dir = tempfile::tempdir().unwrap();
        write_dh_param(&config(Some("bizbar")), dir.path()).unwrap();
        assert_file(&dir.path().join("dhparam.pem"), "bizbar", 0o644);
    }

    #[test]
    fn erases_dh_param() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dhparam.pem");
        std::fs::write(&path, "stale").unwrap();

        write_dh_param(&config(None), dir.path()).unwrap();
        assert!(!path.exists());

        // Already absent.
        write_dh_param(&config(None), dir.path()).unwrap();
        assert!(!path.exists());

        std::fs::write(&path, "stale").unwrap();
        write_dh_param(&config(Some("")), dir.path()).unwrap();
        assert!(!path.exists());
    }
}
