//! Router controller reconciliation.
//!
//! A reconciliation pass turns already-fetched cluster resources into a configuration snapshot
//! and materializes it:
//!
//! ```text
//! [ ClusterState ] -> build -> [ Snapshot ] -> write_certs, write_dh_param, write_config
//! ```
//!
//! Watching resources and reloading nginx are left to the caller.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod state;

pub use self::{
    args::Args,
    state::{read_manifest, AppResources, ClusterState, ManifestError, Snapshot},
};
pub use router_controller_core as core;
pub use router_controller_k8s_api as k8s;
pub use router_controller_k8s_model as model;
pub use router_controller_nginx as nginx;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Materializes configuration snapshots into an SSL directory and an nginx config file.
///
/// Passes against the same paths must not run concurrently.
#[derive(Clone, Debug)]
pub struct Reconciler {
    ssl_dir: PathBuf,
    config_path: PathBuf,
}

// === impl Reconciler ===

impl Reconciler {
    pub fn new(ssl_dir: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            ssl_dir: ssl_dir.into(),
            config_path: config_path.into(),
        }
    }

    pub fn ssl_dir(&self) -> &Path {
        &self.ssl_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Runs a full pass: builds a snapshot from `state` and applies it.
    ///
    /// A build failure leaves the filesystem untouched.
    pub fn reconcile(&self, state: &ClusterState) -> Result<()> {
        let snapshot = state.build()?;
        self.apply(&snapshot)
    }

    /// Applies a snapshot. Stops at the first failure; re-running the pass converges.
    #[instrument(skip_all, fields(ssl_dir = %self.ssl_dir.display()))]
    pub fn apply(&self, snapshot: &Snapshot) -> Result<()> {
        nginx::write_certs(&snapshot.router, &self.ssl_dir)?;
        nginx::write_dh_param(&snapshot.router, &self.ssl_dir)?;
        nginx::write_config(
            &snapshot.router,
            snapshot.builder.as_ref(),
            &self.ssl_dir,
            &self.config_path,
        )?;
        info!(
            apps = snapshot.router.app_configs.len(),
            config = %self.config_path.display(),
            "Reconciled"
        );
        Ok(())
    }
}
