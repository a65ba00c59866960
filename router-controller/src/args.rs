use crate::{read_manifest, AppResources, ClusterState, Reconciler};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Materializes nginx configuration from router resource manifests.
///
/// Each manifest holds a single resource, as fetched from the cluster.
#[derive(Debug, Parser)]
#[clap(name = "router-controller", version, about)]
pub struct Args {
    #[clap(
        long,
        default_value = "router_controller=info,warn",
        env = "ROUTER_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    /// The router Deployment manifest.
    #[clap(long)]
    deployment: PathBuf,

    /// The builder Service manifest.
    #[clap(long)]
    builder_service: Option<PathBuf>,

    /// The platform certificate Secret manifest.
    #[clap(long)]
    platform_cert_secret: Option<PathBuf>,

    /// The DH parameter Secret manifest.
    #[clap(long)]
    dhparam_secret: Option<PathBuf>,

    /// An application Service manifest. May be repeated.
    #[clap(long = "app-service")]
    app_services: Vec<PathBuf>,

    /// An application certificate Secret manifest. May be repeated.
    #[clap(long = "app-cert-secret")]
    app_cert_secrets: Vec<PathBuf>,

    #[clap(long, default_value = "/opt/router/ssl", env = "ROUTER_SSL_DIR")]
    ssl_dir: PathBuf,

    #[clap(
        long,
        default_value = "/opt/router/conf/nginx.conf",
        env = "ROUTER_CONFIG_PATH"
    )]
    config_path: PathBuf,
}

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            deployment,
            builder_service,
            platform_cert_secret,
            dhparam_secret,
            app_services,
            app_cert_secrets,
            ssl_dir,
            config_path,
        } = self;

        log_format
            .try_init(log_level)
            .expect("must configure logging");

        let state = ClusterState {
            router: read_manifest(&deployment)?,
            builder: builder_service.as_deref().map(read_manifest).transpose()?,
            platform_cert: platform_cert_secret
                .as_deref()
                .map(read_manifest)
                .transpose()?,
            dh_param: dhparam_secret.as_deref().map(read_manifest).transpose()?,
            apps: AppResources::group(
                app_services
                    .iter()
                    .map(|p| read_manifest(p))
                    .collect::<Result<_, _>>()?,
                app_cert_secrets
                    .iter()
                    .map(|p| read_manifest(p))
                    .collect::<Result<_, _>>()?,
            ),
        };
        info!(apps = state.apps.len(), "Loaded cluster state");

        Reconciler::new(ssl_dir, config_path).reconcile(&state)
    }
}
