use crate::{overlay_str, NGINX_PREFIX, TIMEOUT};
use anyhow::{Context, Result};
use router_controller_core::BuilderConfig;
use router_controller_k8s_api::{Annotations, ResourceExt, Service};
use tracing::{debug, instrument};

/// Builds the builder's TCP passthrough configuration from the builder service.
///
/// The service IP is the service's cluster IP, verbatim; an unassigned address yields an empty
/// string.
#[instrument(
    skip_all,
    fields(
        ns = ?service.metadata.namespace,
        name = %service.name_any(),
    )
)]
pub fn build_builder_config(service: &Service) -> Result<BuilderConfig> {
    let ann = Annotations::new(service.annotations(), NGINX_PREFIX);
    let mut config = BuilderConfig::default();
    overlay_builder(&ann, &mut config)
        .with_context(|| format!("invalid builder service {}", service.name_any()))?;

    config.service_ip = service
        .spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.clone())
        .unwrap_or_default();

    debug!(service_ip = %config.service_ip, "Built builder config");
    Ok(config)
}

fn overlay_builder(ann: &Annotations<'_>, config: &mut BuilderConfig) -> Result<()> {
    overlay_str(
        &mut config.connect_timeout,
        ann.constrained("connectTimeout", &TIMEOUT)?,
    );
    overlay_str(
        &mut config.tcp_timeout,
        ann.constrained("tcpTimeout", &TIMEOUT)?,
    );
    Ok(())
}
