use crate::{
    build_certificate, build_dh_param, overlay, overlay_str, LOG_LEVEL, NGINX_PREFIX,
    POSITIVE_INT, SIZE, SIZE_OR_ZERO, TIMEOUT, WORKER_PROCESSES,
};
use anyhow::{Context, Result};
use router_controller_core::{GzipConfig, HstsConfig, RouterConfig, SslConfig};
use router_controller_k8s_api::{Annotations, Deployment, ResourceExt, Secret};
use tracing::{debug, instrument};

/// Builds the router configuration from the router deployment's annotations.
///
/// The platform certificate and DH parameters are read from their secrets when the caller found
/// them; a missing or shape-invalid secret leaves the corresponding setting unconfigured.
/// Application configs are supplied separately with [`RouterConfig::set_app_configs`].
#[instrument(
    skip_all,
    fields(
        ns = ?deployment.metadata.namespace,
        name = %deployment.name_any(),
    )
)]
pub fn build_router_config(
    deployment: &Deployment,
    platform_cert: Option<&Secret>,
    dh_param: Option<&Secret>,
) -> Result<RouterConfig> {
    let ann = Annotations::new(deployment.annotations(), NGINX_PREFIX);
    let mut config = RouterConfig::default();
    overlay_router(&ann, &mut config)
        .with_context(|| format!("invalid router deployment {}", deployment.name_any()))?;

    if let Some(secret) = platform_cert {
        config.platform_certificate = build_certificate(secret, "platform")?;
    }
    if let Some(secret) = dh_param {
        config.ssl.dh_param = build_dh_param(secret)?;
    }

    debug!(
        platform_certificate = config.platform_certificate.is_some(),
        dh_param = config.ssl.dh_param.is_some(),
        client_certificates = config.client_certificates.len(),
        "Built router config"
    );
    Ok(config)
}

fn overlay_router(ann: &Annotations<'_>, config: &mut RouterConfig) -> Result<()> {
    overlay_str(
        &mut config.worker_processes,
        ann.constrained("workerProcesses", &WORKER_PROCESSES)?,
    );
    overlay_str(
        &mut config.max_worker_connections,
        ann.constrained("maxWorkerConnections", &POSITIVE_INT)?,
    );
    overlay_str(
        &mut config.traffic_status_zone_size,
        ann.constrained("trafficStatusZoneSize", &SIZE)?,
    );
    overlay_str(
        &mut config.default_timeout,
        ann.constrained("defaultTimeout", &TIMEOUT)?,
    );
    overlay_str(
        &mut config.server_name_hash_max_size,
        ann.constrained("serverNameHashMaxSize", &SIZE)?,
    );
    overlay_str(
        &mut config.server_name_hash_bucket_size,
        ann.constrained("serverNameHashBucketSize", &SIZE)?,
    );
    overlay_str(
        &mut config.body_size,
        ann.constrained("bodySize", &SIZE_OR_ZERO)?,
    );
    overlay(
        &mut config.proxy_real_ip_cidrs,
        ann.networks("proxyRealIpCidrs")?,
    );
    overlay_str(
        &mut config.error_log_level,
        ann.constrained("errorLogLevel", &LOG_LEVEL)?,
    );
    overlay_str(&mut config.platform_domain, ann.string("platformDomain"));
    overlay(&mut config.use_proxy_protocol, ann.bool("useProxyProtocol")?);
    overlay(&mut config.enforce_whitelists, ann.bool("enforceWhitelists")?);
    overlay(&mut config.default_whitelist, ann.list("defaultWhitelist"));
    overlay(&mut config.http2_enabled, ann.bool("http2Enabled")?);
    overlay_str(&mut config.log_format, ann.string("logFormat"));
    overlay(
        &mut config.disable_server_tokens,
        ann.bool("disableServerTokens")?,
    );
    overlay(
        &mut config.client_certificates,
        ann.base64_list("clientCertificates")?,
    );

    overlay_gzip(&ann.scoped("gzip."), &mut config.gzip)?;
    overlay_ssl(&ann.scoped("ssl."), &mut config.ssl)?;
    Ok(())
}

fn overlay_gzip(ann: &Annotations<'_>, gzip: &mut GzipConfig) -> Result<()> {
    overlay(&mut gzip.enabled, ann.bool("enabled")?);
    overlay(&mut gzip.comp_level, ann.int_within("compLevel", 1..=9)?);
    overlay_str(&mut gzip.disable, ann.string("disable"));
    overlay_str(&mut gzip.http_version, ann.string("httpVersion"));
    overlay(&mut gzip.min_length, ann.int_within("minLength", 0..=i64::MAX)?);
    overlay_str(&mut gzip.proxied, ann.string("proxied"));
    overlay_str(&mut gzip.types, ann.string("types"));
    overlay_str(&mut gzip.vary, ann.string("vary"));
    Ok(())
}

fn overlay_ssl(ann: &Annotations<'_>, ssl: &mut SslConfig) -> Result<()> {
    overlay(&mut ssl.enforce, ann.bool("enforce")?);
    overlay_str(&mut ssl.protocols, ann.string("protocols"));
    overlay_str(&mut ssl.ciphers, ann.string("ciphers"));
    overlay_str(&mut ssl.session_cache, ann.string("sessionCache"));
    overlay_str(
        &mut ssl.session_timeout,
        ann.constrained("sessionTimeout", &TIMEOUT)?,
    );
    overlay(&mut ssl.use_session_tickets, ann.bool("useSessionTickets")?);
    overlay_str(&mut ssl.buffer_size, ann.constrained("bufferSize", &SIZE)?);

    overlay_hsts(&ann.scoped("hsts."), &mut ssl.hsts)
}

fn overlay_hsts(ann: &Annotations<'_>, hsts: &mut HstsConfig) -> Result<()> {
    overlay(&mut hsts.enabled, ann.bool("enabled")?);
    overlay(&mut hsts.max_age, ann.int_within("maxAge", 0..=i64::MAX)?);
    overlay(
        &mut hsts.include_sub_domains,
        ann.bool("includeSubDomains")?,
    );
    overlay(&mut hsts.preload, ann.bool("preload")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{mk_deployment, mk_secret};
    use maplit::btreemap;
    use router_controller_core::Certificate;

    const ROUTER_NAME: &str = "deis-router";

    #[test]
    fn annotated_deployment() {
        let deployment = mk_deployment(
            ROUTER_NAME,
            btreemap! {
                "router.deis.io/nginx.defaultTimeout".to_string() => "1500s".to_string(),
                "router.deis.io/nginx.ssl.bufferSize".to_string() => "6k".to_string(),
                "router.deis.io/nginx.ssl.hsts.maxAge".to_string() => "1234".to_string(),
                "router.deis.io/nginx.ssl.hsts.includeSubDomains".to_string() => "true".to_string(),
                "router.deis.io/nginx.clientCertificates".to_string() => "YXNkZg==,cXdlcnR5".to_string(),
            },
        );
        let platform_cert = mk_secret(
            "deis-router-platform-cert",
            vec![("tls.crt", "foo"), ("tls.key", "bar")],
        );
        let dh_param = mk_secret("deis-router-dhparam", vec![("dhparam", "bizbaz")]);

        let mut expected = RouterConfig::default();
        // A value not set in the annotations keeps its default.
        expected.max_worker_connections = "768".to_string();
        expected.default_timeout = "1500s".to_string();
        expected.ssl.buffer_size = "6k".to_string();
        expected.ssl.dh_param = Some("bizbaz".to_string());
        expected.ssl.hsts.max_age = 1234;
        expected.ssl.hsts.include_sub_domains = true;
        expected.platform_certificate = Certificate::new("foo", "bar");
        expected.client_certificates = vec!["asdf".to_string(), "qwerty".to_string()];

        let actual =
            build_router_config(&deployment, Some(&platform_cert), Some(&dh_param)).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn unannotated_deployment_uses_defaults() {
        let deployment = mk_deployment(ROUTER_NAME, Default::default());
        let config = build_router_config(&deployment, None, None).unwrap();
        assert_eq!(config, RouterConfig::default());
        assert_eq!(config.max_worker_connections, "768");
        assert!(config.client_certificates.is_empty());
    }

    #[test]
    fn invalid_secrets_degrade_to_unconfigured() {
        let deployment = mk_deployment(ROUTER_NAME, Default::default());
        let platform_cert = mk_secret("deis-router-platform-cert", vec![("a", "foo")]);
        let dh_param = mk_secret("deis-router-dhparam", vec![("foo", "bar")]);
        let config =
            build_router_config(&deployment, Some(&platform_cert), Some(&dh_param)).unwrap();
        assert!(config.platform_certificate.is_none());
        assert!(config.ssl.dh_param.is_none());
    }

    #[test]
    fn nested_overlays() {
        let deployment = mk_deployment(
            ROUTER_NAME,
            btreemap! {
                "router.deis.io/nginx.gzip.enabled".to_string() => "false".to_string(),
                "router.deis.io/nginx.gzip.compLevel".to_string() => "9".to_string(),
                "router.deis.io/nginx.proxyRealIpCidrs".to_string() => "10.0.0.0/8, 192.168.0.0/16".to_string(),
                "router.deis.io/nginx.defaultWhitelist".to_string() => "1.2.3.4,5.6.7.0/24".to_string(),
                "router.deis.io/nginx.http2Enabled".to_string() => "0".to_string(),
                "router.deis.io/nginx.ssl.hsts.enabled".to_string() => "true".to_string(),
                "router.deis.io/nginx.errorLogLevel".to_string() => "warn".to_string(),
            },
        );
        let config = build_router_config(&deployment, None, None).unwrap();
        assert!(!config.gzip.enabled);
        assert_eq!(config.gzip.comp_level, 9);
        assert_eq!(
            config.proxy_real_ip_cidrs,
            vec![
                "10.0.0.0/8".parse().unwrap(),
                "192.168.0.0/16".parse().unwrap()
            ]
        );
        assert_eq!(config.default_whitelist, ["1.2.3.4", "5.6.7.0/24"]);
        assert!(!config.http2_enabled);
        assert!(config.ssl.hsts.enabled);
        assert_eq!(config.error_log_level, "warn");
    }

    #[test]
    fn malformed_annotations_fail() {
        for (key, value) in [
            ("router.deis.io/nginx.ssl.hsts.maxAge", "forever"),
            ("router.deis.io/nginx.ssl.hsts.maxAge", "-1"),
            ("router.deis.io/nginx.ssl.hsts.includeSubDomains", "sure"),
            ("router.deis.io/nginx.clientCertificates", "YXNkZg==,not base64!"),
            ("router.deis.io/nginx.defaultTimeout", "soon"),
            ("router.deis.io/nginx.maxWorkerConnections", "0"),
            ("router.deis.io/nginx.gzip.compLevel", "10"),
            ("router.deis.io/nginx.proxyRealIpCidrs", "10.0.0.1"),
            ("router.deis.io/nginx.errorLogLevel", "verbose"),
        ] {
            let deployment = mk_deployment(
                ROUTER_NAME,
                btreemap! { key.to_string() => value.to_string() },
            );
            let error = build_router_config(&deployment, None, None)
                .expect_err("malformed annotation must fail the build");
            assert!(
                format!("{:#}", error).contains(key),
                "{}={} -> {:#}",
                key,
                value,
                error
            );
        }
    }
}
