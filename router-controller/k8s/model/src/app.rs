use crate::{build_certificate, overlay, overlay_str, APP_PREFIX, TIMEOUT};
use anyhow::{Context, Result};
use router_controller_core::AppConfig;
use router_controller_k8s_api::{Annotations, ResourceExt, Secret, Service};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Builds an application's routing configuration from its service.
///
/// `secrets` holds the application's certificate secrets, by name. The `certificates` annotation
/// maps each domain to a certificate name whose secret is `<name>-cert`; a domain whose secret is
/// missing or doesn't hold a certificate is left without one.
#[instrument(
    skip_all,
    fields(
        ns = ?service.metadata.namespace,
        name = %service.name_any(),
    )
)]
pub fn build_app_config(
    service: &Service,
    secrets: &BTreeMap<String, Secret>,
) -> Result<AppConfig> {
    let ann = Annotations::new(service.annotations(), APP_PREFIX);
    let mut config = AppConfig::new(service.name_any());
    let cert_names = overlay_app(&ann, &mut config)
        .with_context(|| format!("invalid application service {}", service.name_any()))?;

    for (domain, cert_name) in cert_names {
        let secret_name = format!("{}-cert", cert_name);
        let Some(secret) = secrets.get(&secret_name) else {
            debug!(%domain, secret = %secret_name, "Certificate secret not found");
            continue;
        };
        if let Some(cert) = build_certificate(secret, &domain)? {
            config.certificates.insert(domain, cert);
        }
    }

    config.service_ip = service
        .spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.clone())
        .unwrap_or_default();
    config.available = !config.service_ip.is_empty() && config.service_ip != "None";

    debug!(
        domains = ?config.domains,
        certificates = config.certificates.len(),
        available = config.available,
        "Built application config"
    );
    Ok(config)
}

/// Overlays the application's annotations, returning the requested `(domain, certificate name)`
/// pairs.
fn overlay_app(ann: &Annotations<'_>, config: &mut AppConfig) -> Result<Vec<(String, String)>> {
    overlay(&mut config.domains, ann.list("domains"));
    overlay(&mut config.whitelist, ann.list("whitelist"));
    overlay_str(
        &mut config.connect_timeout,
        ann.constrained("connectTimeout", &TIMEOUT)?,
    );
    overlay_str(
        &mut config.tcp_timeout,
        ann.constrained("tcpTimeout", &TIMEOUT)?,
    );
    overlay(&mut config.maintenance, ann.bool("maintenance")?);
    overlay(&mut config.ssl_enforce, ann.bool("ssl.enforce")?);
    Ok(ann.pairs("certificates")?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{mk_secret, mk_service};
    use maplit::btreemap;
    use router_controller_core::Certificate;

    #[test]
    fn annotated_app() {
        let service = mk_service(
            "example",
            btreemap! {
                "router.deis.io/domains".to_string() => "example.com, www.example.com".to_string(),
                "router.deis.io/whitelist".to_string() => "10.0.0.0/8".to_string(),
                "router.deis.io/connectTimeout".to_string() => "5s".to_string(),
                "router.deis.io/maintenance".to_string() => "true".to_string(),
                "router.deis.io/ssl.enforce".to_string() => "true".to_string(),
                "router.deis.io/certificates".to_string() =>
                    "example.com:example,www.example.com:missing".to_string(),
            },
            Some("10.1.2.3"),
        );
        let secrets = btreemap! {
            "example-cert".to_string() => mk_secret(
                "example-cert",
                vec![("tls.crt", "examplecom-crt"), ("tls.key", "examplecom-key")],
            ),
        };

        let config = build_app_config(&service, &secrets).unwrap();
        assert_eq!(config.name, "example");
        assert_eq!(config.domains, ["example.com", "www.example.com"]);
        assert_eq!(config.whitelist, ["10.0.0.0/8"]);
        assert_eq!(config.connect_timeout, "5s");
        assert_eq!(config.tcp_timeout, AppConfig::DEFAULT_TCP_TIMEOUT);
        assert!(config.maintenance);
        assert!(config.ssl_enforce);
        assert_eq!(config.service_ip, "10.1.2.3");
        assert!(config.available);
        assert_eq!(
            config.certificates,
            btreemap! {
                "example.com".to_string() =>
                    Certificate::new("examplecom-crt", "examplecom-key").unwrap(),
            }
        );
    }

    #[test]
    fn unannotated_app() {
        let service = mk_service("plain", Default::default(), Some("None"));
        let config = build_app_config(&service, &Default::default()).unwrap();
        let mut expected = AppConfig::new("plain");
        expected.service_ip = "None".to_string();
        assert_eq!(config, expected);
        assert!(!config.available);
    }

    #[test]
    fn malformed_certificate_mapping() {
        let service = mk_service(
            "broken",
            btreemap! {
                "router.deis.io/certificates".to_string() => "example.com".to_string(),
            },
            Some("10.1.2.3"),
        );
        assert!(build_app_config(&service, &Default::default()).is_err());
    }
}
