use crate::{
    core::{BuilderConfig, RouterConfig},
    k8s::{Deployment, ResourceExt, Secret, Service},
    model,
};
use anyhow::Result;
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, instrument};

/// The cluster resources a reconciliation pass consumes, as fetched by the caller.
#[derive(Clone, Debug)]
pub struct ClusterState {
    pub router: Deployment,
    pub builder: Option<Service>,
    pub platform_cert: Option<Secret>,
    pub dh_param: Option<Secret>,
    pub apps: Vec<AppResources>,
}

/// An application's service and its certificate secrets.
#[derive(Clone, Debug)]
pub struct AppResources {
    pub service: Service,

    /// Certificate secrets in the application's namespace, by name.
    pub secrets: BTreeMap<String, Secret>,
}

/// A fully built configuration snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub router: RouterConfig,
    pub builder: Option<BuilderConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// === impl ClusterState ===

impl ClusterState {
    /// Builds a configuration snapshot. Fails if any present annotation is malformed.
    #[instrument(skip_all, fields(apps = self.apps.len()))]
    pub fn build(&self) -> Result<Snapshot> {
        let mut router = model::build_router_config(
            &self.router,
            self.platform_cert.as_ref(),
            self.dh_param.as_ref(),
        )?;

        let apps = self
            .apps
            .iter()
            .map(|app| model::build_app_config(&app.service, &app.secrets))
            .collect::<Result<Vec<_>>>()?;
        router.set_app_configs(apps);

        let builder = self
            .builder
            .as_ref()
            .map(model::build_builder_config)
            .transpose()?;

        debug!(builder = builder.is_some(), "Built snapshot");
        Ok(Snapshot { router, builder })
    }
}

// === impl AppResources ===

impl AppResources {
    /// Pairs each application service with the secrets in its namespace.
    pub fn group(services: Vec<Service>, secrets: Vec<Secret>) -> Vec<Self> {
        let mut by_ns = BTreeMap::<String, BTreeMap<String, Secret>>::new();
        for secret in secrets {
            by_ns
                .entry(secret.namespace().unwrap_or_default())
                .or_default()
                .insert(secret.name_any(), secret);
        }

        services
            .into_iter()
            .map(|service| {
                let secrets = by_ns
                    .get(&service.namespace().unwrap_or_default())
                    .cloned()
                    .unwrap_or_default();
                Self { service, secrets }
            })
            .collect()
    }
}

/// Reads a single Kubernetes resource from a YAML (or JSON) manifest.
pub fn read_manifest<T>(path: &Path) -> Result<T, ManifestError>
where
    T: serde::de::DeserializeOwned,
{
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::ObjectMeta;

    fn meta(ns: &str, name: &str) -> ObjectMeta {
        ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn groups_secrets_by_namespace() {
        let services = vec![
            Service {
                metadata: meta("a", "a"),
                ..Default::default()
            },
            Service {
                metadata: meta("b", "b"),
                ..Default::default()
            },
        ];
        let secrets = vec![
            Secret {
                metadata: meta("a", "a-cert"),
                ..Default::default()
            },
            Secret {
                metadata: meta("c", "c-cert"),
                ..Default::default()
            },
        ];

        let apps = AppResources::group(services, secrets);
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].secrets.keys().collect::<Vec<_>>(), ["a-cert"]);
        assert!(apps[1].secrets.is_empty());
    }

    #[test]
    fn reads_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.yaml");
        std::fs::write(
            &path,
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: deis-router-dhparam\n  namespace: deis\ndata:\n  dhparam: Yml6YmF6\n",
        )
        .unwrap();
        let secret: Secret = read_manifest(&path).unwrap();
        assert_eq!(secret.name_any(), "deis-router-dhparam");
        assert_eq!(
            model::build_dh_param(&secret).unwrap().as_deref(),
            Some("bizbaz")
        );

        assert!(matches!(
            read_manifest::<Secret>(&dir.path().join("missing.yaml")),
            Err(ManifestError::Read { .. })
        ));

        std::fs::write(&path, "data: [").unwrap();
        assert!(matches!(
            read_manifest::<Secret>(&path),
            Err(ManifestError::Parse { .. })
        ));
    }
}
