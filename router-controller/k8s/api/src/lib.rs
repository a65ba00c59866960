#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;

pub use self::annotations::{AnnotationError, Annotations};
pub use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{Secret, Service, ServiceSpec},
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
    ByteString,
};
pub use kube::ResourceExt;

/// The secret type assigned when a secret is created without an explicit type.
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// The secret type for TLS certificate/key pairs.
pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";

/// Returns the raw bytes stored under `key` in a secret's data, if any.
pub fn secret_data<'s>(secret: &'s Secret, key: &str) -> Option<&'s [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|ByteString(bytes)| bytes.as_slice())
}
