use anyhow::Result;
use router_controller_core::Certificate;
use router_controller_k8s_api::{self as k8s, ResourceExt, Secret};
use tracing::{debug, instrument};

const CERT_KEY: &str = "tls.crt";
const PRIVATE_KEY_KEY: &str = "tls.key";
const DH_PARAM_KEY: &str = "dhparam";

/// Reads a certificate/key pair from a secret.
///
/// A secret that doesn't carry both `tls.crt` and `tls.key`, that carries empty or non-UTF-8
/// values, or whose type can't hold a certificate yields `None`: a missing certificate is an
/// expected state, not an error.
#[instrument(skip(secret), fields(secret = %secret.name_any()))]
pub fn build_certificate(secret: &Secret, name: &str) -> Result<Option<Certificate>> {
    if !holds_certificate(secret) {
        debug!(r#type = ?secret.type_, "Secret type cannot hold a certificate");
        return Ok(None);
    }

    let (Some(cert), Some(key)) = (
        pem_text(secret, CERT_KEY),
        pem_text(secret, PRIVATE_KEY_KEY),
    ) else {
        debug!("Secret does not hold a certificate and key");
        return Ok(None);
    };

    Ok(Certificate::new(cert, key))
}

/// Reads Diffie-Hellman parameters from a secret's `dhparam` key.
///
/// Returns `None` when the key is absent or empty.
#[instrument(skip(secret), fields(secret = %secret.name_any()))]
pub fn build_dh_param(secret: &Secret) -> Result<Option<String>> {
    let dh_param = pem_text(secret, DH_PARAM_KEY).filter(|dh| !dh.is_empty());
    if dh_param.is_none() {
        debug!("Secret does not hold DH parameters");
    }
    Ok(dh_param)
}

fn holds_certificate(secret: &Secret) -> bool {
    match secret.type_.as_deref() {
        None | Some("") => true,
        Some(t) => t == k8s::SECRET_TYPE_OPAQUE || t == k8s::SECRET_TYPE_TLS,
    }
}

fn pem_text(secret: &Secret, key: &str) -> Option<String> {
    let bytes = k8s::secret_data(secret, key)?;
    String::from_utf8(bytes.to_vec()).ok()
}
