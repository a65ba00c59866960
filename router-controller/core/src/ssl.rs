use serde::Serialize;

/// TLS settings shared by every server block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslConfig {
    /// Redirects plain HTTP requests to HTTPS for every domain that has a certificate.
    pub enforce: bool,
    pub protocols: String,
    pub ciphers: String,
    pub session_cache: String,
    pub session_timeout: String,
    pub use_session_tickets: bool,
    pub buffer_size: String,

    /// PEM-encoded Diffie-Hellman parameters, or `None` when no parameter is configured.
    pub dh_param: Option<String>,

    pub hsts: HstsConfig,
}

/// `Strict-Transport-Security` header settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HstsConfig {
    pub enabled: bool,

    /// The header's `max-age`, in seconds.
    pub max_age: i64,
    pub include_sub_domains: bool,
    pub preload: bool,
}

/// A certificate and its private key, both PEM text.
///
/// A `Certificate` is only ever built when both halves are present and non-empty. Key material is
/// never exposed to the template layer; templates only observe that a certificate exists.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    #[serde(skip_serializing)]
    pub cert: String,

    #[serde(skip_serializing)]
    pub key: String,
}

// === impl SslConfig ===

impl SslConfig {
    pub const DEFAULT_PROTOCOLS: &'static str = "TLSv1.2 TLSv1.3";
    pub const DEFAULT_CIPHERS: &'static str = "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:DHE-RSA-AES128-GCM-SHA256:DHE-RSA-AES256-GCM-SHA384";
    pub const DEFAULT_SESSION_TIMEOUT: &'static str = "10m";
    pub const DEFAULT_BUFFER_SIZE: &'static str = "4k";
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            protocols: Self::DEFAULT_PROTOCOLS.to_string(),
            ciphers: Self::DEFAULT_CIPHERS.to_string(),
            session_cache: String::new(),
            session_timeout: Self::DEFAULT_SESSION_TIMEOUT.to_string(),
            use_session_tickets: true,
            buffer_size: Self::DEFAULT_BUFFER_SIZE.to_string(),
            dh_param: None,
            hsts: HstsConfig::default(),
        }
    }
}

// === impl Certificate ===

impl Certificate {
    /// Returns a certificate only if both the certificate and key are non-empty.
    pub fn new(cert: impl Into<String>, key: impl Into<String>) -> Option<Self> {
        let cert = cert.into();
        let key = key.into();
        if cert.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self { cert, key })
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("cert", &self.cert)
            .field("key", &"<redacted>")
            .finish()
    }
}
