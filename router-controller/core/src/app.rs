use crate::Certificate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Routing configuration for a single application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub name: String,
    pub domains: Vec<String>,
    pub whitelist: Vec<String>,
    pub connect_timeout: String,
    pub tcp_timeout: String,
    pub service_ip: String,
    pub maintenance: bool,
    pub ssl_enforce: bool,

    /// Indicates that the application has an address to route to.
    pub available: bool,

    /// Certificates by domain name.
    pub certificates: BTreeMap<String, Certificate>,
}

/// Settings for the builder's TCP passthrough.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfig {
    pub connect_timeout: String,
    pub tcp_timeout: String,

    /// The builder service's cluster IP. Empty when no address is assigned.
    pub service_ip: String,
}

// === impl AppConfig ===

impl AppConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: &'static str = "30s";
    pub const DEFAULT_TCP_TIMEOUT: &'static str = "1200s";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domains: Vec::new(),
            whitelist: Vec::new(),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT.to_string(),
            tcp_timeout: Self::DEFAULT_TCP_TIMEOUT.to_string(),
            service_ip: String::new(),
            maintenance: false,
            ssl_enforce: false,
            available: false,
            certificates: BTreeMap::new(),
        }
    }
}

// === impl BuilderConfig ===

impl BuilderConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: &'static str = "10s";
    pub const DEFAULT_TCP_TIMEOUT: &'static str = "1200s";
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT.to_string(),
            tcp_timeout: Self::DEFAULT_TCP_TIMEOUT.to_string(),
            service_ip: String::new(),
        }
    }
}
