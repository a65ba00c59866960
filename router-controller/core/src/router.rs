use crate::{AppConfig, Certificate, SslConfig};
use ipnet::IpNet;
use serde::Serialize;

/// The root configuration snapshot rendered into the proxy's configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    pub worker_processes: String,
    pub max_worker_connections: String,
    pub traffic_status_zone_size: String,
    pub default_timeout: String,
    pub server_name_hash_max_size: String,
    pub server_name_hash_bucket_size: String,
    pub body_size: String,

    /// Networks whose `X-Forwarded-For` headers are trusted for the client address.
    pub proxy_real_ip_cidrs: Vec<IpNet>,
    pub error_log_level: String,
    pub platform_domain: String,
    pub use_proxy_protocol: bool,
    pub enforce_whitelists: bool,
    pub default_whitelist: Vec<String>,
    pub http2_enabled: bool,
    pub log_format: String,
    pub disable_server_tokens: bool,

    pub gzip: GzipConfig,
    pub ssl: SslConfig,

    /// The certificate for the platform domain, if one is configured.
    pub platform_certificate: Option<Certificate>,

    /// PEM-encoded CA certificates trusted for client authentication, in annotation order.
    pub client_certificates: Vec<String>,

    /// Per-application configurations, ordered by application name.
    pub app_configs: Vec<AppConfig>,
}

/// Response compression settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GzipConfig {
    pub enabled: bool,
    pub comp_level: i64,
    pub disable: String,
    pub http_version: String,
    pub min_length: i64,
    pub proxied: String,
    pub types: String,
    pub vary: String,
}

// === impl RouterConfig ===

impl RouterConfig {
    pub const DEFAULT_WORKER_PROCESSES: &'static str = "auto";
    pub const DEFAULT_MAX_WORKER_CONNECTIONS: &'static str = "768";
    pub const DEFAULT_TRAFFIC_STATUS_ZONE_SIZE: &'static str = "1m";
    pub const DEFAULT_TIMEOUT: &'static str = "1300s";
    pub const DEFAULT_SERVER_NAME_HASH_MAX_SIZE: &'static str = "512";
    pub const DEFAULT_SERVER_NAME_HASH_BUCKET_SIZE: &'static str = "64";
    pub const DEFAULT_BODY_SIZE: &'static str = "1m";
    pub const DEFAULT_PROXY_REAL_IP_CIDR: &'static str = "10.0.0.0/8";
    pub const DEFAULT_ERROR_LOG_LEVEL: &'static str = "error";
    pub const DEFAULT_LOG_FORMAT: &'static str = r#"[$time_iso8601] - $app_name - $remote_addr - $remote_user - $status - "$request" - $bytes_sent - "$http_referer" - "$http_user_agent" - "$server_name" - $upstream_addr - $http_host - $upstream_response_time - $request_time"#;

    /// Replaces the application configs, sorting them by name so that rendering is reproducible
    /// regardless of the order in which the caller discovered them.
    pub fn set_app_configs(&mut self, mut apps: Vec<AppConfig>) {
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        self.app_configs = apps;
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        let proxy_real_ip_cidrs = Self::DEFAULT_PROXY_REAL_IP_CIDR
            .parse::<IpNet>()
            .map(|net| vec![net])
            .unwrap_or_default();

        Self {
            worker_processes: Self::DEFAULT_WORKER_PROCESSES.to_string(),
            max_worker_connections: Self::DEFAULT_MAX_WORKER_CONNECTIONS.to_string(),
            traffic_status_zone_size: Self::DEFAULT_TRAFFIC_STATUS_ZONE_SIZE.to_string(),
            default_timeout: Self::DEFAULT_TIMEOUT.to_string(),
            server_name_hash_max_size: Self::DEFAULT_SERVER_NAME_HASH_MAX_SIZE.to_string(),
            server_name_hash_bucket_size: Self::DEFAULT_SERVER_NAME_HASH_BUCKET_SIZE.to_string(),
            body_size: Self::DEFAULT_BODY_SIZE.to_string(),
            proxy_real_ip_cidrs,
            error_log_level: Self::DEFAULT_ERROR_LOG_LEVEL.to_string(),
            platform_domain: String::new(),
            use_proxy_protocol: false,
            enforce_whitelists: false,
            default_whitelist: Vec::new(),
            http2_enabled: true,
            log_format: Self::DEFAULT_LOG_FORMAT.to_string(),
            disable_server_tokens: false,
            gzip: GzipConfig::default(),
            ssl: SslConfig::default(),
            platform_certificate: None,
            client_certificates: Vec::new(),
            app_configs: Vec::new(),
        }
    }
}

// === impl GzipConfig ===

impl GzipConfig {
    pub const DEFAULT_COMP_LEVEL: i64 = 5;
    pub const DEFAULT_MIN_LENGTH: i64 = 256;
    pub const DEFAULT_TYPES: &'static str = "application/atom+xml application/javascript application/json application/rss+xml application/vnd.ms-fontobject application/x-font-ttf application/x-web-app-manifest+json application/xhtml+xml application/xml font/opentype image/svg+xml image/x-icon text/css text/plain text/x-component";
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            comp_level: Self::DEFAULT_COMP_LEVEL,
            disable: "msie6".to_string(),
            http_version: "1.1".to_string(),
            min_length: Self::DEFAULT_MIN_LENGTH,
            proxied: "any".to_string(),
            types: Self::DEFAULT_TYPES.to_string(),
            vary: "on".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.max_worker_connections, "768");
        assert_eq!(
            config.proxy_real_ip_cidrs,
            vec!["10.0.0.0/8".parse::<IpNet>().unwrap()]
        );
        assert!(config.platform_certificate.is_none());
        assert!(config.client_certificates.is_empty());
        assert_eq!(config.ssl.dh_param, None);
        assert_eq!(config.ssl.hsts.max_age, 0);
        assert!(!config.ssl.hsts.include_sub_domains);
        assert!(config.gzip.enabled);
    }

    #[test]
    fn app_configs_are_sorted_by_name() {
        let mut config = RouterConfig::default();
        config.set_app_configs(vec![
            AppConfig::new("zulu"),
            AppConfig::new("alpha"),
            AppConfig::new("mike"),
        ]);
        let names = config
            .app_configs
            .iter()
            .map(|app| app.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["alpha", "mike", "zulu"]);
    }
}
