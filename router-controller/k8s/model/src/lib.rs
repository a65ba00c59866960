//! Builds typed router configuration from cluster resources.
//!
//! The builders here are pure functions over already-fetched resources:
//!
//! - The router `Deployment`'s annotations (under `router.deis.io/nginx.`) are overlaid onto the
//!   compiled-in `RouterConfig` defaults.
//! - The builder `Service`'s annotations are overlaid onto the `BuilderConfig` defaults.
//! - Each application `Service` yields an `AppConfig`, with certificates read from the
//!   application's certificate secrets.
//! - Certificate and DH parameter secrets that don't carry the expected data keys are treated as
//!   absent rather than as errors.
//!
//! A present annotation that fails to parse fails the whole build; no partial configuration is
//! returned.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod app;
mod builder;
mod router;
mod secret;

pub use self::{
    app::build_app_config,
    builder::build_builder_config,
    router::build_router_config,
    secret::{build_certificate, build_dh_param},
};
use once_cell::sync::Lazy;
use regex::Regex;

/// The annotation prefix for router and builder settings.
pub const NGINX_PREFIX: &str = "router.deis.io/nginx.";

/// The annotation prefix for per-application settings.
pub const APP_PREFIX: &str = "router.deis.io/";

static TIMEOUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9]\d*(ms|[smhdwMy])?$").expect("timeout pattern must compile"));

static SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9]\d*[kKmM]?$").expect("size pattern must compile"));

static SIZE_OR_ZERO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|[1-9]\d*[kKmM]?)$").expect("size pattern must compile"));

static POSITIVE_INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9]\d*$").expect("integer pattern must compile"));

static WORKER_PROCESSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(auto|[1-9]\d*)$").expect("worker processes pattern must compile")
});

static LOG_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(debug|info|notice|warn|error|crit|alert|emerg)$")
        .expect("log level pattern must compile")
});

/// Replaces `field` with `value` when an annotation supplied one.
fn overlay<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Like [`overlay`], for borrowed annotation text.
fn overlay_str(field: &mut String, value: Option<&str>) {
    if let Some(value) = value {
        *field = value.to_string();
    }
}
