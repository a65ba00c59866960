//! Materializes a router configuration onto the filesystem.
//!
//! - [`write_certs`] reconciles the SSL directory so that it holds exactly the configured
//!   certificates and keys.
//! - [`write_dh_param`] writes (or removes) `dhparam.pem`.
//! - [`write_config`] renders `nginx.conf`.
//!
//! Each operation converges the filesystem to the desired state regardless of what was there
//! before, so a pass that fails midway is repaired by re-running it. Callers must not run passes
//! against the same directory concurrently.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod certs;
mod config;
mod dh_param;
mod fs;

pub use self::{
    certs::{write_cert, write_certs},
    config::{render_config, write_config},
    dh_param::write_dh_param,
};

/// Mode for certificates and other public material.
pub const PUBLIC_MODE: u32 = 0o644;

/// Mode for private keys.
pub const PRIVATE_MODE: u32 = 0o600;
