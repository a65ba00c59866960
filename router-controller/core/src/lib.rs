#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Typed router configuration.
//!
//! Every value in this crate is a snapshot: it is rebuilt in full on each reconciliation pass and
//! handed to the materializer, never mutated incrementally. `Default` impls carry the compiled-in
//! defaults that annotations are overlaid onto.

pub mod app;
pub mod router;
pub mod ssl;

pub use self::{
    app::{AppConfig, BuilderConfig},
    router::{GzipConfig, RouterConfig},
    ssl::{Certificate, HstsConfig, SslConfig},
};
pub use ipnet::IpNet;
