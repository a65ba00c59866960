use crate::{fs::write_atomic, PUBLIC_MODE};
use anyhow::{Context, Result};
use minijinja::{context, Environment};
use router_controller_core::{BuilderConfig, RouterConfig};
use std::path::Path;
use tracing::{info, instrument};

const TEMPLATE_NAME: &str = "nginx.conf";
const TEMPLATE: &str = include_str!("../templates/nginx.conf.j2");

/// Renders the nginx configuration for `config`.
///
/// `ssl_dir` is the directory [`write_certs`](crate::write_certs) and
/// [`write_dh_param`](crate::write_dh_param) materialize into. A builder configuration, when
/// given, adds a TCP stream block that forwards to the builder.
pub fn render_config(
    config: &RouterConfig,
    builder: Option<&BuilderConfig>,
    ssl_dir: &Path,
) -> Result<String> {
    render_template(TEMPLATE, config, builder, ssl_dir)
}

fn render_template(
    source: &str,
    config: &RouterConfig,
    builder: Option<&BuilderConfig>,
    ssl_dir: &Path,
) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(TEMPLATE_NAME, source)
        .context("parsing nginx.conf template")?;

    env.get_template(TEMPLATE_NAME)
        .and_then(|tmpl| {
            tmpl.render(context! {
                config => config,
                builder => builder,
                ssl_dir => ssl_dir.display().to_string(),
            })
        })
        .context("rendering nginx.conf")
}

/// Renders the nginx configuration and replaces `path` with it.
///
/// Nothing is written if rendering fails.
#[instrument(skip(config, builder))]
pub fn write_config(
    config: &RouterConfig,
    builder: Option<&BuilderConfig>,
    ssl_dir: &Path,
    path: &Path,
) -> Result<()> {
    write_template(TEMPLATE, config, builder, ssl_dir, path)
}

fn write_template(
    source: &str,
    config: &RouterConfig,
    builder: Option<&BuilderConfig>,
    ssl_dir: &Path,
    path: &Path,
) -> Result<()> {
    let rendered = render_template(source, config, builder, ssl_dir)?;
    write_atomic(path, rendered.as_bytes(), PUBLIC_MODE)?;
    info!(bytes = rendered.len(), "Wrote nginx config");
    Ok(())
}
