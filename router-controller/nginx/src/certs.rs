use crate::{
    fs::{remove_if_exists, write_atomic, TEMP_PREFIX},
    PRIVATE_MODE, PUBLIC_MODE,
};
use anyhow::{bail, Context, Result};
use router_controller_core::{Certificate, RouterConfig};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    ffi::OsStr,
    path::Path,
};
use tracing::{debug, info, instrument, trace};

const PLATFORM: &str = "platform";
const CLIENT_CA_FILE: &str = "client.ca.crt";

/// A file that should exist in the SSL directory.
#[derive(Debug, PartialEq, Eq)]
struct Desired<'c> {
    contents: &'c str,
    mode: u32,
}

/// Reconciles `ssl_dir` so that it holds exactly the certificates and keys in `config`.
///
/// - `platform.crt`/`platform.key` for the platform certificate, if any;
/// - `<domain>.crt`/`<domain>.key` for every application certificate;
/// - `client.ca.crt` bundling all client certificates, if any.
///
/// Any other `*.crt` or `*.key` file is removed, as are temporary files left by an interrupted
/// write. Every desired file is rewritten on each pass, so
/// both contents and modes are repaired even if they were changed out from under us.
#[instrument(skip(config))]
pub fn write_certs(config: &RouterConfig, ssl_dir: &Path) -> Result<()> {
    let client_bundle = config.client_certificates.join("\n");
    let desired = desired_files(config, &client_bundle)?;

    remove_stale(ssl_dir, &desired)?;

    for (name, file) in &desired {
        write_atomic(&ssl_dir.join(name), file.contents.as_bytes(), file.mode)?;
        trace!(%name, "Wrote");
    }

    info!(files = desired.len(), "Certificates reconciled");
    Ok(())
}

/// Writes `<name>.crt` and `<name>.key` for a single certificate.
pub fn write_cert(name: &str, cert: &Certificate, ssl_dir: &Path) -> Result<()> {
    check_name(name)?;
    write_atomic(
        &ssl_dir.join(format!("{}.crt", name)),
        cert.cert.as_bytes(),
        PUBLIC_MODE,
    )?;
    write_atomic(
        &ssl_dir.join(format!("{}.key", name)),
        cert.key.as_bytes(),
        PRIVATE_MODE,
    )
}

fn desired_files<'c>(
    config: &'c RouterConfig,
    client_bundle: &'c str,
) -> Result<BTreeMap<String, Desired<'c>>> {
    let mut files = BTreeMap::new();

    let mut certs: Vec<(&str, &Certificate)> = Vec::new();
    if let Some(cert) = config.platform_certificate.as_ref() {
        certs.push((PLATFORM, cert));
    }
    for app in &config.app_configs {
        certs.extend(
            app.certificates
                .iter()
                .map(|(domain, cert)| (domain.as_str(), cert)),
        );
    }

    for (name, cert) in certs {
        check_name(name)?;
        insert(&mut files, format!("{}.crt", name), &cert.cert, PUBLIC_MODE)?;
        insert(&mut files, format!("{}.key", name), &cert.key, PRIVATE_MODE)?;
    }

    if !config.client_certificates.is_empty() {
        insert(
            &mut files,
            CLIENT_CA_FILE.to_string(),
            client_bundle,
            PUBLIC_MODE,
        )?;
    }

    Ok(files)
}

fn insert<'c>(
    files: &mut BTreeMap<String, Desired<'c>>,
    name: String,
    contents: &'c str,
    mode: u32,
) -> Result<()> {
    match files.entry(name) {
        Entry::Vacant(entry) => {
            entry.insert(Desired { contents, mode });
            Ok(())
        }
        Entry::Occupied(entry) if *entry.get() == (Desired { contents, mode }) => Ok(()),
        Entry::Occupied(entry) => bail!("conflicting certificates configured for {}", entry.key()),
    }
}

/// Ensures that `name` maps to a single file within the SSL directory.
fn check_name(name: &str) -> Result<()> {
    let is_separator = |c: char| c == '/' || c == '\0';
    if name.is_empty() || name == "." || name == ".." || name.contains(is_separator) {
        bail!("invalid certificate name: {:?}", name);
    }
    Ok(())
}

fn is_cert_or_key(name: &Path) -> bool {
    name.extension().map_or(false, |ext| ext == "crt" || ext == "key")
}

fn is_temporary(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(TEMP_PREFIX.as_bytes())
}

fn remove_stale(ssl_dir: &Path, desired: &BTreeMap<String, Desired<'_>>) -> Result<()> {
    let entries = std::fs::read_dir(ssl_dir)
        .with_context(|| format!("reading {}", ssl_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", ssl_dir.display()))?;
        let name = entry.file_name();
        let is_desired = name.to_str().map_or(false, |n| desired.contains_key(n));
        let stale = is_temporary(&name) || (is_cert_or_key(Path::new(&name)) && !is_desired);
        if !stale || entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        if remove_if_exists(&entry.path())? {
            debug!(name = %name.to_string_lossy(), "Removed stale file");
        }
    }
    Ok(())
}
