//! TLS client configuration for `wss://` servers.
//!
//! Trust anchors are the system roots plus an optional extra CA bundle, which
//! covers capture servers running behind a private CA.

use super::socket::{SocketError, SocketResult};
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::CertificateDer;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Build a client configuration trusting system roots and `extra_ca`.
///
/// Fails if the resulting root store is empty or `extra_ca` cannot be read.
pub fn create_client_config(extra_ca: Option<&Path>) -> SocketResult<Arc<ClientConfig>> {
    let mut root_store = RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();

    // Log any errors but continue with successfully loaded certs
    for err in native_certs.errors {
        debug!("Warning loading native cert: {}", err);
    }

    let (added, ignored) = root_store.add_parsable_certificates(native_certs.certs);
    debug!("Loaded {} system root certificates ({} ignored)", added, ignored);

    if let Some(path) = extra_ca {
        for cert in load_pem_certificates(path)? {
            root_store
                .add(cert)
                .map_err(|e| SocketError::Tls(format!("Invalid CA certificate in {:?}: {}", path, e)))?;
        }
        debug!("Added CA certificates from {:?}", path);
    }

    if root_store.is_empty() {
        return Err(SocketError::Tls("No root certificates available".into()));
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

/// Read every certificate from a PEM file.
pub fn load_pem_certificates(path: &Path) -> SocketResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(SocketError::Tls(format!("No certificates found in {:?}", path)));
    }
    Ok(certs)
}
