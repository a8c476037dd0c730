// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TLS material validation, run once at startup per the lifecycle's
//! "validate TLS material once" step. The handshake itself belongs to
//! whatever accepts the remote-management connection; this collaborator
//! only answers "is this certificate/key pair usable".

use std::io::BufReader;
use std::path::Path;

use pgmoneta_core::PgmonetaError;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

pub struct TlsValidator;

impl TlsValidator {
    /// Parse the certificate chain and private key and build a
    /// `rustls::ServerConfig` from them, surfacing any problem as
    /// [`PgmonetaError::TlsInvalid`]. A startup failure here is fatal, per
    /// the error-handling design.
    pub fn validate(cert_path: &Path, key_path: &Path) -> Result<rustls::ServerConfig, PgmonetaError> {
        let certs = load_certs(cert_path)?;
        let key = load_key(key_path)?;

        rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| PgmonetaError::TlsInvalid(e.to_string()))
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, PgmonetaError> {
    let file = std::fs::File::open(path)
        .map_err(|e| PgmonetaError::TlsInvalid(format!("{}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PgmonetaError::TlsInvalid(e.to_string()))
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, PgmonetaError> {
    let file = std::fs::File::open(path)
        .map_err(|e| PgmonetaError::TlsInvalid(format!("{}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| PgmonetaError::TlsInvalid(e.to_string()))?
        .ok_or_else(|| PgmonetaError::TlsInvalid(format!("no private key in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cert_file_is_tls_invalid() {
        let err = TlsValidator::validate(
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key.pem"),
        )
        .unwrap_err();
        assert!(matches!(err, PgmonetaError::TlsInvalid(_)));
    }
}
