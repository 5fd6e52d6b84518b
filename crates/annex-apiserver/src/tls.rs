use miette::{Context, IntoDiagnostic};
use std::path::PathBuf;
use tracing::info;

/// How TLS should be configured for the API server.
///
/// Certificate issuance and rotation belong to an external collaborator;
/// this server only consumes PEM material that already exists on disk.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// No TLS — plain HTTP.
    #[default]
    Disabled,
    /// Use explicitly provided PEM certificate and key files.
    Provided {
        cert_path: PathBuf,
        key_path: PathBuf,
    },
}

/// Resolved TLS key material ready for use by the server.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

/// Resolve TLS material from the given mode.
///
/// - `Disabled` → returns `None`
/// - `Provided` → reads cert/key from the supplied paths and verifies the
///   PEM parses before handing it to the listener
pub fn resolve_tls(mode: &TlsMode) -> miette::Result<Option<TlsMaterial>> {
    match mode {
        TlsMode::Disabled => Ok(None),
        TlsMode::Provided {
            cert_path,
            key_path,
        } => {
            let cert_pem = std::fs::read(cert_path)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read TLS cert at {}", cert_path.display()))?;
            let key_pem = std::fs::read(key_path)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read TLS key at {}", key_path.display()))?;

            let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
                .collect::<std::result::Result<Vec<_>, _>>()
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid certificate PEM at {}", cert_path.display()))?;
            if certs.is_empty() {
                miette::bail!("no certificates found in {}", cert_path.display());
            }

            rustls_pemfile::private_key(&mut key_pem.as_slice())
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid key PEM at {}", key_path.display()))?
                .ok_or_else(|| miette::miette!("no private key found in {}", key_path.display()))?;

            info!(
                "Loaded TLS material from {} and {}",
                cert_path.display(),
                key_path.display()
            );

            Ok(Some(TlsMaterial { cert_pem, key_pem }))
        }
    }
}
