//! TLS trust configuration.
//!
//! A [`TrustContext`] is built once and handed to the socket factory. It holds
//! two client configurations: a strict one that validates the server chain
//! against the webpki roots (plus any extra certificates), and a permissive
//! one for the "optional" security modes that accepts any certificate.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::TlsConnector;

use crate::error::Result;

/// Certificate trust settings for secure sockets.
#[derive(Debug, Clone)]
pub struct TrustContext {
    strict: Arc<ClientConfig>,
    permissive: Arc<ClientConfig>,
}

impl TrustContext {
    /// Trusts the webpki root certificates.
    #[must_use]
    pub fn new() -> Self {
        Self::from_roots(webpki_roots_store())
    }

    /// Trusts the webpki roots plus `certificates`.
    ///
    /// Use this to accept a self-signed server certificate in strict mode.
    ///
    /// # Errors
    ///
    /// Returns an error if a certificate cannot be parsed.
    pub fn with_extra_roots(
        certificates: impl IntoIterator<Item = CertificateDer<'static>>,
    ) -> Result<Self> {
        let mut roots = webpki_roots_store();
        for certificate in certificates {
            roots.add(certificate)?;
        }
        Ok(Self::from_roots(roots))
    }

    fn from_roots(roots: RootCertStore) -> Self {
        let strict = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let permissive = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth();

        Self {
            strict: Arc::new(strict),
            permissive: Arc::new(permissive),
        }
    }

    /// Returns a connector, validating certificates if `strict` is set.
    #[must_use]
    pub fn connector(&self, strict: bool) -> TlsConnector {
        if strict {
            TlsConnector::from(Arc::clone(&self.strict))
        } else {
            TlsConnector::from(Arc::clone(&self.permissive))
        }
    }
}

impl Default for TrustContext {
    fn default() -> Self {
        Self::new()
    }
}

fn webpki_roots_store() -> RootCertStore {
    RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    }
}

/// Accepts any server certificate but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        tracing::debug!(?server_name, "accepting server certificate without validation");
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
