//! Socket creation.

use std::future::Future;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;

use super::stream::{BoxedStream, with_timeout};
use super::trust::TrustContext;
use crate::error::{Error, Result};

/// Creates the transports a session runs over.
///
/// The default is [`TlsSocketFactory`]. Tests substitute scripted streams.
pub trait SocketFactory: Send + Sync {
    /// Opens a connection, with a TLS handshake first if `tls` is set.
    ///
    /// `strict` selects certificate validation.
    fn connect(
        &self,
        host: &str,
        port: u16,
        tls: bool,
        strict: bool,
        timeout: Duration,
    ) -> impl Future<Output = Result<BoxedStream>> + Send;

    /// Runs a TLS handshake over an established plain connection.
    fn upgrade(
        &self,
        stream: BoxedStream,
        host: &str,
        strict: bool,
    ) -> impl Future<Output = Result<BoxedStream>> + Send;
}

/// TCP sockets with rustls on top.
#[derive(Debug, Clone, Default)]
pub struct TlsSocketFactory {
    trust: TrustContext,
}

impl TlsSocketFactory {
    /// Creates a factory using `trust` for certificate validation.
    #[must_use]
    pub const fn new(trust: TrustContext) -> Self {
        Self { trust }
    }

    async fn handshake(&self, stream: BoxedStream, host: &str, strict: bool) -> Result<BoxedStream> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| Error::InvalidDnsName(host.to_string()))?;
        let tls = self
            .trust
            .connector(strict)
            .connect(server_name, stream)
            .await?;
        Ok(Box::new(tls))
    }
}

impl SocketFactory for TlsSocketFactory {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        tls: bool,
        strict: bool,
        timeout: Duration,
    ) -> Result<BoxedStream> {
        tracing::debug!(host, port, tls, "connecting");
        let tcp = with_timeout(timeout, TcpStream::connect((host, port))).await?;
        tcp.set_nodelay(true)?;

        if tls {
            self.handshake(Box::new(tcp), host, strict).await
        } else {
            Ok(Box::new(tcp))
        }
    }

    async fn upgrade(&self, stream: BoxedStream, host: &str, strict: bool) -> Result<BoxedStream> {
        tracing::debug!(host, strict, "upgrading to TLS");
        self.handshake(stream, host, strict).await
    }
}
