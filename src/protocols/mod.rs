//! FTP session abstraction
//!
//! The upload task only talks to a `Session`, opened through a
//! `Connector`. The production connector picks plain FTP or explicit
//! FTPS from the settings; tests plug in their own connector.

pub mod ftp;
pub mod ftps;

pub use ftp::FtpClient;
pub use ftps::FtpsClient;

use std::io::Read;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::config::Settings;

/// Configuration for protocol connections
#[derive(Debug, Clone, Copy)]
pub struct ProtocolConfig {
    /// Skip TLS certificate verification (for FTPS with self-signed certs)
    pub insecure_skip_verify: bool,
}

/// Error type for protocol operations
pub type FtpError = suppaftp::FtpError;

/// An open, not yet authenticated control connection
///
/// One session carries exactly one upload and is owned by the task
/// doing it.
pub trait Session: Send {
    /// Authenticate with username and password
    fn login(&mut self, user: &str, password: &str) -> Result<(), FtpError>;

    /// Switch to binary (image) transfer type
    fn binary_mode(&mut self) -> Result<(), FtpError>;

    /// Store everything `reader` yields under `filename` (STOR)
    fn put_file(&mut self, filename: &str, reader: &mut dyn Read) -> Result<u64, FtpError>;

    /// Say goodbye and close the connection
    fn quit(self: Box<Self>) -> Result<(), FtpError>;
}

/// Opens sessions to the configured server
pub trait Connector: Send + Sync {
    fn connect(&self, settings: &Settings) -> Result<Box<dyn Session>, FtpError>;
}

/// Production connector: plain FTP, or FTPS with explicit TLS when
/// `settings.use_tls` is set
#[derive(Debug, Default, Clone, Copy)]
pub struct FtpConnector;

impl Connector for FtpConnector {
    fn connect(&self, settings: &Settings) -> Result<Box<dyn Session>, FtpError> {
        let config = ProtocolConfig {
            insecure_skip_verify: settings.insecure_skip_verify,
        };
        let host = settings.host.as_str();
        let timeout = settings.connect_timeout;

        if settings.use_tls {
            Ok(Box::new(FtpsClient::connect(host, settings.port, timeout, &config)?))
        } else {
            Ok(Box::new(FtpClient::connect(host, settings.port, timeout, &config)?))
        }
    }
}

/// Resolves `host:port` to every address it maps to
pub(crate) fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, FtpError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(FtpError::ConnectionError)?
        .collect();

    if addrs.is_empty() {
        return Err(no_address_error("No addresses found"));
    }
    Ok(addrs)
}

pub(crate) fn no_address_error(message: &str) -> FtpError {
    FtpError::ConnectionError(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        message.to_string(),
    ))
}

/// Connect timeout, clamped so a zero value never means "block forever"
pub(crate) fn effective_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        Duration::from_secs(crate::config::DEFAULT_CONNECT_TIMEOUT)
    } else {
        timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_localhost() {
        let addrs = resolve("127.0.0.1", 21).unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:21".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_effective_timeout() {
        assert_eq!(effective_timeout(Duration::ZERO), Duration::from_secs(5));
        assert_eq!(
            effective_timeout(Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_connector_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FtpConnector>();
    }
}
