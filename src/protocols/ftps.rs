//! FTPS (explicit TLS) session
//!
//! Connects in the clear, then upgrades the control channel with
//! `AUTH TLS` and protects the data channel with `PROT P`.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use suppaftp::types::{FileType, Mode};
use suppaftp::{RustlsConnector, RustlsFtpStream};

use crate::logging::log_with_tag;
use crate::protocols::{effective_timeout, no_address_error, resolve, FtpError, ProtocolConfig, Session};

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::DigitallySignedStruct;

    /// Certificate verifier that accepts any certificate
    ///
    /// Only reachable through `tls_insecure_skip_verify` or
    /// `--insecure-skip-verify`.
    #[derive(Debug)]
    pub struct AcceptAnyCertificate;

    impl ServerCertVerifier for AcceptAnyCertificate {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}

/// Builds the rustls client config for one connection
fn tls_config(config: &ProtocolConfig, host: &str) -> Result<rustls::ClientConfig, FtpError> {
    let provider = rustls::crypto::ring::default_provider();
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| FtpError::SecureError(e.to_string()))?;

    if config.insecure_skip_verify {
        let _ = log_with_tag(
            &format!(
                "Warning: certificate verification for {} is DISABLED (insecure_skip_verify)",
                host
            ),
            None,
        );
        return Ok(builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::AcceptAnyCertificate))
            .with_no_client_auth());
    }

    let mut root_store = rustls::RootCertStore::empty();
    let certs_result = rustls_native_certs::load_native_certs();
    for cert in certs_result.certs {
        root_store.add(cert).ok();
    }
    if !certs_result.errors.is_empty() {
        let _ = log_with_tag(
            &format!(
                "Warning: failed to load some native certificates: {:?}",
                certs_result.errors
            ),
            None,
        );
    }

    Ok(builder
        .with_root_certificates(root_store)
        .with_no_client_auth())
}

/// FTPS client for encrypted FTP over TLS connections
pub struct FtpsClient {
    stream: RustlsFtpStream,
}

impl FtpsClient {
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        config: &ProtocolConfig,
    ) -> Result<Self, FtpError> {
        let timeout = effective_timeout(timeout);
        let addrs = resolve(host, port)?;
        let tls_config = Arc::new(tls_config(config, host)?);

        let mut last_error = None;
        for addr in addrs {
            match RustlsFtpStream::connect_timeout(addr, timeout) {
                Ok(plain_stream) => {
                    let connector = RustlsConnector::from(tls_config.clone());
                    match plain_stream.into_secure(connector, host) {
                        Ok(mut stream) => {
                            stream.custom_command("PROT P", &[suppaftp::Status::CommandOk])?;
                            stream.set_mode(Mode::Passive);
                            stream.set_passive_nat_workaround(true);
                            return Ok(FtpsClient { stream });
                        }
                        Err(e) => last_error = Some(e),
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| no_address_error("No addresses available")))
    }
}

impl Session for FtpsClient {
    fn login(&mut self, user: &str, password: &str) -> Result<(), FtpError> {
        self.stream.login(user, password)
    }

    fn binary_mode(&mut self) -> Result<(), FtpError> {
        self.stream.transfer_type(FileType::Binary)
    }

    fn put_file(&mut self, filename: &str, reader: &mut dyn Read) -> Result<u64, FtpError> {
        let mut reader = reader;
        self.stream.put_file(filename, &mut reader)
    }

    fn quit(mut self: Box<Self>) -> Result<(), FtpError> {
        self.stream.quit()
    }
}
