//! Plain FTP session
//!
//! `FtpClient` wraps a suppaftp `FtpStream` for unencrypted connections.

use std::io::Read;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::FtpStream;

use crate::protocols::{effective_timeout, no_address_error, resolve, FtpError, ProtocolConfig, Session};

/// FTP client for plain (unencrypted) FTP connections
pub struct FtpClient {
    stream: FtpStream,
}

impl FtpClient {
    /// Dials every resolved address in turn until one answers
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        _config: &ProtocolConfig,
    ) -> Result<Self, FtpError> {
        let timeout = effective_timeout(timeout);

        let mut last_error = None;
        for addr in resolve(host, port)? {
            match FtpStream::connect_timeout(addr, timeout) {
                Ok(stream) => return Ok(FtpClient { stream }),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| no_address_error("No addresses available")))
    }
}

impl Session for FtpClient {
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
