use secrecy::ExposeSecret;
use std::fs::File;
use std::sync::mpsc::Sender;
use std::time::Instant;

use crate::config::Settings;
use crate::error::UploadError;
use crate::job::UploadJob;
use crate::logging::log_with_tag;
use crate::protocols::{Connector, Session};

/// What the core publishes about uploads
///
/// A presentation adapter (tray, notifications, tests) can subscribe to
/// these without the core knowing about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadNotice {
    /// Job accepted and handed to a worker; view URL already on the clipboard
    Dispatched { remote_name: String, view_url: String },
    /// File stored on the server
    Completed { remote_name: String, bytes: u64 },
    /// Upload abandoned
    Failed { remote_name: String, error: String },
}

/// Makes one attempt at storing `job` on the server
///
/// # Steps
/// connect, login, binary mode, open local file, STOR. Once connected the
/// session is always closed with QUIT, whatever happens after. A failing
/// QUIT is logged and does not change the result.
///
/// # Errors
/// - `Connection` if the server cannot be reached
/// - `Authentication` if the login is rejected
/// - `LocalIo` if the source file is gone or unreadable
/// - `Transfer` if the data transfer fails (partial remote files are left)
pub fn run_upload(
    connector: &dyn Connector,
    settings: &Settings,
    job: &UploadJob,
) -> Result<u64, UploadError> {
    let tag = Some(job.remote_name.as_str());

    let session = connector
        .connect(settings)
        .map_err(|source| UploadError::Connection {
            addr: settings.address(),
            source,
        })?;
    let _ = log_with_tag(&format!("Connected to {}", settings.address()), tag);

    let mut session = scopeguard::guard(session, |session| close_session(session, &job.remote_name));

    session
        .login(&settings.username, settings.password.expose_secret())
        .map_err(|source| UploadError::Authentication {
            user: settings.username.clone(),
            source,
        })?;

    session
        .binary_mode()
        .map_err(|source| UploadError::Transfer {
            remote_name: job.remote_name.clone(),
            source,
        })?;

    let mut file = File::open(&job.source_path).map_err(|source| UploadError::LocalIo {
        path: job.source_path.clone(),
        source,
    })?;

    session
        .put_file(&job.remote_name, &mut file)
        .map_err(|source| UploadError::Transfer {
            remote_name: job.remote_name.clone(),
            source,
        })
}

fn close_session(session: Box<dyn Session>, remote_name: &str) {
    if let Err(e) = session.quit() {
        let _ = log_with_tag(
            &format!("Error closing FTP session: {}", e.to_string().replace('\n', " ")),
            Some(remote_name),
        );
    }
}

/// Runs one upload as a fire-and-forget unit of work
///
/// The outcome only goes to the log and, when given, the notice channel.
pub fn execute(
    connector: &dyn Connector,
    settings: &Settings,
    job: &UploadJob,
    notices: Option<&Sender<UploadNotice>>,
) {
    let tag = Some(job.remote_name.as_str());
    let started = Instant::now();

    let _ = log_with_tag(
        &format!("Uploading {} to {}", job.source_path.display(), settings.address()),
        tag,
    );

    let notice = match run_upload(connector, settings, job) {
        Ok(bytes) => {
            let _ = log_with_tag(
                &format!(
                    "Successful upload of {} ({} bytes in {:.1}s)",
                    job.source_path.display(),
                    bytes,
                    started.elapsed().as_secs_f64()
                ),
                tag,
            );
            UploadNotice::Completed {
                remote_name: job.remote_name.clone(),
                bytes,
            }
        }
        Err(e) => {
            let error = e.to_string().replace('\n', " ");
            let _ = log_with_tag(&format!("Upload failed: {}", error), tag);
            UploadNotice::Failed {
                remote_name: job.remote_name.clone(),
                error,
            }
        }
    };

    if let Some(notices) = notices {
        // Nobody listening is fine
        let _ = notices.send(notice);
    }
}
