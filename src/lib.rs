//! Screenshot-to-FTP uploader library
//!
//! Watches one directory for new `.png` files, uploads each one to an FTP
//! server under a fresh UUID name and puts the resulting view URL on the
//! clipboard.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod feedback;
pub mod filter;
pub mod job;
pub mod logging;
pub mod protocols;
pub mod shutdown;
pub mod upload;
pub mod watcher;

pub use cli::{parse_args, CliArgs, Command};
pub use config::{load_settings, Settings};
pub use dispatch::{DispatchStats, Dispatcher};
pub use error::{ConfigError, UploadError, WatchError};
pub use event::{ChangeEvent, ChangeKind, WatchMessage};
pub use feedback::{ClipboardSink, FeedbackSignaler, StatusIndicator};
pub use job::UploadJob;
pub use logging::{log, log_with_tag, set_log_file};
pub use shutdown::{install_signal_handlers, Shutdown};
pub use upload::UploadNotice;

/// Name of the program, used in usage and version output
pub const PROGRAM_NAME: &str = "ftpsnap";

/// Current version of the program (from Cargo.toml)
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
