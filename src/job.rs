use std::path::PathBuf;
use uuid::Uuid;

use crate::event::ChangeEvent;
use crate::filter::IMAGE_EXTENSION;

/// One file to be stored on the remote server
///
/// The remote name is a fresh v4 UUID plus the image extension, so two
/// jobs never target the same remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub source_path: PathBuf,
    pub remote_name: String,
}

impl UploadJob {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            remote_name: format!("{}{}", Uuid::new_v4(), IMAGE_EXTENSION),
        }
    }

    pub fn from_event(event: &ChangeEvent) -> Self {
        Self::new(event.path.clone())
    }

    /// Public address of the uploaded file
    pub fn view_url(&self, base_url: &str) -> String {
        join_url(base_url, &self.remote_name)
    }
}

/// Joins a base URL and a file name with exactly one `/`
pub fn join_url(base_url: &str, name: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", base, name.trim_start_matches('/'))
}
