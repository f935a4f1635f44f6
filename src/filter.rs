//! Decides which change events turn into uploads
//!
//! A pure gate: only newly created, non-hidden `.png` files pass.

use std::path::Path;

use crate::event::{ChangeEvent, ChangeKind};

/// Suffix an accepted file name must end with (case-sensitive)
pub const IMAGE_EXTENSION: &str = ".png";

const HIDDEN_MARKER: char = '.';

/// Returns the base name of `path` as UTF-8, if it has one
fn file_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

/// True when the base name starts with `.`
///
/// Paths without a base name (empty, `/`, `..`) are not hidden.
pub fn is_hidden(path: impl AsRef<Path>) -> bool {
    file_name(path.as_ref())
        .map(|name| name.starts_with(HIDDEN_MARKER))
        .unwrap_or(false)
}

/// True when the base name has the `.png` extension
///
/// The extension is the part of the base name from the last dot on.
pub fn is_image_file(path: impl AsRef<Path>) -> bool {
    match file_name(path.as_ref()) {
        Some(name) => match name.rfind('.') {
            Some(idx) => &name[idx..] == IMAGE_EXTENSION,
            None => false,
        },
        None => false,
    }
}

/// Accept/reject decision for one event
///
/// Rules, in order: must be a creation, must not be hidden, must be a png.
/// Empty or malformed paths are rejected.
pub fn accepts(event: &ChangeEvent) -> bool {
    if event.kind != ChangeKind::Created {
        return false;
    }
    if file_name(&event.path).is_none() {
        return false;
    }
    if is_hidden(&event.path) {
        return false;
    }
    is_image_file(&event.path)
}
