//! Clipboard write and busy/idle pulse for every dispatched upload
//!
//! Both are optimistic: the URL goes to the clipboard before the upload
//! has even connected, and the pulse is not tied to transfer completion.
//! Neither holds up the caller. Clipboard writes go through one writer
//! thread so they land in dispatch order and the last URL wins.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::job::UploadJob;
use crate::logging::log;

/// How long the busy indicator stays on after a dispatch
pub const DEFAULT_PULSE: Duration = Duration::from_secs(1);

/// Destination for view URLs
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), String>;
}

/// Busy/idle visual indicator (tray icon or similar)
pub trait StatusIndicator: Send + Sync {
    fn show_busy(&self);
    fn show_idle(&self);
}

/// System clipboard through `arboard`
///
/// The handle is kept for the life of the process: on X11 the clipboard
/// content is served by its owner, so dropping it would empty the
/// clipboard again.
pub struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, arboard::Error> {
        Ok(Self {
            inner: Mutex::new(arboard::Clipboard::new()?),
        })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), String> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|_| "clipboard lock poisoned".to_string())?;
        clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
    }
}

/// Fallback when no clipboard is available (headless sessions)
#[derive(Debug, Default)]
pub struct LogClipboard;

impl ClipboardSink for LogClipboard {
    fn set_text(&self, text: &str) -> Result<(), String> {
        let _ = log(&format!("View URL: {}", text));
        Ok(())
    }
}

/// Indicator for running without a tray: logs the transitions
#[derive(Debug, Default)]
pub struct LogIndicator;

impl StatusIndicator for LogIndicator {
    fn show_busy(&self) {
        let _ = log("Status: busy");
    }

    fn show_idle(&self) {
        let _ = log("Status: idle");
    }
}

/// Starts the thread that owns `sink` and writes every URL it receives
///
/// The thread ends once every sender is dropped.
fn spawn_clipboard_writer(sink: Arc<dyn ClipboardSink>) -> Sender<String> {
    let (tx, rx) = mpsc::channel::<String>();
    let spawned = thread::Builder::new()
        .name("clipboard".to_string())
        .spawn(move || {
            for text in rx {
                if let Err(e) = sink.set_text(&text) {
                    let _ = log(&format!("Error writing view URL to clipboard: {}", e));
                }
            }
        });
    if let Err(e) = spawned {
        let _ = log(&format!("Error starting clipboard writer: {}", e));
    }
    tx
}

/// Writes the view URL and pulses the indicator for each dispatched job
#[derive(Clone)]
pub struct FeedbackSignaler {
    clipboard: Sender<String>,
    indicator: Arc<dyn StatusIndicator>,
    pulse: Duration,
}

impl FeedbackSignaler {
    pub fn new(clipboard: Arc<dyn ClipboardSink>, indicator: Arc<dyn StatusIndicator>) -> Self {
        Self {
            clipboard: spawn_clipboard_writer(clipboard),
            indicator,
            pulse: DEFAULT_PULSE,
        }
    }

    /// Overrides how long the busy state is held
    pub fn with_pulse(mut self, pulse: Duration) -> Self {
        self.pulse = pulse;
        self
    }

    /// Queues the view URL for the clipboard and starts the pulse
    ///
    /// Returns at once with the URL; a slow clipboard never delays the
    /// caller.
    pub fn signal(&self, job: &UploadJob, base_url: &str) -> String {
        let view_url = job.view_url(base_url);

        if self.clipboard.send(view_url.clone()).is_err() {
            let _ = log(&format!("Clipboard writer is gone, view URL: {}", view_url));
        }

        let indicator = self.indicator.clone();
        let pulse = self.pulse;
        let spawned = thread::Builder::new()
            .name("pulse".to_string())
            .spawn(move || {
                indicator.show_busy();
                thread::sleep(pulse);
                indicator.show_idle();
            });
        if let Err(e) = spawned {
            let _ = log(&format!("Error starting status pulse: {}", e));
        }

        view_url
    }
}
