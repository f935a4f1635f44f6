use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Global log file path protected by Mutex
///
/// When None, logs go to stdout.
pub static LOG_FILE: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

/// Logs a message with timestamp to configured output
///
/// # Example
/// ```text
/// // log("Watching /home/me/Screenshots").unwrap();
/// ```
pub fn log(message: &str) -> io::Result<()> {
    log_with_tag(message, None)
}

/// Logs a message with timestamp and optional tag
///
/// Upload tasks pass their remote file name as the tag so that lines from
/// concurrent uploads can be told apart.
///
/// # Example
/// ```text
/// // log_with_tag("Connected", Some("0b6f...e1.png")).unwrap();
/// ```
pub fn log_with_tag(message: &str, tag: Option<&str>) -> io::Result<()> {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let log_message = format_line(&timestamp, message, tag);

    // A panic while holding the lock must not silence every later log line
    let guard = match LOG_FILE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    match &*guard {
        Some(log_file) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            file.write_all(log_message.as_bytes())?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(log_message.as_bytes())?;
        }
    }

    Ok(())
}

fn format_line(timestamp: &str, message: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{} [{}] {}\n", timestamp, tag, message),
        None => format!("{} {}\n", timestamp, message),
    }
}

/// Sets the path for the log file
///
/// Subsequent calls to `log` append to this file instead of stdout.
pub fn set_log_file<P: AsRef<Path>>(path: P) {
    let path_str = path.as_ref().to_string_lossy().into_owned();
    let mut guard = match LOG_FILE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(path_str);
}

/// Switches logging back to stdout
pub fn clear_log_file() {
    let mut guard = match LOG_FILE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = None;
}
