use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::logging::log;

/// Which request stopped the watch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Quit requested from inside the process (tray menu, tests)
    Quit,
}

impl ShutdownCause {
    fn to_code(self) -> u8 {
        match self {
            ShutdownCause::Interrupt => 1,
            ShutdownCause::Terminate => 2,
            ShutdownCause::Quit => 3,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ShutdownCause::Interrupt),
            2 => Some(ShutdownCause::Terminate),
            3 => Some(ShutdownCause::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Flags {
    requested: AtomicBool,
    cause: AtomicU8,
}

/// Shared quit flag
///
/// Cloning hands out another handle to the same flag. The dispatch loop
/// polls `is_requested()` and stops starting uploads once it is set.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flags: Arc<Flags>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a quit from inside the process
    pub fn request(&self) {
        self.request_with_cause(ShutdownCause::Quit);
    }

    /// Sets the flag and remembers what caused it
    ///
    /// Only touches atomics, so it is safe to call from the signal thread.
    /// The first cause wins.
    pub fn request_with_cause(&self, cause: ShutdownCause) {
        let _ = self
            .flags
            .cause
            .compare_exchange(0, cause.to_code(), Ordering::SeqCst, Ordering::SeqCst);
        self.flags.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flags.requested.load(Ordering::SeqCst)
    }

    /// Returns the cause of the shutdown, `None` while still running
    pub fn cause(&self) -> Option<ShutdownCause> {
        ShutdownCause::from_code(self.flags.cause.load(Ordering::SeqCst))
    }
}

/// What the signal thread does with one delivered signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    /// First signal: stop the loop, let running uploads finish
    Stop,
    /// Repeated signal: leave now with this exit code
    Exit(i32),
}

fn on_signal(shutdown: &Shutdown, sig: i32) -> SignalAction {
    if shutdown.is_requested() {
        return SignalAction::Exit(128 + sig);
    }
    let cause = match sig {
        SIGTERM => ShutdownCause::Terminate,
        _ => ShutdownCause::Interrupt,
    };
    shutdown.request_with_cause(cause);
    SignalAction::Stop
}

/// Routes SIGINT and SIGTERM into `shutdown`
///
/// A dedicated thread flips the flag on the first signal; logging of that
/// is left to the dispatch loop. A second signal (Ctrl+C during the grace
/// wait) exits the process at once.
pub fn install_signal_handlers(shutdown: &Shutdown) -> io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let shutdown = shutdown.clone();

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                if let SignalAction::Exit(code) = on_signal(&shutdown, sig) {
                    let _ = log("Second signal received, exiting without waiting for uploads");
                    process::exit(code);
                }
            }
        })?;

    Ok(())
}
