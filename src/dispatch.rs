//! The dispatch loop
//!
//! Consumes change events, gates them through the filter and starts an
//! upload plus feedback for every accepted one. The loop never waits for
//! an upload: each one runs on its own thread, or is queued on the
//! bounded pool when `-p` was given.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::event::WatchMessage;
use crate::feedback::FeedbackSignaler;
use crate::filter;
use crate::job::UploadJob;
use crate::logging::log;
use crate::protocols::Connector;
use crate::shutdown::Shutdown;
use crate::upload::{self, UploadNotice};

/// How often the loop wakes up to look at the shutdown flag
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Counters reported when the loop stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub accepted: usize,
    pub rejected: usize,
    pub watch_errors: usize,
}

pub struct Dispatcher {
    settings: Arc<Settings>,
    connector: Arc<dyn Connector>,
    feedback: FeedbackSignaler,
    shutdown: Shutdown,
    pool: Option<Arc<rayon::ThreadPool>>,
    notices: Option<Sender<UploadNotice>>,
    in_flight: Arc<AtomicUsize>,
}

/// Text of a panic payload, for the log
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

impl Dispatcher {
    pub fn new(
        settings: Arc<Settings>,
        connector: Arc<dyn Connector>,
        feedback: FeedbackSignaler,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            settings,
            connector,
            feedback,
            shutdown,
            pool: None,
            notices: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Caps concurrent uploads at `max_uploads`
    ///
    /// Jobs beyond the cap wait in the pool's queue; intake is not blocked.
    pub fn with_max_uploads(mut self, max_uploads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_uploads.max(1))
            .thread_name(|i| format!("upload-{}", i))
            .panic_handler(|payload| {
                let _ = log(&format!("Upload task panicked: {}", panic_message(&*payload)));
            })
            .build()?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    /// Publishes `UploadNotice`s on `notices`
    pub fn with_notices(mut self, notices: Sender<UploadNotice>) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Runs until shutdown is requested or the event channel closes
    pub fn run(&self, events: Receiver<WatchMessage>) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let mut state = LoopState::Running;

        let _ = log(&format!(
            "Watching {} for new screenshots",
            self.settings.source_directory.display()
        ));

        while state == LoopState::Running {
            state = self.step(&events, &mut stats);
        }

        stats
    }

    fn step(&self, events: &Receiver<WatchMessage>, stats: &mut DispatchStats) -> LoopState {
        if self.shutdown.is_requested() {
            let _ = log(&format!(
                "Shutdown requested ({:?}), no new uploads will be started",
                self.shutdown.cause()
            ));
            return LoopState::Stopped;
        }

        match events.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => {
                // A quit may have arrived while we were blocked
                if self.shutdown.is_requested() {
                    return LoopState::Running;
                }
                if filter::accepts(&event) {
                    stats.accepted += 1;
                    self.dispatch(UploadJob::from_event(&event));
                } else {
                    stats.rejected += 1;
                }
                LoopState::Running
            }
            Ok(Err(e)) => {
                stats.watch_errors += 1;
                let _ = log(&format!("Error: {}", e));
                LoopState::Running
            }
            Err(RecvTimeoutError::Timeout) => LoopState::Running,
            Err(RecvTimeoutError::Disconnected) => {
                let _ = log("Event stream closed, stopping");
                LoopState::Stopped
            }
        }
    }

    /// Starts feedback and the upload for one job, returns the view URL
    ///
    /// The URL is queued for the clipboard before the upload is started;
    /// neither is waited for.
    pub fn dispatch(&self, job: UploadJob) -> String {
        let _ = log(&format!(
            "New screenshot {} -> {}",
            job.source_path.display(),
            job.remote_name
        ));

        let view_url = self.feedback.signal(&job, &self.settings.base_url);

        if let Some(notices) = &self.notices {
            let _ = notices.send(UploadNotice::Dispatched {
                remote_name: job.remote_name.clone(),
                view_url: view_url.clone(),
            });
        }

        let settings = self.settings.clone();
        let connector = self.connector.clone();
        let notices = self.notices.clone();
        let in_flight = self.in_flight.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);
        let task = move || {
            let _done = scopeguard::guard((), |_| {
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
            upload::execute(connector.as_ref(), &settings, &job, notices.as_ref());
        };

        match &self.pool {
            Some(pool) => pool.spawn(task),
            None => {
                if let Err(e) = thread::Builder::new().name("upload".to_string()).spawn(task) {
                    self.in_flight.fetch_sub(1, Ordering::SeqCst);
                    let _ = log(&format!("Error starting upload thread: {}", e));
                }
            }
        }

        view_url
    }

    /// Number of uploads started and not yet finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits up to `grace` for running uploads to finish
    ///
    /// Returns true when nothing is left in flight.
    pub fn wait_for_uploads(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            let remaining = self.in_flight();
            if remaining == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                let _ = log(&format!(
                    "{} upload(s) still running after {}s grace period",
                    remaining,
                    grace.as_secs()
                ));
                return false;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
