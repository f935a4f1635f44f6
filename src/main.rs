use std::process;
use std::sync::Arc;
use std::time::Duration;

use ftpsnap::cli::print_usage;
use ftpsnap::feedback::{LogClipboard, LogIndicator, SystemClipboard};
use ftpsnap::protocols::FtpConnector;
use ftpsnap::{
    install_signal_handlers, load_settings, log, parse_args, set_log_file, watcher, ClipboardSink,
    Command, Dispatcher, FeedbackSignaler, Shutdown, PROGRAM_NAME, PROGRAM_VERSION,
};

fn fail(message: String) -> ! {
    eprintln!("Error: {}", message);
    let _ = log(&format!("Fatal: {}", message));
    process::exit(1);
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_usage();
            process::exit(0);
        }
        Ok(Command::Version) => {
            println!("{} version {}", PROGRAM_NAME, PROGRAM_VERSION);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    if let Some(log_file) = &args.log_file {
        set_log_file(log_file);
    }

    let _ = log(&format!("{} {} starting", PROGRAM_NAME, PROGRAM_VERSION));

    let mut settings = match load_settings(args.config_file.as_deref()) {
        Ok(settings) => settings,
        Err(e) => fail(e.to_string()),
    };
    if let Some(timeout) = args.connect_timeout {
        settings.connect_timeout = Duration::from_secs(timeout);
    }
    if args.insecure_skip_verify {
        settings.insecure_skip_verify = true;
    }
    if settings.use_tls && settings.insecure_skip_verify {
        let _ = log("Warning: FTPS certificate verification is disabled");
    }
    let settings = Arc::new(settings);

    let shutdown = Shutdown::new();
    if let Err(e) = install_signal_handlers(&shutdown) {
        fail(format!("cannot install signal handlers: {}", e));
    }

    let (dir_watcher, events) = match watcher::attach(&settings.source_directory) {
        Ok(attached) => attached,
        Err(e) => fail(e.to_string()),
    };

    let clipboard: Arc<dyn ClipboardSink> = match SystemClipboard::new() {
        Ok(clipboard) => Arc::new(clipboard),
        Err(e) => {
            let _ = log(&format!("Clipboard unavailable ({}), view URLs go to the log", e));
            Arc::new(LogClipboard)
        }
    };
    let feedback = FeedbackSignaler::new(clipboard, Arc::new(LogIndicator));

    let mut dispatcher = Dispatcher::new(settings.clone(), Arc::new(FtpConnector), feedback, shutdown);
    if let Some(max_uploads) = args.max_uploads {
        dispatcher = match dispatcher.with_max_uploads(max_uploads) {
            Ok(dispatcher) => dispatcher,
            Err(e) => fail(format!("cannot start upload pool: {}", e)),
        };
        let _ = log(&format!("At most {} concurrent uploads", max_uploads));
    }

    let stats = dispatcher.run(events);
    drop(dir_watcher);

    if dispatcher.in_flight() > 0 {
        let _ = log(&format!(
            "Waiting up to {}s for {} running upload(s)",
            args.grace_seconds,
            dispatcher.in_flight()
        ));
        dispatcher.wait_for_uploads(Duration::from_secs(args.grace_seconds));
    }

    let _ = log(&format!(
        "Stopped: {} uploads dispatched, {} events ignored, {} watch errors",
        stats.accepted, stats.rejected, stats.watch_errors
    ));
}
