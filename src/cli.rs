use std::path::PathBuf;
use thiserror::Error;

/// Prints usage instructions for the program.
pub fn print_usage() {
    println!(
        "Usage: {} [-h] [-v] [-l logfile] [-t connect_timeout] [-p max_uploads] [-g grace_seconds] [--insecure-skip-verify] [config_file]",
        crate::PROGRAM_NAME
    );
}

/// Default time given to running uploads after a quit
pub const DEFAULT_GRACE_SECONDS: u64 = 30;

/// Options given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Append log lines to this file instead of stdout
    pub log_file: Option<PathBuf>,
    /// JSON config file, `config.json` in the working directory when absent
    pub config_file: Option<PathBuf>,
    /// Overrides `connect_timeout` from the config (seconds)
    pub connect_timeout: Option<u64>,
    /// Upper bound on concurrent uploads, unbounded when absent
    pub max_uploads: Option<usize>,
    /// Accept any FTPS server certificate
    pub insecure_skip_verify: bool,
    /// How long to wait for running uploads on shutdown
    pub grace_seconds: u64,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            log_file: None,
            config_file: None,
            connect_timeout: None,
            max_uploads: None,
            insecure_skip_verify: false,
            grace_seconds: DEFAULT_GRACE_SECONDS,
        }
    }
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
    Version,
}

/// Bad command line. The message is printed together with the usage line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CliError(pub String);

fn positive<T: std::str::FromStr + PartialOrd + Default>(
    value: Option<String>,
    what: &str,
) -> Result<T, CliError> {
    let value = value.ok_or_else(|| CliError(format!("Missing {} argument", what)))?;
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(CliError(format!("{} must be a positive number", capitalize(what)))),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses command line arguments (without the program name)
///
/// # Errors
/// - Option missing its value
/// - Non-numeric or zero timeout, upload cap or grace period
/// - More than one config file
pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "-l" => {
                let path = args
                    .next()
                    .ok_or_else(|| CliError("Missing log file argument".to_string()))?;
                parsed.log_file = Some(PathBuf::from(path));
            }
            "-t" => parsed.connect_timeout = Some(positive(args.next(), "connect timeout")?),
            "-p" => parsed.max_uploads = Some(positive(args.next(), "max uploads")?),
            "-g" => parsed.grace_seconds = positive(args.next(), "grace seconds")?,
            "--insecure-skip-verify" => parsed.insecure_skip_verify = true,
            other if other.starts_with('-') => {
                return Err(CliError(format!("Unknown option: {}", other)));
            }
            _ => {
                if parsed.config_file.is_some() {
                    return Err(CliError(format!("Unexpected argument: {}", arg)));
                }
                parsed.config_file = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(Command::Run(parsed))
}
