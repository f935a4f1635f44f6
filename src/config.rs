use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default FTP control port
pub const DEFAULT_PORT: u16 = 21;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Prefix of the environment variables that override file values
pub const ENV_PREFIX: &str = "FTPSNAP_";

/// Runtime settings, built once at startup and never changed
pub struct Settings {
    /// FTP server hostname or IP
    pub host: String,
    /// FTP control port
    pub port: u16,
    /// Upgrade the control connection with explicit TLS (AUTH TLS)
    pub use_tls: bool,
    /// Accept any server certificate. Off unless explicitly enabled.
    pub insecure_skip_verify: bool,
    pub username: String,
    pub password: SecretString,
    /// Directory watched for new screenshots
    pub source_directory: PathBuf,
    /// Prefix of the view URLs put on the clipboard
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl Settings {
    /// `host:port` as used in log lines and errors
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source_directory", &self.source_directory)
            .field("base_url", &self.base_url)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Port may be written as `21` or `"21"`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(i64),
    Text(String),
}

/// Raw config file contents, every key optional until validation
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    host: Option<String>,
    port: Option<PortValue>,
    tls: Option<bool>,
    tls_insecure_skip_verify: Option<bool>,
    username: Option<String>,
    password: Option<String>,
    source_path: Option<String>,
    base_url: Option<String>,
    connect_timeout: Option<u64>,
}

/// Loads settings from a JSON file and the environment
///
/// # Arguments
/// * `path` - Config file. When `None`, `config.json` in the working
///   directory is used if it exists.
///
/// # Errors
/// - Explicit config file missing or unreadable
/// - Invalid JSON or wrongly typed field
/// - Required key missing from both file and environment
/// - Invalid port, boolean or timeout value
///
/// # File Format
/// ```text
/// {"host":"ftp.example.com","port":21,"tls":true,"username":"me",
///  "password":"secret","source_path":"/home/me/Screenshots",
///  "base_url":"https://img.example.com"}
/// ```
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut raw = match path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            match read_config_file(default_path) {
                Ok(raw) => raw,
                Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                    RawConfig::default()
                }
                Err(e) => return Err(e),
            }
        }
    };

    apply_env(&mut raw, |key| std::env::var(key).ok())?;
    validate(raw)
}

fn read_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(text: &str) -> Result<RawConfig, serde_json::Error> {
    serde_json::from_str(text)
}

/// Overlays `FTPSNAP_*` variables onto the file values
fn apply_env<F>(raw: &mut RawConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

    if let Some(v) = var("HOST") {
        raw.host = Some(v);
    }
    if let Some(v) = var("PORT") {
        raw.port = Some(PortValue::Text(v));
    }
    if let Some(v) = var("TLS") {
        raw.tls = Some(parse_bool("tls", &v)?);
    }
    if let Some(v) = var("USERNAME") {
        raw.username = Some(v);
    }
    if let Some(v) = var("PASSWORD") {
        raw.password = Some(v);
    }
    if let Some(v) = var("SOURCE_PATH") {
        raw.source_path = Some(v);
    }
    if let Some(v) = var("BASE_URL") {
        raw.base_url = Some(v);
    }
    Ok(())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got {:?}", other),
        }),
    }
}

fn parse_port(value: Option<PortValue>) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid { key: "port", reason };

    let number = match value {
        None => return Ok(DEFAULT_PORT),
        Some(PortValue::Number(n)) => n,
        Some(PortValue::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(DEFAULT_PORT);
            }
            s.parse::<i64>()
                .map_err(|e| invalid(format!("{:?} is not a number: {}", s, e)))?
        }
    };

    match u16::try_from(number) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(invalid(format!("{} is out of range 1-65535", number))),
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn validate(raw: RawConfig) -> Result<Settings, ConfigError> {
    let host = required(raw.host, "host")?;
    let port = parse_port(raw.port)?;
    let source_path = required(raw.source_path, "source_path")?;
    let base_url = required(raw.base_url, "base_url")?;

    let connect_timeout = match raw.connect_timeout {
        Some(0) => {
            return Err(ConfigError::Invalid {
                key: "connect_timeout",
                reason: "must be a positive number of seconds".to_string(),
            })
        }
        Some(secs) => secs,
        None => DEFAULT_CONNECT_TIMEOUT,
    };

    Ok(Settings {
        host: host.trim().to_string(),
        port,
        use_tls: raw.tls.unwrap_or(false),
        insecure_skip_verify: raw.tls_insecure_skip_verify.unwrap_or(false),
        username: raw.username.unwrap_or_default(),
        password: SecretString::new(raw.password.unwrap_or_default()),
        source_directory: PathBuf::from(source_path),
        base_url,
        connect_timeout: Duration::from_secs(connect_timeout),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const FULL: &str = r#"{"host":"ftp.example.com","port":"2121","tls":true,"username":"me","password":"secret","source_path":"/home/me/Screenshots","base_url":"https://img.example.com"}"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_full_config() {
        let mut raw = parse_config(FULL).unwrap();
        apply_env(&mut raw, no_env).unwrap();
        let settings = validate(raw).unwrap();

        assert_eq!(settings.host, "ftp.example.com");
        assert_eq!(settings.port, 2121);
        assert!(settings.use_tls);
        assert!(!settings.insecure_skip_verify);
        assert_eq!(settings.username, "me");
        assert_eq!(settings.password.expose_secret(), "secret");
        assert_eq!(settings.source_directory, PathBuf::from("/home/me/Screenshots"));
        assert_eq!(settings.base_url, "https://img.example.com");
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.address(), "ftp.example.com:2121");
    }

    #[test]
    fn test_defaults() {
        let raw = parse_config(
            r#"{"host":"h","source_path":"/src","base_url":"https://x"}"#,
        )
        .unwrap();
        let settings = validate(raw).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(!settings.use_tls);
        assert_eq!(settings.username, "");
    }

    #[test]
    fn test_numeric_port() {
        let raw = parse_config(
            r#"{"host":"h","port":990,"source_path":"/src","base_url":"https://x"}"#,
        )
        .unwrap();
        assert_eq!(validate(raw).unwrap().port, 990);
    }

    #[test]
    fn test_invalid_port() {
        for port in [r#""abc""#, "0", "70000", "-1"] {
            let text = format!(
                r#"{{"host":"h","port":{},"source_path":"/src","base_url":"https://x"}}"#,
                port
            );
            let raw = parse_config(&text).unwrap();
            assert!(
                matches!(validate(raw), Err(ConfigError::Invalid { key: "port", .. })),
                "port {} should be rejected",
                port
            );
        }
    }

    #[test]
    fn test_missing_host() {
        let raw = parse_config(r#"{"source_path":"/src","base_url":"https://x"}"#).unwrap();
        assert!(matches!(validate(raw), Err(ConfigError::Missing("host"))));
    }

    #[test]
    fn test_blank_base_url_is_missing() {
        let raw = parse_config(r#"{"host":"h","source_path":"/src","base_url":"  "}"#).unwrap();
        assert!(matches!(validate(raw), Err(ConfigError::Missing("base_url"))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let raw = parse_config(
            r#"{"host":"h","source_path":"/src","base_url":"https://x","connect_timeout":0}"#,
        )
        .unwrap();
        assert!(matches!(
            validate(raw),
            Err(ConfigError::Invalid { key: "connect_timeout", .. })
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("FTPSNAP_HOST", "env.example.com"),
            ("FTPSNAP_PORT", "21"),
            ("FTPSNAP_TLS", "no"),
            ("FTPSNAP_PASSWORD", "from-env"),
        ]
        .into_iter()
        .collect();

        let mut raw = parse_config(FULL).unwrap();
        apply_env(&mut raw, |k| env.get(k).map(|v| v.to_string())).unwrap();
        let settings = validate(raw).unwrap();

        assert_eq!(settings.host, "env.example.com");
        assert_eq!(settings.port, 21);
        assert!(!settings.use_tls);
        assert_eq!(settings.password.expose_secret(), "from-env");
        assert_eq!(settings.username, "me");
    }

    #[test]
    fn test_invalid_env_bool() {
        let mut raw = RawConfig::default();
        let result = apply_env(&mut raw, |k| {
            (k == "FTPSNAP_TLS").then(|| "maybe".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid { key: "tls", .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let raw = parse_config(FULL).unwrap();
        let settings = validate(raw).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_load_settings_from_file_and_env() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, FULL).unwrap();

        temp_env::with_var("FTPSNAP_BASE_URL", Some("https://cdn.example.com"), || {
            let settings = load_settings(Some(&config_path)).unwrap();
            assert_eq!(settings.base_url, "https://cdn.example.com");
            assert_eq!(settings.host, "ftp.example.com");
        });
    }

    #[test]
    #[serial]
    fn test_load_settings_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let result = load_settings(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    #[serial]
    fn test_load_settings_invalid_json() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, "{not json").unwrap();
        let result = load_settings(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
