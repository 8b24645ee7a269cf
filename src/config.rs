//! Configuration loader and validator for the scan station.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub api: Api,
    pub station: Station,
}

/// Scan endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub endpoint: String,
    pub user_agent: String,
    /// Permit plain `http://` endpoints, for bench testing against a local server.
    #[serde(default)]
    pub allow_insecure: bool,
    /// Request timeout; the transport default applies when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Operator-facing station settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    pub success_notice_ms: u64,
    #[serde(default = "default_beep")]
    pub beep: bool,
}

fn default_beep() -> bool {
    true
}

impl Api {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.endpoint.trim())
            .map_err(|_| ConfigError::Invalid("api.endpoint must be a valid URL"))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Station {
    pub fn success_notice(&self) -> Duration {
        Duration::from_millis(self.success_notice_ms)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("api.endpoint must be non-empty"));
    }
    let url = cfg.api.endpoint_url()?;
    match url.scheme() {
        "https" => {}
        "http" if cfg.api.allow_insecure => {}
        "http" => {
            return Err(ConfigError::Invalid(
                "api.endpoint must use https unless api.allow_insecure is set",
            ))
        }
        _ => return Err(ConfigError::Invalid("api.endpoint must be an http(s) URL")),
    }
    if cfg.api.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("api.user_agent must be non-empty"));
    }
    if cfg.api.timeout_secs == Some(0) {
        return Err(ConfigError::Invalid("api.timeout_secs must be > 0 when set"));
    }

    if cfg.station.success_notice_ms == 0 {
        return Err(ConfigError::Invalid("station.success_notice_ms must be > 0"));
    }

    Ok(())
}

/// Returns the example YAML content printed by `--print-config`.
pub fn example() -> &'static str {
    r#"api:
  endpoint: "https://api.hexagonasia.com/newcommon/fabricator/scan"
  user_agent: "fabricator-scanner/0.1"
  # Allow http:// endpoints (local bench server only).
  allow_insecure: false
  # Seconds; leave unset to use the HTTP client's default.
  timeout_secs: null

station:
  # How long success notices stay on screen. Failures stay until dismissed.
  success_notice_ms: 2000
  beep: true
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.api.timeout(), None);
        assert_eq!(cfg.station.success_notice(), Duration::from_millis(2000));
        assert!(cfg.station.beep);
    }

    #[test]
    fn invalid_endpoint() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.endpoint = " ".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("api.endpoint")), _ => panic!("wrong error") }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.endpoint = "not a url".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.endpoint = "ftp://example.com/scan".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn plain_http_needs_opt_in() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.endpoint = "http://192.168.1.22:5000/newcommon/fabricator/scan".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("allow_insecure")), _ => panic!("wrong error") }

        cfg.api.allow_insecure = true;
        validate(&cfg).unwrap();
    }

    #[test]
    fn invalid_station_and_timeouts() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.station.success_notice_ms = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.timeout_secs = Some(0);
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.api.user_agent = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn optional_keys_default() {
        let yaml = r#"api:
  endpoint: "https://example.com/scan"
  user_agent: "ua"
station:
  success_notice_ms: 1500
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert!(!cfg.api.allow_insecure);
        assert_eq!(cfg.api.timeout_secs, None);
        assert!(cfg.station.beep);
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.api.user_agent, "fabricator-scanner/0.1");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
