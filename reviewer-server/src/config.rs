//! Service configuration
//!
//! Read from an optional YAML file, then overridden by environment
//! variables:
//!
//! | variable | field |
//! |----------|-------|
//! | `LOG_LEVEL` | `log_level` |
//! | `PR_REVIEWER_ADDRESS` | `http.address` |
//! | `PR_REVIEWER_TIMEOUT` | `http.timeout` |
//! | `DATABASE_URL` | `database_url` |
//!
//! Timeouts accept Go-style durations (`500ms`, `1m30s`) or bare seconds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value '{value}' for {field}: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid value '{value}' for {var}: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// `host:port`; the host may be a name, resolved at bind time
    pub address: String,
    /// Per-request timeout, also used as the shutdown grace period
    #[serde(with = "duration_text", alias = "timeout_secs")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8080".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewerConfig {
    /// DEBUG, INFO, WARN or ERROR
    pub log_level: String,
    pub http: HttpConfig,
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            http: HttpConfig::default(),
            database_url: "postgres://localhost/pr_reviewer".to_string(),
            max_connections: 5,
        }
    }
}

impl ReviewerConfig {
    /// Load the file (if it exists) and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse the YAML file, or return defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        check_address(&config.http.address).map_err(|reason| ConfigError::Invalid {
            field: "http.address",
            value: config.http.address.clone(),
            reason,
        })?;
        check_timeout(config.http.timeout).map_err(|reason| ConfigError::Invalid {
            field: "http.timeout",
            value: duration_text::format(config.http.timeout),
            reason,
        })?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(value) = lookup("PR_REVIEWER_ADDRESS") {
            check_address(&value).map_err(|reason| ConfigError::Env {
                var: "PR_REVIEWER_ADDRESS",
                value: value.clone(),
                reason,
            })?;
            self.http.address = value;
        }

        if let Some(value) = lookup("PR_REVIEWER_TIMEOUT") {
            self.http.timeout = parse_duration(&value)
                .and_then(|timeout| check_timeout(timeout).map(|()| timeout))
                .map_err(|reason| ConfigError::Env {
                    var: "PR_REVIEWER_TIMEOUT",
                    value: value.clone(),
                    reason,
                })?;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }

        Ok(())
    }
}

/// Check `host:port` shape without resolving the host.
pub fn check_address(address: &str) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| "expected host:port".to_string())?;

    if host.is_empty() {
        return Err("missing host".to_string());
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|e| format!("invalid port '{port}': {e}"))
}

fn check_timeout(timeout: Duration) -> Result<(), String> {
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(())
}

/// Parse a Go-style duration (`300ms`, `1.5s`, `1m30s`, `2h`) or bare
/// seconds (`10`).
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total_nanos: u128 = 0;
    let mut rest = text;

    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        let number = &rest[..number_len];
        rest = &rest[number_len..];

        let unit_len = rest.find(is_number).unwrap_or(rest.len());
        let unit_nanos: u64 = match &rest[..unit_len] {
            "h" => 3_600_000_000_000,
            "m" => 60_000_000_000,
            "s" => 1_000_000_000,
            "ms" => 1_000_000,
            "us" | "µs" => 1_000,
            "ns" => 1,
            "" => return Err(format!("missing unit after '{number}'")),
            other => return Err(format!("unknown unit '{other}'")),
        };
        rest = &rest[unit_len..];

        let nanos = if let Ok(whole) = number.parse::<u64>() {
            u128::from(whole) * u128::from(unit_nanos)
        } else {
            let value: f64 = number
                .parse()
                .map_err(|_| format!("invalid number '{number}'"))?;
            (value * unit_nanos as f64).round() as u128
        };
        total_nanos += nanos;
    }

    u64::try_from(total_nanos)
        .map(Duration::from_nanos)
        .map_err(|_| "duration too large".to_string())
}

/// Serde adapter: durations are written as text and read as text or
/// integer seconds.
mod duration_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(duration: Duration) -> String {
        if duration.subsec_nanos() == 0 {
            format!("{}s", duration.as_secs())
        } else {
            format!("{}ms", duration.as_millis())
        }
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => super::parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}
