//! Layered monitor configuration.
//!
//! Values are resolved lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. an optional config file (`--config monitor.toml`)
//! 3. environment variables prefixed `REPLICA_DOCTOR_`, with `__` between
//!    nested keys (`REPLICA_DOCTOR_TARGET__PASSWORD`) and semicolon-separated
//!    `REPLICA_DOCTOR_ERROR_PATTERNS` (commas stay inside the pattern, as in
//!    `\d{1,3}`)
//! 4. command line flags
//!
//! ```toml
//! interval = "5s"
//! error_patterns = ["Coordinator stopped", "Error_code: 1062"]
//! recovery_statement = "CALL mysql.rds_skip_repl_error;"
//!
//! [target]
//! host = "replica-1.example.com"
//! user = "monitor"
//! password = "secret"
//! ```
//!
//! Everything is validated once, at startup: a malformed error pattern or an
//! unparseable interval stops the process before the first poll.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::data::{ErrorMatcher, Thresholds, DEFAULT_ERROR_PATTERNS};
use crate::status::mysql::DEFAULT_RECOVERY_STATEMENT;
use crate::status::MySqlReplica;

const ENV_PREFIX: &str = "REPLICA_DOCTOR";

/// Raw settings as read from all layers, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub target: TargetSettings,
    pub interval: String,
    pub query_timeout: String,
    pub error_patterns: Vec<String>,
    pub recovery_statement: String,
    pub lag_warning_secs: u64,
    pub lag_critical_secs: u64,
}

/// Connection settings for the monitored replica.
#[derive(Clone, Deserialize)]
pub struct TargetSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for TargetSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Command line values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub interval: Option<String>,
    pub error_patterns: Vec<String>,
    pub lag_warning_secs: Option<u64>,
    pub lag_critical_secs: Option<u64>,
}

/// Validated configuration consumed by the monitor.
#[derive(Clone)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub interval: Duration,
    pub query_timeout: Duration,
    pub matcher: ErrorMatcher,
    pub recovery_statement: String,
    pub thresholds: Thresholds,
}

impl MonitorConfig {
    /// Resolve all layers and validate the result.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(file, overrides, None)
    }

    /// Like [`MonitorConfig::load`], reading environment variables from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        file: Option<&Path>,
        overrides: &Overrides,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("target.host", "")?
            .set_default("target.port", 3306_i64)?
            .set_default("target.user", "")?
            .set_default("target.password", "")?
            .set_default("interval", "5s")?
            .set_default("query_timeout", "10s")?
            .set_default("error_patterns", DEFAULT_ERROR_PATTERNS.to_vec())?
            .set_default("recovery_statement", DEFAULT_RECOVERY_STATEMENT)?
            .set_default("lag_warning_secs", 60_i64)?
            .set_default("lag_critical_secs", 600_i64)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(";")
                .with_list_parse_key("error_patterns")
                .try_parsing(true)
                .source(env),
        );

        builder = builder
            .set_override_option("target.host", overrides.host.clone())?
            .set_override_option("target.port", overrides.port.map(i64::from))?
            .set_override_option("target.user", overrides.user.clone())?
            .set_override_option("target.password", overrides.password.clone())?
            .set_override_option("interval", overrides.interval.clone())?
            .set_override_option("lag_warning_secs", overrides.lag_warning_secs.map(to_i64))?
            .set_override_option("lag_critical_secs", overrides.lag_critical_secs.map(to_i64))?;
        if !overrides.error_patterns.is_empty() {
            builder = builder.set_override("error_patterns", overrides.error_patterns.clone())?;
        }

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        Self::from_settings(settings)
    }

    /// Validate raw settings.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let Settings {
            target,
            interval,
            query_timeout,
            error_patterns,
            recovery_statement,
            lag_warning_secs,
            lag_critical_secs,
        } = settings;

        if target.host.trim().is_empty() {
            bail!("A replica host is required (--host or target.host)");
        }
        if target.user.trim().is_empty() {
            bail!("A user name is required (--user or target.user)");
        }
        if target.password.is_empty() {
            bail!("A password is required (--password or target.password)");
        }

        let interval = positive_duration("interval", &interval)?;
        let query_timeout = positive_duration("query_timeout", &query_timeout)?;

        if error_patterns.is_empty() {
            bail!("At least one error pattern is required");
        }
        let matcher = ErrorMatcher::new(&error_patterns).context("Invalid error pattern")?;

        if recovery_statement.trim().is_empty() {
            bail!("recovery_statement must not be empty");
        }
        if lag_warning_secs > lag_critical_secs {
            bail!(
                "lag_warning_secs ({}) must not exceed lag_critical_secs ({})",
                lag_warning_secs,
                lag_critical_secs
            );
        }

        Ok(Self {
            host: target.host.trim().to_string(),
            port: target.port,
            user: target.user.trim().to_string(),
            password: target.password,
            interval,
            query_timeout,
            matcher,
            recovery_statement,
            thresholds: Thresholds {
                lag_warning: lag_warning_secs,
                lag_critical: lag_critical_secs,
            },
        })
    }

    /// `host:port` of the monitored replica.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the replica handle for this configuration.
    pub fn replica(&self) -> MySqlReplica {
        MySqlReplica::builder()
            .host(self.host.clone())
            .port(self.port)
            .credentials(self.user.clone(), self.password.clone())
            .recovery_statement(self.recovery_statement.clone())
            .timeout(self.query_timeout)
            .build()
    }
}

impl std::fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("target", &self.target())
            .field("user", &self.user)
            .field("interval", &self.interval)
            .field("query_timeout", &self.query_timeout)
            .field("error_patterns", &self.matcher.patterns().collect::<Vec<_>>())
            .field("recovery_statement", &self.recovery_statement)
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

fn positive_duration(key: &str, raw: &str) -> Result<Duration> {
    let duration = parse_duration(raw).with_context(|| format!("Invalid {} '{}'", key, raw))?;
    if duration.is_zero() {
        bail!("{} must be greater than zero", key);
    }
    Ok(duration)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn credentials() -> Overrides {
        Overrides {
            host: Some("replica.internal".into()),
            user: Some("monitor".into()),
            password: Some("secret".into()),
            ..Default::default()
        }
    }

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::load_with_env(None, &credentials(), no_env()).unwrap();

        assert_eq!(config.target(), "replica.internal:3306");
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.query_timeout, Duration::from_secs(10));
        assert_eq!(config.matcher.patterns().collect::<Vec<_>>(), vec!["Coordinator stopped"]);
        assert_eq!(config.recovery_statement, "CALL mysql.rds_skip_repl_error;");
        assert_eq!(config.thresholds.lag_warning, 60);
        assert_eq!(config.thresholds.lag_critical, 600);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = MonitorConfig::load_with_env(None, &Overrides::default(), no_env()).unwrap_err();
        assert!(err.to_string().contains("host"));

        let overrides = Overrides {
            password: None,
            ..credentials()
        };
        assert!(MonitorConfig::load_with_env(None, &overrides, no_env()).is_err());
    }

    #[test]
    fn test_file_then_env_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
interval = "30s"
error_patterns = ["Coordinator stopped", "Error_code: 1062"]

[target]
host = "from-file"
port = 3307
user = "file-user"
password = "file-pass"
"#
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert("REPLICA_DOCTOR_TARGET__USER".to_string(), "env-user".to_string());
        env.insert("REPLICA_DOCTOR_QUERY_TIMEOUT".to_string(), "2s".to_string());

        let overrides = Overrides {
            host: Some("from-flag".into()),
            ..Default::default()
        };
        let config = MonitorConfig::load_with_env(Some(file.path()), &overrides, Some(env)).unwrap();

        assert_eq!(config.host, "from-flag");
        assert_eq!(config.port, 3307);
        assert_eq!(config.user, "env-user");
        assert_eq!(config.password, "file-pass");
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.query_timeout, Duration::from_secs(2));
        assert_eq!(config.matcher.patterns().count(), 2);
    }

    #[test]
    fn test_env_pattern_list() {
        let mut env = HashMap::new();
        env.insert(
            "REPLICA_DOCTOR_ERROR_PATTERNS".to_string(),
            "Coordinator stopped;Duplicate entry".to_string(),
        );
        let config = MonitorConfig::load_with_env(None, &credentials(), Some(env)).unwrap();
        assert_eq!(
            config.matcher.patterns().collect::<Vec<_>>(),
            vec!["Coordinator stopped", "Duplicate entry"]
        );
    }

    #[test]
    fn test_env_pattern_keeps_quantifier_commas() {
        let mut env = HashMap::new();
        env.insert(
            "REPLICA_DOCTOR_ERROR_PATTERNS".to_string(),
            r"Error_code: 10\d{1,2};Coordinator stopped".to_string(),
        );
        let config = MonitorConfig::load_with_env(None, &credentials(), Some(env)).unwrap();
        assert_eq!(
            config.matcher.patterns().collect::<Vec<_>>(),
            vec![r"Error_code: 10\d{1,2}", "Coordinator stopped"]
        );
        assert_eq!(
            config.matcher.first_match(Some("Could not execute event; Error_code: 1062")),
            Some(r"Error_code: 10\d{1,2}")
        );
    }

    #[test]
    fn test_flag_patterns_replace_defaults() {
        let overrides = Overrides {
            error_patterns: vec!["Error_code: 1032".into()],
            ..credentials()
        };
        let config = MonitorConfig::load_with_env(None, &overrides, no_env()).unwrap();
        assert_eq!(config.matcher.patterns().collect::<Vec<_>>(), vec!["Error_code: 1032"]);
    }

    #[test]
    fn test_malformed_pattern_fails_fast() {
        let overrides = Overrides {
            error_patterns: vec!["Coordinator (stopped".into()],
            ..credentials()
        };
        let err = MonitorConfig::load_with_env(None, &overrides, no_env()).unwrap_err();
        assert!(err.to_string().contains("Invalid error pattern"));
    }

    #[test]
    fn test_bad_interval_rejected() {
        for interval in ["0s", "soon"] {
            let overrides = Overrides {
                interval: Some(interval.into()),
                ..credentials()
            };
            assert!(
                MonitorConfig::load_with_env(None, &overrides, no_env()).is_err(),
                "interval {:?}",
                interval
            );
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = MonitorConfig::load_with_env(None, &credentials(), no_env()).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("replica.internal:3306"));
    }
}
