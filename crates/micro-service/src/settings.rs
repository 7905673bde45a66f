//! File and environment settings.
//!
//! [`ServiceSettings`] holds the scalar part of a service configuration so it
//! can come from a TOML file and environment variables. Hooks, cancellation
//! and tracing are code, so they are added to the builder afterwards.
//!
//! Layers, later wins:
//! 1. Built-in defaults
//! 2. TOML file
//! 3. `<PREFIX>_*` environment variables
//!
//! ```toml
//! hostname = "0.0.0.0"
//! port = 8080
//! tls_cert = "/etc/micro/tls.crt"
//! tls_key = "/etc/micro/tls.key"
//! shutdown_timeout_secs = 10
//! handle_signals = true
//! log_level = "info,micro_server=debug"
//! log_format = "json"
//! ```

use std::path::{Path, PathBuf};

use micro_telemetry::{LogConfig, LogFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfigBuilder;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML was malformed or contained unknown keys.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable held a value of the wrong type.
    #[error("invalid value for environment variable {var}: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },
}

/// Scalar service settings. Unset fields keep the builder defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSettings {
    /// Hostname to bind.
    pub hostname: Option<String>,
    /// Port to bind; zero or negative means ephemeral.
    pub port: Option<i32>,
    /// PEM certificate chain.
    pub tls_cert: Option<PathBuf>,
    /// PEM private key.
    pub tls_key: Option<PathBuf>,
    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_secs: Option<i64>,
    /// Stop on OS termination signals.
    pub handle_signals: Option<bool>,
    /// `EnvFilter` directive.
    pub log_level: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
}

impl ServiceSettings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `<PREFIX>_*` overrides from the process environment.
    pub fn apply_env(self, prefix: &str) -> Result<Self, SettingsError> {
        self.apply_env_from(prefix, |var| std::env::var(var).ok())
    }

    /// Applies `<PREFIX>_*` overrides read through `lookup`.
    ///
    /// Recognized suffixes: `HOSTNAME`, `PORT`, `TLS_CERT`, `TLS_KEY`,
    /// `SHUTDOWN_TIMEOUT`, `SIGNALS`, `LOG_LEVEL`, `LOG_FORMAT`.
    pub fn apply_env_from(
        mut self,
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let prefix = prefix.to_uppercase();
        let var = |suffix: &str| format!("{prefix}_{suffix}");
        let get = |suffix: &str| lookup(&var(suffix)).map(|v| (var(suffix), v));

        if let Some((_, value)) = get("HOSTNAME") {
            self.hostname = Some(value);
        }
        if let Some((name, value)) = get("PORT") {
            self.port = Some(
                value
                    .trim()
                    .parse()
                    .map_err(|_| env_error(name, "expected integer"))?,
            );
        }
        if let Some((_, value)) = get("TLS_CERT") {
            self.tls_cert = Some(PathBuf::from(value));
        }
        if let Some((_, value)) = get("TLS_KEY") {
            self.tls_key = Some(PathBuf::from(value));
        }
        if let Some((name, value)) = get("SHUTDOWN_TIMEOUT") {
            self.shutdown_timeout_secs = Some(
                value
                    .trim()
                    .parse()
                    .map_err(|_| env_error(name, "expected seconds"))?,
            );
        }
        if let Some((name, value)) = get("SIGNALS") {
            self.handle_signals =
                Some(parse_bool(&value).ok_or_else(|| env_error(name, "expected boolean"))?);
        }
        if let Some((_, value)) = get("LOG_LEVEL") {
            self.log_level = Some(value);
        }
        if let Some((name, value)) = get("LOG_FORMAT") {
            self.log_format = Some(match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(env_error(name, "expected 'json' or 'pretty'")),
            });
        }
        Ok(self)
    }

    /// Logging configuration: production defaults with the level and format applied.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::production();
        if let Some(level) = &self.log_level {
            config = config.with_level(level.clone());
        }
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        config
    }

    /// Starts a configuration builder from these settings.
    #[must_use]
    pub fn into_builder(self) -> ServiceConfigBuilder {
        let mut builder = ServiceConfigBuilder::new();
        if let Some(hostname) = self.hostname {
            builder = builder.hostname(hostname);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(cert) = self.tls_cert {
            builder = builder.certificate_path(cert);
        }
        if let Some(key) = self.tls_key {
            builder = builder.key_path(key);
        }
        if let Some(secs) = self.shutdown_timeout_secs {
            builder = builder.shutdown_timeout_secs(secs);
        }
        if let Some(enabled) = self.handle_signals {
            builder = builder.handle_signals(enabled);
        }
        builder
    }
}

fn env_error(var: String, reason: &str) -> SettingsError {
    SettingsError::Env {
        var,
        reason: reason.to_string(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_toml() {
        let settings = ServiceSettings::from_toml_str(
            r#"
            hostname = "0.0.0.0"
            port = 8080
            shutdown_timeout_secs = 10
            handle_signals = true
            log_format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(settings.hostname.as_deref(), Some("0.0.0.0"));
        assert_eq!(settings.port, Some(8080));
        assert_eq!(settings.shutdown_timeout_secs, Some(10));
        assert_eq!(settings.handle_signals, Some(true));
        assert_eq!(settings.log_format, Some(LogFormat::Pretty));
        assert!(settings.tls_cert.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = ServiceSettings::from_toml_str("listen = \"0.0.0.0\"");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9443").unwrap();

        let settings = ServiceSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.port, Some(9443));

        let missing = ServiceSettings::from_file("/nonexistent/micro.toml");
        assert!(matches!(missing, Err(SettingsError::Read { .. })));
    }

    #[test]
    fn test_env_overrides_file() {
        let settings = ServiceSettings::from_toml_str("port = 8080\nhostname = \"file\"")
            .unwrap()
            .apply_env_from(
                "greeter",
                env(&[
                    ("GREETER_PORT", "9090"),
                    ("GREETER_SIGNALS", "yes"),
                    ("GREETER_LOG_LEVEL", "debug"),
                    ("OTHER_PORT", "1"),
                ]),
            )
            .unwrap();

        assert_eq!(settings.hostname.as_deref(), Some("file"));
        assert_eq!(settings.port, Some(9090));
        assert_eq!(settings.handle_signals, Some(true));
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_env_type_errors() {
        let err = ServiceSettings::default()
            .apply_env_from("APP", env(&[("APP_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));

        let err = ServiceSettings::default()
            .apply_env_from("APP", env(&[("APP_SIGNALS", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Env { .. }));

        let err = ServiceSettings::default()
            .apply_env_from("APP", env(&[("APP_LOG_FORMAT", "xml")]))
            .unwrap_err();
        assert!(err.to_string().contains("APP_LOG_FORMAT"));
    }

    #[test]
    fn test_into_builder() {
        let settings = ServiceSettings {
            hostname: Some("127.0.0.1".to_string()),
            port: Some(-1),
            shutdown_timeout_secs: Some(2),
            handle_signals: Some(true),
            ..ServiceSettings::default()
        };

        let config = settings.into_builder().build().unwrap();
        assert_eq!(config.server().bind_addr(), "127.0.0.1:0");
        assert_eq!(config.server().shutdown_timeout(), Duration::from_secs(2));
        assert!(config.handle_signals());
    }

    #[test]
    fn test_half_tls_from_env_fails_on_build() {
        let settings = ServiceSettings::default()
            .apply_env_from("APP", env(&[("APP_TLS_CERT", "/etc/tls.crt")]))
            .unwrap();
        assert!(settings.into_builder().build().is_err());
    }

    #[test]
    fn test_log_config() {
        let settings = ServiceSettings {
            log_level: Some("warn".to_string()),
            log_format: Some(LogFormat::Pretty),
            ..ServiceSettings::default()
        };
        let config = settings.log_config();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);

        assert_eq!(ServiceSettings::default().log_config(), LogConfig::production());
    }
}
