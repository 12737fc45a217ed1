//! Runtime configuration.
//!
//! Loaded from the environment (`from_env`) or from a JSON document
//! (`from_json_str`). Unset variables fall back to defaults with a warning;
//! malformed values are errors.
//!
//! | variable | default |
//! |----------|---------|
//! | `GATEHOUSE_NEW_ACCOUNT_WINDOW_SECS` | `60` |
//! | `GATEHOUSE_MARKER_PATH` | unset (in-memory marker store) |
//! | `GATEHOUSE_ADMIN_PAGES` | `/ia,/configuracoes,/admin,/onboarding` |
//! | `GATEHOUSE_LOG_FORMAT` | `json` |
//! | `DATABASE_URL` | unset (in-memory stores) |

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_auth::{DEFAULT_NEW_ACCOUNT_WINDOW_SECS, RoutePolicy};
use gatehouse_observability::{LogFormat, ObservabilityConfig};

pub const NEW_ACCOUNT_WINDOW_VAR: &str = "GATEHOUSE_NEW_ACCOUNT_WINDOW_SECS";
pub const MARKER_PATH_VAR: &str = "GATEHOUSE_MARKER_PATH";
pub const ADMIN_PAGES_VAR: &str = "GATEHOUSE_ADMIN_PAGES";
pub const LOG_FORMAT_VAR: &str = "GATEHOUSE_LOG_FORMAT";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("invalid configuration document: {0}")]
    Document(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatehouseConfig {
    /// Accounts younger than this are routed to first-run onboarding.
    pub new_account_window_secs: i64,
    /// JSON file holding the pending-role marker.
    pub marker_path: Option<PathBuf>,
    pub routes: RoutePolicy,
    pub observability: ObservabilityConfig,
    pub database_url: Option<String>,
}

impl Default for GatehouseConfig {
    fn default() -> Self {
        Self {
            new_account_window_secs: DEFAULT_NEW_ACCOUNT_WINDOW_SECS,
            marker_path: None,
            routes: RoutePolicy::default(),
            observability: ObservabilityConfig::default(),
            database_url: None,
        }
    }
}

impl GatehouseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match lookup(NEW_ACCOUNT_WINDOW_VAR) {
            Some(raw) => config.new_account_window_secs = parse_window(&raw)?,
            None => tracing::warn!(
                "{NEW_ACCOUNT_WINDOW_VAR} not set; using {DEFAULT_NEW_ACCOUNT_WINDOW_SECS}s"
            ),
        }

        config.marker_path = lookup(MARKER_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if config.marker_path.is_none() {
            tracing::warn!("{MARKER_PATH_VAR} not set; pending roles will not survive a restart");
        }

        if let Some(raw) = lookup(ADMIN_PAGES_VAR) {
            config.routes.admin_prefixes = parse_prefixes(&raw)?;
        }

        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            config.observability.format = raw.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                var: LOG_FORMAT_VAR,
                reason: e.to_string(),
            })?;
        }

        config.database_url = lookup(DATABASE_URL_VAR).filter(|u| !u.trim().is_empty());
        if config.database_url.is_none() {
            tracing::warn!("{DATABASE_URL_VAR} not set; using in-memory stores");
        }

        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Document(e.to_string()))?;
        if config.new_account_window_secs < 0 {
            return Err(ConfigError::Invalid {
                var: "new_account_window_secs",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(config)
    }

    pub fn new_account_window(&self) -> Duration {
        Duration::seconds(self.new_account_window_secs)
    }
}

fn parse_window(raw: &str) -> Result<i64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: NEW_ACCOUNT_WINDOW_VAR,
        reason,
    };
    let secs: i64 = raw.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    if secs < 0 {
        return Err(invalid("must not be negative".to_string()));
    }
    Ok(secs)
}

fn parse_prefixes(raw: &str) -> Result<Vec<String>, ConfigError> {
    let prefixes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
        return Err(ConfigError::Invalid {
            var: ADMIN_PAGES_VAR,
            reason: format!("'{bad}' is not an absolute path"),
        });
    }
    Ok(prefixes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = GatehouseConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, GatehouseConfig::default());
        assert_eq!(config.new_account_window(), Duration::seconds(60));
    }

    #[test]
    fn reads_every_variable() {
        let config = GatehouseConfig::from_lookup(lookup(&[
            (NEW_ACCOUNT_WINDOW_VAR, "120"),
            (MARKER_PATH_VAR, "/var/lib/gatehouse/pending_role.json"),
            (ADMIN_PAGES_VAR, "/ia, /relatorios ,"),
            (LOG_FORMAT_VAR, "pretty"),
            (DATABASE_URL_VAR, "postgres://localhost/gatehouse"),
        ]))
        .unwrap();

        assert_eq!(config.new_account_window_secs, 120);
        assert_eq!(config.marker_path, Some(PathBuf::from("/var/lib/gatehouse/pending_role.json")));
        assert_eq!(config.routes.admin_prefixes, vec!["/ia".to_string(), "/relatorios".to_string()]);
        assert_eq!(config.observability.format, LogFormat::Pretty);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/gatehouse"));
    }

    #[test]
    fn malformed_values_are_errors() {
        for (var, value) in [
            (NEW_ACCOUNT_WINDOW_VAR, "sixty"),
            (NEW_ACCOUNT_WINDOW_VAR, "-1"),
            (ADMIN_PAGES_VAR, "ia"),
            (LOG_FORMAT_VAR, "xml"),
        ] {
            let err = GatehouseConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: v, .. } if v == var), "{var}={value}");
        }
    }

    #[test]
    fn json_document_keeps_defaults_for_missing_fields() {
        let config = GatehouseConfig::from_json_str(
            r#"{"new_account_window_secs": 30, "routes": {"fallback": "/inicio"}}"#,
        )
        .unwrap();
        assert_eq!(config.new_account_window_secs, 30);
        assert_eq!(config.routes.fallback, "/inicio");
        assert_eq!(config.routes.login, "/login");
        assert!(GatehouseConfig::from_json_str("{").is_err());
    }
}
