//! Planner configuration loaded from TOML.
//!
//! ```toml
//! transaction_mutation_limit = 20000
//! scan_limit = 100000
//! debug = false
//! database = "projects/acme/instances/main/databases/orders"
//! ```

use crate::error::{ErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    path::Path,
    str::FromStr,
};
use thiserror::Error as ThisError;

/// Per-transaction mutation cap used when none is configured.
pub const DEFAULT_TRANSACTION_MUTATION_LIMIT: u64 = 20_000;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be at least 1")]
    NotPositive { field: &'static str },

    #[error(
        "database name '{0}' must look like projects/<project>/instances/<instance>/databases/<database>"
    )]
    InvalidDatabaseName(String),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::invalid_argument(ErrorOrigin::Config, err.to_string())
    }
}

///
/// PlannerConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Hard per-transaction mutation cap of the target store.
    pub transaction_mutation_limit: u64,

    /// Rows read per scan page; unbounded when absent.
    pub scan_limit: Option<u64>,

    pub debug: bool,

    pub database: Option<DatabaseName>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            transaction_mutation_limit: DEFAULT_TRANSACTION_MUTATION_LIMIT,
            scan_limit: None,
            debug: false,
            database: None,
        }
    }
}

impl PlannerConfig {
    #[must_use]
    pub const fn with_transaction_mutation_limit(mut self, limit: u64) -> Self {
        self.transaction_mutation_limit = limit;
        self
    }

    #[must_use]
    pub const fn with_scan_limit(mut self, scan_limit: Option<u64>) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.transaction_mutation_limit == 0 {
            return Err(ConfigError::NotPositive {
                field: "transaction_mutation_limit",
            });
        }
        if matches!(self.scan_limit, Some(0)) {
            return Err(ConfigError::NotPositive {
                field: "scan_limit",
            });
        }

        Ok(())
    }
}

///
/// DatabaseName
///
/// Fully qualified database name:
/// `projects/<project>/instances/<instance>/databases/<database>`.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseName {
    project: String,
    instance: String,
    database: String,
}

impl DatabaseName {
    /// `projects/<project>/instances/<instance>`.
    #[must_use]
    pub fn parent(&self) -> String {
        format!("projects/{}/instances/{}", self.project, self.instance)
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance
    }

    #[must_use]
    pub fn database_id(&self) -> &str {
        &self.database
    }
}

impl FromStr for DatabaseName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidDatabaseName(s.to_string());
        let parts: Vec<&str> = s.split('/').collect();

        match parts.as_slice() {
            ["projects", project, "instances", instance, "databases", database]
                if [project, instance, database].iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self {
                    project: (*project).to_string(),
                    instance: (*instance).to_string(),
                    database: (*database).to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatabaseName> for String {
    fn from(name: DatabaseName) -> Self {
        name.to_string()
    }
}

impl Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/databases/{}", self.parent(), self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    #[test]
    fn defaults_apply_to_an_empty_document() {
        let config = PlannerConfig::from_toml_str("").unwrap();

        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.transaction_mutation_limit, 20_000);
        assert_eq!(config.scan_limit, None);
    }

    #[test]
    fn full_document_parses() {
        let config = PlannerConfig::from_toml_str(
            r#"
            transaction_mutation_limit = 80000
            scan_limit = 500
            debug = true
            database = "projects/acme/instances/main/databases/orders"
            "#,
        )
        .unwrap();

        assert_eq!(config.transaction_mutation_limit, 80_000);
        assert_eq!(config.scan_limit, Some(500));
        assert!(config.debug);

        let database = config.database.expect("database name");
        assert_eq!(database.parent(), "projects/acme/instances/main");
        assert_eq!(database.project_id(), "acme");
        assert_eq!(database.instance_id(), "main");
        assert_eq!(database.database_id(), "orders");
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = PlannerConfig::from_toml_str("transaction_mutation_limit = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotPositive {
                field: "transaction_mutation_limit"
            }
        ));

        let err = PlannerConfig::from_toml_str("scan_limit = 0").unwrap_err();
        assert!(err.to_string().contains("scan_limit"));
    }

    #[test]
    fn unknown_keys_and_bad_names_are_rejected() {
        assert!(matches!(
            PlannerConfig::from_toml_str("batch = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(PlannerConfig::from_toml_str(r#"database = "projects/p/instances/i""#).is_err());
    }

    #[test]
    fn database_names_validate_every_segment() {
        for bad in [
            "",
            "projects//instances/i/databases/d",
            "projects/p/instances/i/databases/d/extra",
            "project/p/instances/i/databases/d",
        ] {
            assert!(bad.parse::<DatabaseName>().is_err(), "{bad} should fail");
        }

        let name: DatabaseName = "projects/p/instances/i/databases/d".parse().unwrap();
        assert_eq!(name.to_string(), "projects/p/instances/i/databases/d");
    }

    #[test]
    fn config_errors_become_invalid_argument() {
        let err: InternalError = ConfigError::NotPositive {
            field: "scan_limit",
        }
        .into();

        assert_eq!(err.class, ErrorClass::InvalidArgument);
        assert_eq!(err.origin, ErrorOrigin::Config);
    }

    #[test]
    fn missing_files_report_their_path() {
        let err = PlannerConfig::from_path("/definitely/not/here.toml").unwrap_err();

        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
