//! Configuration types for the seeding binary.
//!
//! All configuration is loaded from environment variables. The binary needs
//! to know which store to seed, how to reach it, and optionally which
//! fixture format to assume.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use polluter::{Parser, PoolConfig};

use crate::error::SeedError;

/// Complete seeding configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Which store to seed.
    pub engine: EngineKind,
    /// Connection URL of the store.
    pub url: String,
    /// Database name; required for `MongoDB`, ignored otherwise.
    pub database: Option<String>,
    /// Fixture format forced for every input. `None` infers it per file.
    pub format: Option<Parser>,
    /// Maximum SQL pool connections.
    pub max_connections: u32,
    /// SQL pool acquire timeout.
    pub connect_timeout: Duration,
}

/// Supported stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// MySQL, positional placeholders.
    MySql,
    /// `PostgreSQL`, numbered placeholders.
    Postgres,
    /// Redis, one key per top-level entry.
    Redis,
    /// `MongoDB`, one collection per top-level array.
    Mongo,
}

impl FromStr for EngineKind {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            other => Err(SeedError::Config(format!("unknown engine: {other}"))),
        }
    }
}

impl SeedConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `POLLUTER_ENGINE` -- `mysql`, `postgres`, `redis` or `mongo`
    /// - `POLLUTER_URL` -- connection URL of the store
    /// - `POLLUTER_DATABASE` -- database name (`mongo` only)
    ///
    /// Optional variables:
    /// - `POLLUTER_FORMAT` -- `json` or `yaml`; inferred per file when unset
    /// - `POLLUTER_MAX_CONNECTIONS` -- SQL pool size (default 5)
    /// - `POLLUTER_CONNECT_TIMEOUT_MS` -- SQL acquire timeout in milliseconds (default 5000)
    pub fn from_env() -> Result<Self, SeedError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SeedError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| SeedError::Config(format!("missing required env var {name}")))
        };

        let engine: EngineKind = required("POLLUTER_ENGINE")?.parse()?;
        let url = required("POLLUTER_URL")?;
        let database = match engine {
            EngineKind::Mongo => Some(required("POLLUTER_DATABASE")?),
            _ => lookup("POLLUTER_DATABASE"),
        };

        let format = lookup("POLLUTER_FORMAT")
            .map(|value| {
                Parser::from_extension(&value)
                    .ok_or_else(|| SeedError::Config(format!("invalid POLLUTER_FORMAT: {value}")))
            })
            .transpose()?;

        let max_connections: u32 = lookup("POLLUTER_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_owned())
            .parse()
            .map_err(|e| SeedError::Config(format!("invalid POLLUTER_MAX_CONNECTIONS: {e}")))?;

        let connect_timeout_ms: u64 = lookup("POLLUTER_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_owned())
            .parse()
            .map_err(|e| SeedError::Config(format!("invalid POLLUTER_CONNECT_TIMEOUT_MS: {e}")))?;

        Ok(Self {
            engine,
            url,
            database,
            format,
            max_connections,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
        })
    }

    /// SQL pool settings derived from this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(&self.url)
            .with_max_connections(self.max_connections)
            .with_connect_timeout(self.connect_timeout)
    }

    /// Parser for `input`: the forced format, else the file extension,
    /// else YAML.
    pub fn parser_for(&self, input: &str) -> Parser {
        self.format
            .or_else(|| {
                Path::new(input)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(Parser::from_extension)
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SeedConfig, SeedError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        SeedConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn engine_kind_parsing() {
        assert_eq!("MySQL".parse::<EngineKind>().unwrap(), EngineKind::MySql);
        assert_eq!("postgresql".parse::<EngineKind>().unwrap(), EngineKind::Postgres);
        assert_eq!("redis".parse::<EngineKind>().unwrap(), EngineKind::Redis);
        assert_eq!("mongodb".parse::<EngineKind>().unwrap(), EngineKind::Mongo);
        assert!("sqlite".parse::<EngineKind>().is_err());
    }

    #[test]
    fn defaults() {
        let config = load(&[
            ("POLLUTER_ENGINE", "postgres"),
            ("POLLUTER_URL", "postgresql://localhost/polluter"),
        ])
        .unwrap();
        assert_eq!(config.engine, EngineKind::Postgres);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.format.is_none());
        assert!(config.database.is_none());

        let pool = config.pool_config();
        assert_eq!(pool.url, "postgresql://localhost/polluter");
        assert_eq!(pool.max_connections, 5);
    }

    #[test]
    fn missing_required_vars() {
        let err = load(&[("POLLUTER_URL", "redis://localhost")]).unwrap_err();
        assert!(err.to_string().contains("POLLUTER_ENGINE"), "{err}");

        let err = load(&[("POLLUTER_ENGINE", "redis")]).unwrap_err();
        assert!(err.to_string().contains("POLLUTER_URL"), "{err}");

        let err = load(&[
            ("POLLUTER_ENGINE", "mongo"),
            ("POLLUTER_URL", "mongodb://localhost"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("POLLUTER_DATABASE"), "{err}");
    }

    #[test]
    fn invalid_numbers_and_formats() {
        let base = [
            ("POLLUTER_ENGINE", "mysql"),
            ("POLLUTER_URL", "mysql://localhost/polluter"),
        ];
        let with = |extra: (&'static str, &'static str)| {
            let mut vars = base.to_vec();
            vars.push(extra);
            load(&vars)
        };

        assert!(with(("POLLUTER_MAX_CONNECTIONS", "many")).is_err());
        assert!(with(("POLLUTER_CONNECT_TIMEOUT_MS", "-1")).is_err());
        assert!(with(("POLLUTER_FORMAT", "toml")).is_err());

        let config = with(("POLLUTER_CONNECT_TIMEOUT_MS", "250")).unwrap();
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn parser_selection() {
        let mut config = load(&[
            ("POLLUTER_ENGINE", "redis"),
            ("POLLUTER_URL", "redis://localhost"),
        ])
        .unwrap();
        assert_eq!(config.parser_for("fixtures/users.json"), Parser::Json);
        assert_eq!(config.parser_for("fixtures/users.yml"), Parser::Yaml);
        assert_eq!(config.parser_for("fixtures/users"), Parser::Yaml);
        assert_eq!(config.parser_for("-"), Parser::Yaml);

        config.format = Some(Parser::Json);
        assert_eq!(config.parser_for("fixtures/users.yaml"), Parser::Json);
    }
}
