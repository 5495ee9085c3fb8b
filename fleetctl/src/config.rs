//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `FLEETCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FLEETCTL_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `FLEETCTL_UPLOADS__DIR=/var/lib/fleetctl/uploads` sets the `uploads.dir` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use fleetctl::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`
//! - **Database**: `database.url`, `database.pool` - SQLite connection settings
//! - **Uploads**: `uploads.dir`, `uploads.public_base_url`, `uploads.max_file_size`
//! - **Legacy**: `legacy` - optional SQL Server master-data source for customer imports
//! - **Mapping**: `mapping` - optional geocoding / distance API used during imports
//! - **Business rules**: `distance_rates`, `evaluation`
//! - **CORS**: `cors`
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! FLEETCTL_PORT=8080
//! DATABASE_URL="sqlite:///var/lib/fleetctl/fleetctl.db"
//! FLEETCTL_LEGACY__PASSWORD=secret
//! FLEETCTL_MAPPING__API_KEY=...
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;
use crate::legacy::retry::RetryConfig;
use crate::mapping::Coordinates;
use crate::rates::{RateBand, validate_bands};
use crate::scoring::ScoringRules;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FLEETCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the raw `DATABASE_URL` environment variable; replaces `database.url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    pub cors: CorsConfig,
    pub uploads: UploadsConfig,
    /// Legacy SQL Server master data; imports are unavailable when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<LegacyConfig>,
    /// Geocoding and distance API; import enrichment is skipped when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingConfig>,
    /// Per-trip rate bands, ordered by increasing `max_km`
    pub distance_rates: Vec<RateBand>,
    /// Evaluation score maxima, damage rules and grade thresholds
    pub evaluation: ScoringRules,
}

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// e.g. `sqlite://fleetctl.db`; the file is created if missing
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://fleetctl.db".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Url(Url::parse("http://localhost:5173").unwrap())], // Development frontend
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://backoffice.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Image upload storage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Directory uploads are written under, one subdirectory per category
    pub dir: PathBuf,
    /// Prefix for image URLs returned to clients
    pub public_base_url: String,
    /// Maximum upload size in bytes
    pub max_file_size: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            public_base_url: "/files/images".to_string(),
            max_file_size: 5 * 1024 * 1024, // 5 MB
        }
    }
}

/// Connection to the legacy SQL Server master-data system.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyConfig {
    pub host: String,
    #[serde(default = "LegacyConfig::default_port")]
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Accept the server certificate without validation
    #[serde(default)]
    pub trust_cert: bool,
    #[serde(default = "LegacyConfig::default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Table (optionally schema-qualified) holding customer master data
    #[serde(default = "LegacyConfig::default_customer_table")]
    pub customer_table: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl LegacyConfig {
    fn default_port() -> u16 {
        1433
    }

    fn default_connect_timeout() -> Duration {
        Duration::from_secs(15)
    }

    fn default_customer_table() -> String {
        "Customers".to_string()
    }
}

/// The table name is interpolated into SQL, so only plain identifiers are accepted.
fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let part = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')).unwrap_or(part);
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Google-Maps-compatible geocoding and distance API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    #[serde(default = "MappingConfig::default_base_url")]
    pub base_url: Url,
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Where driving distances are measured from
    pub depot: Coordinates,
    #[serde(default = "MappingConfig::default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl MappingConfig {
    fn default_base_url() -> Url {
        Url::parse("https://maps.googleapis.com").unwrap()
    }

    fn default_timeout() -> Duration {
        Duration::from_secs(10)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            enable_otel_export: false,
            cors: CorsConfig::default(),
            uploads: UploadsConfig::default(),
            legacy: None,
            mapping: None,
            distance_rates: vec![],
            evaluation: ScoringRules::default(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> Error {
    Error::Internal {
        operation: format!("Config validation: {message}"),
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.uploads.max_file_size == 0 {
            return Err(invalid("uploads.max_file_size must be greater than zero"));
        }

        validate_bands(&self.distance_rates).map_err(invalid)?;

        let rules = &self.evaluation;
        let maxima = [
            ("max_cooperation_score", rules.max_cooperation_score),
            ("max_vehicle_condition_score", rules.max_vehicle_condition_score),
            ("max_damage_score", rules.max_damage_score),
        ];
        if let Some((name, _)) = maxima.iter().find(|(_, value)| *value < 0) {
            return Err(invalid(format!("evaluation.{name} cannot be negative")));
        }
        if rules.reduced_damage_score < 0 || rules.reduced_damage_score > rules.max_damage_score {
            return Err(invalid(format!(
                "evaluation.reduced_damage_score ({}) must be between 0 and max_damage_score ({})",
                rules.reduced_damage_score, rules.max_damage_score
            )));
        }
        if rules.damage_value_threshold < 0.0 {
            return Err(invalid("evaluation.damage_value_threshold cannot be negative"));
        }
        if rules.improve_threshold > rules.pass_threshold {
            return Err(invalid(format!(
                "evaluation.improve_threshold ({}) cannot be greater than pass_threshold ({})",
                rules.improve_threshold, rules.pass_threshold
            )));
        }

        if let Some(legacy) = &self.legacy {
            if legacy.host.trim().is_empty() || legacy.database.trim().is_empty() {
                return Err(invalid("legacy.host and legacy.database are required"));
            }
            if !is_sql_identifier(&legacy.customer_table) {
                return Err(invalid(format!("legacy.customer_table '{}' is not a valid table name", legacy.customer_table)));
            }
        }

        if let Some(mapping) = &self.mapping
            && mapping.api_key.trim().is_empty()
        {
            return Err(invalid("mapping.api_key is required when mapping is configured"));
        }

        // Validate that wildcard is not used with credentials
        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(invalid(
                "CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins.",
            ));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("FLEETCTL_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;
            assert_eq!(config.port, 3001);
            assert_eq!(config.uploads.public_base_url, "/files/images");
            assert!(config.legacy.is_none());
            assert_eq!(config.evaluation, ScoringRules::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 4000
uploads:
  dir: /srv/uploads
"#,
            )?;

            jail.set_env("FLEETCTL_HOST", "127.0.0.1");
            jail.set_env("FLEETCTL_UPLOADS__MAX_FILE_SIZE", "1024");
            jail.set_env("DATABASE_URL", "sqlite::memory:");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 4000);
            assert_eq!(config.uploads.dir, PathBuf::from("/srv/uploads"));
            assert_eq!(config.uploads.max_file_size, 1024);
            assert_eq!(config.database.url, "sqlite::memory:");
            assert!(config.database_url.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_legacy_and_mapping_sections() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
legacy:
  host: legacy-db.internal
  database: MasterData
  username: reader
  password: from-file
  connect_timeout: 5s
  customer_table: dbo.Customers
  retry:
    max_retries: 5
mapping:
  api_key: maps-key
  depot:
    latitude: 13.7
    longitude: 100.5
"#,
            )?;
            jail.set_env("FLEETCTL_LEGACY__PASSWORD", "from-env");

            let config = Config::load(&args("test.yaml"))?;

            let legacy = config.legacy.expect("legacy configured");
            assert_eq!(legacy.port, 1433);
            assert_eq!(legacy.password, "from-env");
            assert_eq!(legacy.connect_timeout, Duration::from_secs(5));
            assert_eq!(legacy.retry.max_retries, 5);
            assert_eq!(legacy.retry.backoff_ms, 1000);

            let mapping = config.mapping.expect("mapping configured");
            assert_eq!(mapping.base_url.as_str(), "https://maps.googleapis.com/");
            assert_eq!(mapping.timeout, Duration::from_secs(10));
            assert_eq!(mapping.depot.latitude, 13.7);

            Ok(())
        });
    }

    #[test]
    fn test_rates_and_scoring_rules() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
distance_rates:
  - max_km: 50
    rate: 300
  - max_km: 100
    rate: 500
evaluation:
  damage_value_threshold: 5000
  pass_threshold: 85
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.distance_rates.len(), 2);
            assert_eq!(config.distance_rates[1].rate, 500.0);
            assert_eq!(config.evaluation.damage_value_threshold, 5000.0);
            assert_eq!(config.evaluation.pass_threshold, 85.0);
            assert_eq!(config.evaluation.max_damage_score, 30);
            Ok(())
        });
    }

    #[test]
    fn test_unordered_rates_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
distance_rates:
  - max_km: 100
    rate: 500
  - max_km: 50
    rate: 300
"#,
            )?;

            let err = Config::load(&args("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("increasing max_km"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn test_inverted_grade_thresholds_rejected() {
        let config = Config {
            evaluation: ScoringRules {
                pass_threshold: 50.0,
                improve_threshold: 70.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_with_credentials_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
cors:
  allowed_origins: ["*"]
  allow_credentials: true
"#,
            )?;

            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "uploads:\n  directory: /tmp\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_legacy_table_name_must_be_identifier() {
        assert!(is_sql_identifier("Customers"));
        assert!(is_sql_identifier("dbo.Customers"));
        assert!(is_sql_identifier("[dbo].[Customer_Master]"));
        assert!(!is_sql_identifier("Customers; DROP TABLE x"));
        assert!(!is_sql_identifier("dbo."));
        assert!(!is_sql_identifier(""));
    }

    #[test]
    fn test_zero_upload_size_rejected() {
        let mut config = Config::default();
        config.uploads.max_file_size = 0;
        assert!(config.validate().is_err());
    }
}
