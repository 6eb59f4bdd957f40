use crate::anomaly::{ReferenceTaxonomy, TaxonomyError};
use crate::compare::ComparisonWeights;
use crate::cost::CostOptions;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Defaults applied to every engine request that does not override them.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub horizon_months: Option<u32>,
    pub comparison_weights: ComparisonWeights,
    pub cost: CostOptions,
    pub reference_taxonomy: ReferenceTaxonomy,
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let horizon_months = match parse_var::<u32>("APP_HORIZON_MONTHS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "APP_HORIZON_MONTHS",
                    value: "0".to_string(),
                })
            }
            other => other,
        };

        let comparison_weights = match env::var("APP_COMPARISON_WEIGHTS") {
            Ok(raw) if !raw.trim().is_empty() => parse_weights(&raw)?,
            _ => ComparisonWeights::default(),
        };

        let cost = CostOptions {
            expected_return_baseline: parse_var("APP_EXPECTED_RETURN_BASELINE")?.unwrap_or(0.0),
            deductible_expectation: parse_var("APP_DEDUCTIBLE_EXPECTATION")?.unwrap_or(0.0),
        };
        for (key, value) in [
            ("APP_EXPECTED_RETURN_BASELINE", cost.expected_return_baseline),
            ("APP_DEDUCTIBLE_EXPECTATION", cost.deductible_expectation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                });
            }
        }

        let reference_taxonomy = match env::var("APP_REFERENCE_TAXONOMY") {
            Ok(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path.trim());
                ReferenceTaxonomy::from_path(&path)
                    .map_err(|source| ConfigError::Taxonomy { path, source })?
            }
            _ => ReferenceTaxonomy::new(),
        };

        Ok(Self {
            horizon_months,
            comparison_weights,
            cost,
            reference_taxonomy,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        _ => Ok(None),
    }
}

/// `cost,anomalies,rate`, e.g. `0.6,0.3,0.1`.
fn parse_weights(raw: &str) -> Result<ComparisonWeights, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "APP_COMPARISON_WEIGHTS",
        value: raw.to_string(),
    };

    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    let [total_cost, anomaly_count, effective_rate] = parts.as_slice() else {
        return Err(invalid());
    };

    let weights = ComparisonWeights::new(*total_cost, *anomaly_count, *effective_rate);
    weights.validate().map_err(|_| invalid())?;
    Ok(weights)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidValue {
        key: &'static str,
        value: String,
    },
    Taxonomy {
        path: PathBuf,
        source: TaxonomyError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::Taxonomy { path, .. } => {
                write!(
                    f,
                    "APP_REFERENCE_TAXONOMY could not be loaded from {}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Taxonomy { source, .. } => Some(source),
        }
    }
}
