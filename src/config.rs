//! Engine configuration.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, OracleError};
use crate::haversine::{DEFAULT_ROAD_COEFFICIENT, DEFAULT_SPEED_KMH, StraightLineEstimator};
use crate::openroute::{OpenRouteClient, OpenRouteConfig};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::traits::DrivingOracle;

/// Worker threads for background driving-service requests.
pub const DEFAULT_REFINEMENT_THREADS: usize = 2;

/// Which driving-direction service refines the straight-line estimates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OracleConfig {
    /// Straight-line estimates only.
    #[default]
    None,
    Osrm(OsrmConfig),
    OpenRoute(OpenRouteConfig),
}

impl OracleConfig {
    pub fn build(&self) -> Result<Option<Arc<dyn DrivingOracle>>, OracleError> {
        let oracle: Arc<dyn DrivingOracle> = match self {
            OracleConfig::None => return Ok(None),
            OracleConfig::Osrm(config) => Arc::new(OsrmClient::new(config.clone())?),
            OracleConfig::OpenRoute(config) => Arc::new(OpenRouteClient::new(config.clone())?),
        };
        info!(oracle = oracle.name(), "driving oracle configured");
        Ok(Some(oracle))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Straight-line to road distance multiplier for estimates.
    pub road_coefficient: f64,
    /// Average speed in km/h for estimated drive time.
    pub average_speed_kmh: f64,
    /// Threads in the engine's refinement pool.
    pub refinement_threads: usize,
    pub oracle: OracleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            road_coefficient: DEFAULT_ROAD_COEFFICIENT,
            average_speed_kmh: DEFAULT_SPEED_KMH,
            refinement_threads: DEFAULT_REFINEMENT_THREADS,
            oracle: OracleConfig::None,
        }
    }
}

impl EngineConfig {
    pub fn estimator(&self) -> StraightLineEstimator {
        StraightLineEstimator::new(self.road_coefficient, self.average_speed_kmh)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = parse_f64(&lookup, "ROUTE_ENGINE_ROAD_COEFFICIENT")? {
            config.road_coefficient = value;
        }
        if let Some(value) = parse_f64(&lookup, "ROUTE_ENGINE_SPEED_KMH")? {
            config.average_speed_kmh = value;
        }
        if let Some(value) = parse_u64(&lookup, "ROUTE_ENGINE_REFINEMENT_THREADS")? {
            config.refinement_threads = value as usize;
        }

        let url = lookup("ROUTE_ENGINE_ORACLE_URL");
        let timeout = parse_u64(&lookup, "ROUTE_ENGINE_TIMEOUT_SECS")?;

        config.oracle = match lookup("ROUTE_ENGINE_ORACLE").as_deref().map(str::trim) {
            None | Some("") | Some("none") => OracleConfig::None,
            Some("osrm") => {
                let mut osrm = OsrmConfig::default();
                if let Some(url) = url {
                    osrm.base_url = url;
                }
                if let Some(timeout) = timeout {
                    osrm.timeout_secs = timeout;
                }
                OracleConfig::Osrm(osrm)
            }
            Some("openroute") => {
                let api_key = lookup("ROUTE_ENGINE_ORS_API_KEY")
                    .filter(|key| !key.is_empty())
                    .ok_or(ConfigError::MissingVar("ROUTE_ENGINE_ORS_API_KEY"))?;
                let mut ors = OpenRouteConfig {
                    api_key,
                    ..OpenRouteConfig::default()
                };
                if let Some(url) = url {
                    ors.base_url = url;
                }
                if let Some(timeout) = timeout {
                    ors.timeout_secs = timeout;
                }
                OracleConfig::OpenRoute(ors)
            }
            Some(other) => return Err(ConfigError::UnknownOracle(other.to_string())),
        };

        Ok(config)
    }
}

fn parse_f64(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<f64>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}
