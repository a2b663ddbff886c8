//! OSRM HTTP adapter for driving routes.

use serde::Deserialize;
use tracing::debug;

use crate::error::OracleError;
use crate::order::Coordinate;
use crate::polyline::{DEFAULT_PRECISION, Polyline};
use crate::traits::{DrivingOracle, DrivingSummary, ensure_waypoints};

const SERVICE: &str = "OSRM";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(OracleError::Client)?;

        Ok(Self { config, client })
    }

    fn route_url(&self, waypoints: &[Coordinate]) -> String {
        let coords = waypoints
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }
}

impl DrivingOracle for OsrmClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn fetch_driving_route(&self, waypoints: &[Coordinate]) -> Result<DrivingSummary, OracleError> {
        ensure_waypoints(waypoints)?;

        let url = self.route_url(waypoints);
        debug!(%url, waypoints = waypoints.len(), "requesting OSRM route");

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>())
            .map_err(|err| OracleError::from_reqwest(SERVICE, err))?;

        body.into_summary()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: Option<String>,
}

impl OsrmRouteResponse {
    fn into_summary(self) -> Result<DrivingSummary, OracleError> {
        if self.code != "Ok" {
            return Err(OracleError::NoRoute {
                service: SERVICE,
                reason: self.message.unwrap_or(self.code),
            });
        }

        let route = self.routes.into_iter().next().ok_or_else(|| OracleError::NoRoute {
            service: SERVICE,
            reason: "response contained no routes".to_string(),
        })?;

        let geometry = match route.geometry {
            Some(encoded) => {
                Polyline::decode(&encoded, DEFAULT_PRECISION).map_err(|err| OracleError::Malformed {
                    service: SERVICE,
                    reason: err.to_string(),
                })?
            }
            None => Polyline::default(),
        };

        Ok(DrivingSummary {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry,
        })
    }
}
