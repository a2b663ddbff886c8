//! OpenRouteService directions adapter.
//!
//! API reference: https://openrouteservice.org/dev/#/api-docs/v2/directions

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OracleError;
use crate::order::Coordinate;
use crate::polyline::{DEFAULT_PRECISION, Polyline};
use crate::traits::{DrivingOracle, DrivingSummary, ensure_waypoints};

const SERVICE: &str = "OpenRouteService";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenRouteConfig {
    pub base_url: String,
    pub api_key: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OpenRouteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            api_key: String::new(),
            profile: "driving-car".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenRouteClient {
    config: OpenRouteConfig,
    client: reqwest::blocking::Client,
}

impl OpenRouteClient {
    pub fn new(config: OpenRouteConfig) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(OracleError::Client)?;

        Ok(Self { config, client })
    }

    fn directions_url(&self) -> String {
        format!(
            "{}/v2/directions/{}/json",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }
}

impl DrivingOracle for OpenRouteClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn fetch_driving_route(&self, waypoints: &[Coordinate]) -> Result<DrivingSummary, OracleError> {
        ensure_waypoints(waypoints)?;

        let request = DirectionsRequest {
            coordinates: waypoints.iter().map(Coordinate::lng_lat).collect(),
        };
        debug!(waypoints = waypoints.len(), profile = %self.config.profile, "requesting ORS directions");

        let body = self
            .client
            .post(self.directions_url())
            .header(reqwest::header::AUTHORIZATION, &self.config.api_key)
            .json(&request)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<DirectionsResponse>())
            .map_err(|err| OracleError::from_reqwest(SERVICE, err))?;

        body.into_summary()
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: RouteSummary,
    #[serde(default)]
    geometry: Option<String>,
}

// ORS omits both fields when the waypoints coincide.
#[derive(Debug, Default, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

impl DirectionsResponse {
    fn into_summary(self) -> Result<DrivingSummary, OracleError> {
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
            distance_m: route.summary.distance,
            duration_s: route.summary.duration,
            geometry,
        })
    }
}
