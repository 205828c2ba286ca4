//! Route geometry as consumed by navigation.
//!
//! A route is an ordered list of steps, each ending in a maneuver.
//! Routes come from an OSRM-compatible backend (decoded here from its
//! JSON response) or from a GPX file (see [`crate::gpx`]).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geo::LatLng;
use crate::instruction::Maneuver;

/// One element of route geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub maneuver: Maneuver,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
}

/// Immutable, non-empty sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    steps: Vec<RouteStep>,
}

impl RouteGeometry {
    /// Fails with `Validation` for an empty step list.
    pub fn new(steps: Vec<RouteStep>) -> Result<Self, NavError> {
        if steps.is_empty() {
            return Err(NavError::Validation("route has no steps".into()));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&RouteStep> {
        self.steps.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }
}

/// A computed route with its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub geometry: RouteGeometry,
    pub distance_m: f64,
    pub duration_s: f64,
}

impl Route {
    /// Decode an OSRM `/route/v1` response, taking the first route.
    ///
    /// Steps of all legs are flattened into one geometry.
    pub fn from_osrm_json(json: &str) -> Result<Self, NavError> {
        let response: OsrmResponse = serde_json::from_str(json)
            .map_err(|e| NavError::Route(format!("invalid response: {e}")))?;

        if response.code != "Ok" {
            debug!("Routing backend answered {}", response.code);
            let message = response.message.unwrap_or_else(|| "Route not found".to_string());
            return Err(NavError::Route(message));
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| NavError::Route("response contains no routes".into()))?;

        let steps = route.legs.into_iter().flat_map(|leg| leg.steps).collect();

        Ok(Route {
            geometry: RouteGeometry::new(steps)?,
            distance_m: route.distance,
            duration_s: route.duration,
        })
    }

    pub fn distance_text(&self) -> String {
        format_route_distance(self.distance_m)
    }

    pub fn duration_text(&self) -> String {
        format_duration(self.duration_s)
    }
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<RouteStep>,
}

/// Travel mode used for route computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteProfile {
    Car,
    Bike,
    Foot,
}

impl RouteProfile {
    pub fn osrm_profile(self) -> &'static str {
        match self {
            RouteProfile::Car => "car",
            RouteProfile::Bike => "bike",
            RouteProfile::Foot => "foot",
        }
    }
}

/// Computes routes between two points. Implemented by the HTTP client.
pub trait RouteProvider {
    fn get_route(
        &mut self,
        from: LatLng,
        to: LatLng,
        profile: RouteProfile,
    ) -> Result<Route, NavError>;
}

/// Total route length for the summary panel.
pub fn format_route_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Total travel time for the summary panel.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes} min")
    }
}
