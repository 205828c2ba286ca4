//! Route import from GPX 1.1 files.
//!
//! Wraps the `gpx` crate. A GPX `<rte>` carries plain waypoints, not
//! maneuvers, so each point becomes a step whose maneuver is taken from
//! the point's `<type>` element when present and otherwise derived from
//! the bearing change at that point.

use std::io::Read;

use crate::error::NavError;
use crate::geo::{bearing, LatLng};
use crate::instruction::{Maneuver, ManeuverType};
use crate::route::{RouteGeometry, RouteStep};

/// Parse GPX from any reader and build geometry from its first route.
///
/// Files without routes fall back to the first track, so recorded
/// paths can be followed too.
pub fn import_route<R: Read>(reader: R) -> Result<RouteGeometry, NavError> {
    let gpx = gpx::read(reader).map_err(|e| NavError::Gpx(e.to_string()))?;

    let points: Vec<RoutePoint> = if let Some(route) = gpx.routes.first() {
        route.points.iter().map(RoutePoint::from_waypoint).collect()
    } else if let Some(track) = gpx.tracks.first() {
        track
            .segments
            .iter()
            .flat_map(|seg| seg.points.iter())
            .map(RoutePoint::from_waypoint)
            .collect()
    } else {
        return Err(NavError::Gpx("file contains no route or track".into()));
    };

    if points.len() < 2 {
        return Err(NavError::Gpx(format!(
            "route needs at least 2 points, got {}",
            points.len()
        )));
    }

    RouteGeometry::new(build_steps(&points))
}

/// Convenience wrapper for byte buffers handed over JNI.
pub fn import_route_bytes(data: &[u8]) -> Result<RouteGeometry, NavError> {
    import_route(data)
}

struct RoutePoint {
    at: LatLng,
    name: Option<String>,
    kind: Option<String>,
}

impl RoutePoint {
    fn from_waypoint(wp: &gpx::Waypoint) -> Self {
        Self {
            at: LatLng::new(wp.point().y(), wp.point().x()),
            name: wp.name.clone(),
            kind: wp.type_.clone(),
        }
    }
}

fn build_steps(points: &[RoutePoint]) -> Vec<RouteStep> {
    let last = points.len() - 1;

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let maneuver = match (i, p.kind.as_deref()) {
                (_, Some(kind)) if !kind.is_empty() => {
                    Maneuver::new(ManeuverType::from(kind), None, p.at)
                }
                (0, _) => Maneuver::new(ManeuverType::Depart, None, p.at),
                (i, _) if i == last => Maneuver::new(ManeuverType::Arrive, None, p.at),
                (i, _) => derived_maneuver(&points[i - 1].at, &p.at, &points[i + 1].at),
            };
            RouteStep {
                maneuver,
                road_name: p.name.clone(),
            }
        })
        .collect()
}

/// Maneuver at B given the approach from A and the exit toward C.
fn derived_maneuver(a: &LatLng, b: &LatLng, c: &LatLng) -> Maneuver {
    // Positive = right turn, negative = left turn
    let mut angle = bearing(*b, *c) - bearing(*a, *b);
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle < -180.0 {
        angle += 360.0;
    }

    match classify_turn(angle) {
        None => Maneuver::new(ManeuverType::Continue, Some("straight"), *b),
        Some(modifier) => Maneuver::new(ManeuverType::Turn, Some(modifier), *b),
    }
}

/// Classify a relative bearing into an OSRM turn modifier, `None` for straight.
fn classify_turn(angle: f64) -> Option<&'static str> {
    let abs_angle = angle.abs();
    let right = angle > 0.0;

    if abs_angle > 170.0 {
        Some("uturn")
    } else if abs_angle > 120.0 {
        Some(if right { "sharp right" } else { "sharp left" })
    } else if abs_angle > 60.0 {
        Some(if right { "right" } else { "left" })
    } else if abs_angle > 20.0 {
        Some(if right { "slight right" } else { "slight left" })
    } else {
        None
    }
}
