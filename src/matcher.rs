//! Position-to-route matching.
//!
//! Finds the step whose maneuver the traveler is heading for. The scan
//! starts at the previously matched step and only moves forward, so the
//! matched index never regresses within a navigation session.
//!
//! Scanning stops once a step is more than `prune_factor` times farther
//! than the best candidate so far. This assumes steps are roughly
//! ordered by position and can under-match on routes that cross or
//! double back on themselves.

use serde::Serialize;

use crate::geo::{distance, LatLng};
use crate::route::RouteGeometry;

/// Progress of the traveler along a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchedProgress {
    /// Index of the step currently considered next.
    pub step_index: usize,
    /// Distance from the latest fix to that step's maneuver, in meters.
    pub distance_to_maneuver_m: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteStepMatcher {
    prune_factor: f64,
}

impl Default for RouteStepMatcher {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl RouteStepMatcher {
    pub fn new(prune_factor: f64) -> Self {
        Self { prune_factor }
    }

    /// Match `fix` against `geometry`, never returning an index below `from_index`.
    pub fn advance(
        &self,
        geometry: &RouteGeometry,
        from_index: usize,
        fix: LatLng,
    ) -> MatchedProgress {
        let from = from_index.min(geometry.last_index());
        let mut closest = from;
        let mut min_distance = f64::INFINITY;

        for (i, step) in geometry.steps().iter().enumerate().skip(from) {
            let d = distance(fix, step.maneuver.position());

            if d < min_distance {
                min_distance = d;
                closest = i;
            }

            if d > min_distance * self.prune_factor {
                break;
            }
        }

        let step_index = closest.max(from);
        let target = geometry.steps()[step_index].maneuver.position();

        MatchedProgress {
            step_index,
            distance_to_maneuver_m: distance(fix, target),
        }
    }
}
