//! Recording fakes for the platform ports.

use std::time::Duration;

use crate::camera::TimerToken;
use crate::error::NavError;
use crate::geo::LatLng;
use crate::instruction::{Maneuver, ManeuverType};
use crate::ports::{
    FixOptions, MapView, MarkerHandle, MarkerIcon, Notice, Notifier, PositionSource, Scheduler,
    WatchHandle,
};
use crate::route::{Route, RouteGeometry, RouteProfile, RouteProvider, RouteStep};
use crate::session::SessionToken;

#[derive(Debug)]
pub struct FakePlatform {
    pub supported: bool,
    pub fix_requests: Vec<(SessionToken, FixOptions)>,
    pub watches: Vec<(SessionToken, WatchHandle)>,
    pub cleared: Vec<WatchHandle>,
    /// Markers currently on the map.
    pub markers: Vec<(MarkerHandle, LatLng, MarkerIcon)>,
    pub views: Vec<(LatLng, f64)>,
    pub zoom: f64,
    pub notices: Vec<Notice>,
    pub scheduled: Vec<(Duration, TimerToken)>,
    pub cancelled: Vec<TimerToken>,
    /// Map calls in the order they were made.
    pub map_calls: Vec<&'static str>,
    next_id: u64,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            supported: true,
            fix_requests: Vec::new(),
            watches: Vec::new(),
            cleared: Vec::new(),
            markers: Vec::new(),
            views: Vec::new(),
            zoom: 15.0,
            notices: Vec::new(),
            scheduled: Vec::new(),
            cancelled: Vec::new(),
            map_calls: Vec::new(),
            next_id: 1,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn last_watch(&self) -> (SessionToken, WatchHandle) {
        *self.watches.last().expect("no watch opened")
    }

    pub fn count_notices(&self, title: &str) -> usize {
        self.notices.iter().filter(|n| n.title == title).count()
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl PositionSource for FakePlatform {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn request_current_fix(&mut self, token: SessionToken, options: FixOptions) {
        self.fix_requests.push((token, options));
    }

    fn watch(&mut self, token: SessionToken, _options: FixOptions) -> WatchHandle {
        let handle = WatchHandle(self.next());
        self.watches.push((token, handle));
        handle
    }

    fn clear_watch(&mut self, handle: WatchHandle) {
        self.cleared.push(handle);
    }
}

impl MapView for FakePlatform {
    fn set_marker(&mut self, at: LatLng, icon: MarkerIcon) -> MarkerHandle {
        let handle = MarkerHandle(self.next());
        self.map_calls.push("set_marker");
        self.markers.push((handle, at, icon));
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.retain(|(h, _, _)| *h != handle);
    }

    fn set_view(&mut self, at: LatLng, zoom: f64) {
        self.map_calls.push("set_view");
        self.views.push((at, zoom));
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl Notifier for FakePlatform {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

impl Scheduler for FakePlatform {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.scheduled.push((delay, token));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.cancelled.push(token);
    }
}

pub struct FakeRouteProvider {
    pub result: Result<Route, NavError>,
    pub requests: Vec<(LatLng, LatLng, RouteProfile)>,
}

impl FakeRouteProvider {
    pub fn returning(result: Result<Route, NavError>) -> Self {
        Self {
            result,
            requests: Vec::new(),
        }
    }
}

impl RouteProvider for FakeRouteProvider {
    fn get_route(
        &mut self,
        from: LatLng,
        to: LatLng,
        profile: RouteProfile,
    ) -> Result<Route, NavError> {
        self.requests.push((from, to, profile));
        self.result.clone()
    }
}

/// Route heading north from (3.00, 101.7): depart, left turn at 3.01,
/// right turn at 3.02, arrive at 3.03.
pub fn north_route() -> RouteGeometry {
    let step = |kind, modifier, lat, name: &str| RouteStep {
        maneuver: Maneuver::new(kind, modifier, LatLng::new(lat, 101.7)),
        road_name: Some(name.to_string()),
    };

    RouteGeometry::new(vec![
        step(ManeuverType::Depart, None, 3.00, "Jalan Ampang"),
        step(ManeuverType::Turn, Some("left"), 3.01, "Jalan Tun Razak"),
        step(
            ManeuverType::Turn,
            Some("right"),
            3.02,
            "Jalan Bukit Bintang",
        ),
        step(ManeuverType::Arrive, None, 3.03, ""),
    ])
    .expect("non-empty route")
}
