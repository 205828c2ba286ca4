//! Mode composition root.
//!
//! The navigator owns the platform ports, the camera, the single
//! traveler marker and both session kinds. It keeps tracking and
//! navigation mutually exclusive and routes platform events (fixes,
//! timer expiries, pan gestures) to whichever session they belong to.
//!
//! Navigation takes precedence: starting it stops tracking and takes
//! over the marker, while tracking cannot start during navigation.

use log::{debug, info};
use serde::Serialize;

use crate::camera::{CameraState, TimerToken};
use crate::config::NavigationConfig;
use crate::error::NavError;
use crate::geo::LatLng;
use crate::instruction::NavigationInstruction;
use crate::matcher::{MatchedProgress, RouteStepMatcher};
use crate::ports::{FixKind, Platform, PositionError, PositionFix};
use crate::route::{RouteGeometry, RouteProfile, RouteProvider};
use crate::session::navigation::{NavigationPhase, NavigationSession};
use crate::session::tracking::LocationTrackingSession;
use crate::session::{ActiveMarkerOwner, MarkerRole, SessionPorts, SessionToken};

/// Which session currently runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Idle,
    Tracking,
    Navigating,
}

/// Dropping the navigator shuts both sessions down quietly.
pub struct Navigator<P: Platform> {
    ports: SessionPorts<P>,
    tracking: LocationTrackingSession,
    navigation: NavigationSession,
    generation: u64,
    user_location: Option<PositionFix>,
}

impl<P: Platform> Navigator<P> {
    pub fn new(platform: P, config: NavigationConfig) -> Self {
        let matcher = RouteStepMatcher::new(config.prune_factor);
        Self {
            ports: SessionPorts::new(platform, config),
            tracking: LocationTrackingSession::new(),
            navigation: NavigationSession::new(matcher),
            generation: 0,
            user_location: None,
        }
    }

    fn next_token(&mut self) -> SessionToken {
        self.generation += 1;
        SessionToken(self.generation)
    }

    pub fn mode(&self) -> SessionMode {
        if self.navigation.is_running() {
            SessionMode::Navigating
        } else if self.tracking.is_active() {
            SessionMode::Tracking
        } else {
            SessionMode::Idle
        }
    }

    pub fn platform(&self) -> &P {
        &self.ports.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.ports.platform
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.ports.config
    }

    pub fn camera_state(&self) -> CameraState {
        self.ports.camera.state()
    }

    pub fn marker_owner(&self) -> ActiveMarkerOwner {
        self.ports.marker
    }

    pub fn navigation_phase(&self) -> NavigationPhase {
        self.navigation.phase()
    }

    pub fn progress(&self) -> Option<MatchedProgress> {
        self.navigation.progress()
    }

    pub fn instruction(&self) -> Option<&NavigationInstruction> {
        self.navigation.instruction()
    }

    pub fn route(&self) -> Option<&RouteGeometry> {
        self.navigation.geometry()
    }

    /// Latest fix seen in either mode.
    pub fn user_location(&self) -> Option<PositionFix> {
        self.user_location
    }

    pub fn start_tracking(&mut self) -> Result<(), NavError> {
        if self.navigation.is_running() {
            let err = NavError::ModeConflict;
            self.ports.platform.notify(err.notice());
            return Err(err);
        }
        if self.tracking.is_active() {
            return Ok(());
        }
        let token = self.next_token();
        self.tracking.start(&mut self.ports, token)
    }

    pub fn stop_tracking(&mut self) -> bool {
        let stopped = self.tracking.stop(&mut self.ports);
        self.check_invariants();
        stopped
    }

    pub fn toggle_tracking(&mut self) -> Result<(), NavError> {
        if self.tracking.is_active() {
            self.stop_tracking();
            Ok(())
        } else {
            self.start_tracking()
        }
    }

    /// Start guidance. Tracking, if running, is stopped only once the
    /// route and platform checks have passed.
    pub fn start_navigation(
        &mut self,
        geometry: Option<RouteGeometry>,
        destination: Option<LatLng>,
    ) -> Result<(), NavError> {
        if self.navigation.is_running() {
            debug!("Navigation already running");
            return Ok(());
        }

        if let Err(err) =
            NavigationSession::check_start(&self.ports.platform, geometry.as_ref(), destination)
        {
            self.ports.platform.notify(err.notice());
            return Err(err);
        }

        if self.tracking.is_active() {
            info!("Handing the marker from tracking to navigation");
            self.tracking.stop(&mut self.ports);
        }

        let token = self.next_token();
        let result = self.navigation.start(&mut self.ports, token, geometry, destination);
        self.check_invariants();
        result
    }

    /// Ask `provider` for a route from the user's location and navigate it.
    pub fn navigate_to<R: RouteProvider + ?Sized>(
        &mut self,
        provider: &mut R,
        destination: LatLng,
        profile: RouteProfile,
    ) -> Result<(), NavError> {
        if self.navigation.is_running() {
            let err = NavError::AlreadyNavigating;
            self.ports.platform.notify(err.notice());
            return Err(err);
        }

        let Some(origin) = self.user_location.map(|f| f.position()) else {
            let err = NavError::Validation("current location unknown".into());
            self.ports.platform.notify(err.notice());
            return Err(err);
        };

        let route = match provider.get_route(origin, destination, profile) {
            Ok(route) => route,
            Err(err) => {
                self.ports.platform.notify(err.notice());
                return Err(err);
            }
        };

        info!(
            "Route found: {}, {} ({})",
            route.distance_text(),
            route.duration_text(),
            profile.osrm_profile()
        );
        self.start_navigation(Some(route.geometry), Some(destination))
    }

    pub fn stop_navigation(&mut self) -> bool {
        if !self.navigation.is_running() {
            return false;
        }
        let next = self.next_token();
        let stopped = self.navigation.stop(&mut self.ports, next);
        self.check_invariants();
        stopped
    }

    /// Tear down whichever session runs without notifying the user:
    /// subscriptions are cleared, the marker is removed and any pending
    /// camera timer is cancelled. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.mode() != SessionMode::Idle {
            info!("Shutting down in mode {:?}", self.mode());
        }
        self.tracking.shutdown(&mut self.ports);
        self.navigation.shutdown(&mut self.ports);
        self.ports.camera.cancel_pending(&mut self.ports.platform);
        self.check_invariants();
    }

    /// A position request issued with `token` completed.
    pub fn handle_fix(
        &mut self,
        token: SessionToken,
        kind: FixKind,
        result: Result<PositionFix, PositionError>,
    ) {
        if self.navigation.token() == Some(token) {
            if let Ok(fix) = &result {
                self.user_location = Some(*fix);
            }
            self.navigation.handle_fix(&mut self.ports, token, kind, result);
        } else if self.tracking.token() == Some(token) {
            if let Ok(fix) = &result {
                self.user_location = Some(*fix);
            }
            self.tracking.handle_fix(&mut self.ports, token, kind, result);
        } else {
            debug!("Dropping {:?} fix for ended session {:?}", kind, token);
        }
        self.check_invariants();
    }

    /// A camera suppression window elapsed.
    pub fn handle_timer(&mut self, token: TimerToken) {
        self.ports.camera.handle_timer(token);
    }

    /// The map reported the start of a pan gesture.
    pub fn handle_user_pan(&mut self) {
        let navigating = self.navigation.is_active();
        self.ports.camera.handle_user_pan(navigating);
    }

    /// Explicit user request to follow the traveler again.
    pub fn recenter(&mut self) -> bool {
        self.navigation.recenter(&mut self.ports)
    }

    fn check_invariants(&self) {
        let owner = self.ports.marker.role();
        debug_assert!(
            !(self.navigation.is_running() && self.tracking.is_active()),
            "tracking and navigation both running"
        );
        debug_assert!(
            match self.mode() {
                SessionMode::Idle => owner.is_none(),
                SessionMode::Tracking => owner != Some(MarkerRole::Navigating),
                SessionMode::Navigating => owner != Some(MarkerRole::Tracking),
            },
            "marker owned by {:?} in mode {:?}",
            owner,
            self.mode()
        );
    }
}

impl<P: Platform> Drop for Navigator<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PositionErrorKind;
    use crate::route::Route;
    use crate::testing::{north_route, FakePlatform, FakeRouteProvider};

    const DEST: LatLng = LatLng {
        lat: 3.03,
        lng: 101.7,
    };

    fn navigator() -> Navigator<FakePlatform> {
        Navigator::new(FakePlatform::new(), NavigationConfig::default())
    }

    fn fix(lat: f64) -> Result<PositionFix, PositionError> {
        Ok(PositionFix::new(lat, 101.7001, None))
    }

    fn north_trip() -> Route {
        Route {
            geometry: north_route(),
            distance_m: 3340.0,
            duration_s: 400.0,
        }
    }

    /// Deliver a watch fix for the latest subscription.
    fn deliver(nav: &mut Navigator<FakePlatform>, lat: f64) {
        let (token, _) = nav.platform().last_watch();
        nav.handle_fix(token, FixKind::Watch, fix(lat));
    }

    /// Let the most recent suppression window elapse.
    fn elapse_window(nav: &mut Navigator<FakePlatform>) {
        let (_, timer) = *nav.platform().scheduled.last().unwrap();
        nav.handle_timer(timer);
    }

    #[test]
    fn starts_idle() {
        let nav = navigator();
        assert_eq!(nav.mode(), SessionMode::Idle);
        assert_eq!(nav.marker_owner(), ActiveMarkerOwner::None);
        assert!(nav.camera_state().centered);
    }

    #[test]
    fn validation_error_leaves_tracking_running() {
        let mut nav = navigator();
        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);

        let err = nav.start_navigation(None, Some(DEST)).unwrap_err();
        assert!(matches!(err, NavError::Validation(_)));
        assert_eq!(nav.mode(), SessionMode::Tracking);
        assert!(matches!(nav.marker_owner(), ActiveMarkerOwner::Tracking(_)));
        assert!(nav.platform().cleared.is_empty());
    }

    #[test]
    fn navigation_takes_over_from_tracking() {
        let mut nav = navigator();
        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);
        let (tracking_token, tracking_watch) = nav.platform().last_watch();

        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        assert_eq!(nav.mode(), SessionMode::Navigating);
        assert_eq!(nav.platform().cleared, vec![tracking_watch]);
        assert!(nav.platform().markers.is_empty());

        // A late tracking fix must not bring the tracking marker back
        nav.handle_fix(tracking_token, FixKind::Watch, fix(3.001));
        assert!(nav.platform().markers.is_empty());

        deliver(&mut nav, 3.0);
        let owner = nav.marker_owner();
        assert!(matches!(owner, ActiveMarkerOwner::Navigating(_)));
        assert_eq!(nav.platform().markers.len(), 1);
    }

    #[test]
    fn tracking_refused_while_navigating() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();

        assert_eq!(nav.start_tracking(), Err(NavError::ModeConflict));
        assert_eq!(nav.platform().watches.len(), 1);
        assert_eq!(nav.mode(), SessionMode::Navigating);
    }

    #[test]
    fn fix_after_stop_changes_nothing() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        let (token, handle) = nav.platform().last_watch();
        nav.handle_fix(token, FixKind::Watch, fix(3.0));

        assert!(nav.stop_navigation());
        assert_eq!(nav.platform().cleared, vec![handle]);

        let views = nav.platform().views.len();
        nav.handle_fix(token, FixKind::Watch, fix(3.02));
        nav.handle_fix(token, FixKind::Initial, fix(3.02));

        assert_eq!(nav.mode(), SessionMode::Idle);
        assert!(nav.progress().is_none());
        assert!(nav.instruction().is_none());
        assert!(nav.platform().markers.is_empty());
        assert_eq!(nav.platform().views.len(), views);
        assert_eq!(nav.platform().cleared.len(), 1);
    }

    #[test]
    fn stop_twice_notifies_once() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        assert!(nav.stop_navigation());
        assert!(!nav.stop_navigation());
        assert_eq!(nav.platform().count_notices("Navigation stopped"), 1);
    }

    #[test]
    fn manual_pan_disables_follow_until_recenter() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        deliver(&mut nav, 3.0);

        // Pan during our own move's window is ignored
        nav.handle_user_pan();
        assert!(nav.camera_state().centered);

        elapse_window(&mut nav);
        nav.handle_user_pan();
        assert!(!nav.camera_state().centered);
        nav.handle_user_pan();
        assert!(!nav.camera_state().centered);

        let views = nav.platform().views.len();
        deliver(&mut nav, 3.005);
        assert_eq!(
            nav.platform().views.len(),
            views,
            "camera followed after manual pan"
        );

        assert!(nav.recenter());
        assert!(nav.camera_state().centered);
        deliver(&mut nav, 3.006);
        assert_eq!(nav.platform().views.len(), views + 2);
    }

    #[test]
    fn pan_while_tracking_keeps_centered() {
        let mut nav = navigator();
        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);
        elapse_window(&mut nav);

        nav.handle_user_pan();
        assert!(nav.camera_state().centered);
    }

    #[test]
    fn timer_after_stop_is_harmless() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        deliver(&mut nav, 3.0);
        let (_, mid_window) = nav.platform().scheduled[0];

        nav.stop_navigation();
        assert!(nav.platform().cancelled.contains(&mid_window));

        nav.handle_timer(mid_window);
        // The final recenter's own window is still open
        assert!(nav.camera_state().suppressed);
        elapse_window(&mut nav);
        assert!(!nav.camera_state().suppressed);
    }

    #[test]
    fn restart_is_a_fresh_lifecycle() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        deliver(&mut nav, 3.029);
        assert_eq!(nav.progress().unwrap().step_index, 3);
        let (first, _) = nav.platform().last_watch();
        nav.stop_navigation();

        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        let (second, _) = nav.platform().last_watch();
        assert_ne!(first, second);

        deliver(&mut nav, 3.0);
        assert_eq!(nav.progress().unwrap().step_index, 0);
    }

    #[test]
    fn permission_denied_returns_to_idle() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        let (token, _) = nav.platform().last_watch();

        let denied = PositionError::new(PositionErrorKind::PermissionDenied, "denied");
        nav.handle_fix(token, FixKind::Initial, Err(denied));

        assert_eq!(nav.mode(), SessionMode::Idle);
        assert_eq!(nav.platform().cleared.len(), 1);
    }

    #[test]
    fn toggle_tracking() {
        let mut nav = navigator();
        nav.toggle_tracking().unwrap();
        assert_eq!(nav.mode(), SessionMode::Tracking);
        nav.toggle_tracking().unwrap();
        assert_eq!(nav.mode(), SessionMode::Idle);
        assert_eq!(nav.platform().count_notices("Location tracking stopped"), 1);
    }

    #[test]
    fn navigate_to_uses_last_known_location() {
        let mut nav = navigator();
        let mut provider = FakeRouteProvider::returning(Ok(north_trip()));

        let err = nav.navigate_to(&mut provider, DEST, RouteProfile::Car).unwrap_err();
        assert!(matches!(err, NavError::Validation(_)));
        assert!(provider.requests.is_empty());

        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);
        nav.navigate_to(&mut provider, DEST, RouteProfile::Foot).unwrap();

        assert_eq!(provider.requests.len(), 1);
        let (from, to, profile) = provider.requests[0];
        assert_eq!(from, LatLng::new(3.0, 101.7001));
        assert_eq!(to, DEST);
        assert_eq!(profile, RouteProfile::Foot);
        assert_eq!(nav.mode(), SessionMode::Navigating);
    }

    #[test]
    fn navigate_to_surfaces_route_errors() {
        let mut nav = navigator();
        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);

        let mut provider = FakeRouteProvider::returning(Err(NavError::Route("NoRoute".into())));
        let err = nav.navigate_to(&mut provider, DEST, RouteProfile::Car).unwrap_err();
        assert_eq!(err, NavError::Route("NoRoute".into()));
        assert_eq!(nav.mode(), SessionMode::Tracking);
        assert_eq!(nav.platform().count_notices("Failed to get route"), 1);
    }

    #[test]
    fn navigate_to_while_navigating_is_refused() {
        let mut nav = navigator();
        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);
        let mut provider = FakeRouteProvider::returning(Ok(north_trip()));
        nav.navigate_to(&mut provider, DEST, RouteProfile::Car).unwrap();

        let elsewhere = LatLng::new(9.0, 9.0);
        let err = nav.navigate_to(&mut provider, elsewhere, RouteProfile::Car).unwrap_err();
        assert_eq!(err, NavError::AlreadyNavigating);
        assert_eq!(provider.requests.len(), 1);
        assert_eq!(nav.platform().count_notices("Already navigating"), 1);
        assert_eq!(nav.navigation.destination(), Some(DEST));

        // A new destination is accepted once guidance has stopped
        nav.stop_navigation();
        nav.navigate_to(&mut provider, elsewhere, RouteProfile::Car).unwrap();
        assert_eq!(provider.requests.len(), 2);
        assert_eq!(nav.navigation.destination(), Some(elsewhere));
    }

    #[test]
    fn shutdown_releases_everything_quietly() {
        let mut nav = navigator();
        nav.start_navigation(Some(north_route()), Some(DEST)).unwrap();
        deliver(&mut nav, 3.0);
        let (_, handle) = nav.platform().last_watch();
        let (_, pending) = *nav.platform().scheduled.last().unwrap();
        let notices = nav.platform().notices.len();

        nav.shutdown();
        nav.shutdown();

        assert_eq!(nav.mode(), SessionMode::Idle);
        assert_eq!(nav.platform().cleared, vec![handle]);
        assert!(nav.platform().markers.is_empty());
        assert_eq!(nav.marker_owner(), ActiveMarkerOwner::None);
        assert_eq!(nav.platform().cancelled, vec![pending]);
        assert_eq!(nav.platform().notices.len(), notices);
    }

    #[test]
    fn shutdown_stops_tracking() {
        let mut nav = navigator();
        nav.start_tracking().unwrap();
        deliver(&mut nav, 3.0);
        let (token, handle) = nav.platform().last_watch();

        nav.shutdown();
        assert_eq!(nav.platform().cleared, vec![handle]);
        assert_eq!(nav.platform().count_notices("Location tracking stopped"), 0);

        nav.handle_fix(token, FixKind::Watch, fix(3.001));
        assert!(nav.platform().markers.is_empty());
    }
}
