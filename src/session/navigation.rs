//! Active route guidance.
//!
//! Lifecycle: `Idle -> Starting -> Active -> Idle`. `Starting` covers
//! the time between opening the subscription and the first fix. Every
//! fix moves the navigation marker, advances the matched step, derives
//! the current instruction and lets the camera follow.

use log::{debug, info, warn};
use serde::Serialize;

use super::{MarkerRole, SessionPorts, SessionToken, Subscription};
use crate::error::NavError;
use crate::geo::LatLng;
use crate::instruction::NavigationInstruction;
use crate::matcher::{MatchedProgress, RouteStepMatcher};
use crate::ports::{FixKind, MarkerIcon, Notice, Platform, PositionError, PositionFix};
use crate::route::RouteGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPhase {
    Idle,
    Starting,
    Active,
}

/// State that exists only while navigating.
#[derive(Debug)]
struct Guidance {
    token: SessionToken,
    geometry: RouteGeometry,
    destination: LatLng,
    progress: MatchedProgress,
    instruction: Option<NavigationInstruction>,
    subscription: Subscription,
    phase: NavigationPhase,
}

#[derive(Debug)]
pub struct NavigationSession {
    guidance: Option<Guidance>,
    matcher: RouteStepMatcher,
    /// Survives `stop()` for the final recenter; reset on `start()`.
    last_fix: Option<PositionFix>,
}

impl NavigationSession {
    pub fn new(matcher: RouteStepMatcher) -> Self {
        Self {
            guidance: None,
            matcher,
            last_fix: None,
        }
    }

    pub fn phase(&self) -> NavigationPhase {
        self.guidance
            .as_ref()
            .map_or(NavigationPhase::Idle, |g| g.phase)
    }

    pub fn is_running(&self) -> bool {
        self.guidance.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.phase() == NavigationPhase::Active
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.guidance.as_ref().map(|g| g.token)
    }

    pub fn progress(&self) -> Option<MatchedProgress> {
        self.guidance.as_ref().map(|g| g.progress)
    }

    pub fn instruction(&self) -> Option<&NavigationInstruction> {
        self.guidance.as_ref().and_then(|g| g.instruction.as_ref())
    }

    pub fn geometry(&self) -> Option<&RouteGeometry> {
        self.guidance.as_ref().map(|g| &g.geometry)
    }

    pub fn destination(&self) -> Option<LatLng> {
        self.guidance.as_ref().map(|g| g.destination)
    }

    pub fn last_fix(&self) -> Option<PositionFix> {
        self.last_fix
    }

    /// Check the preconditions of `start` without side effects.
    pub fn check_start<P: Platform>(
        platform: &P,
        geometry: Option<&RouteGeometry>,
        destination: Option<LatLng>,
    ) -> Result<(), NavError> {
        if !platform.is_supported() {
            return Err(NavError::Capability);
        }
        match (geometry, destination) {
            (None, _) => Err(NavError::Validation("no route geometry".into())),
            (_, None) => Err(NavError::Validation("no destination".into())),
            _ => Ok(()),
        }
    }

    /// Begin guidance along `geometry`. A no-op while already running.
    ///
    /// On failure the notifier is told and the session stays idle.
    pub fn start<P: Platform>(
        &mut self,
        ports: &mut SessionPorts<P>,
        token: SessionToken,
        geometry: Option<RouteGeometry>,
        destination: Option<LatLng>,
    ) -> Result<(), NavError> {
        if self.is_running() {
            debug!("Navigation already running");
            return Ok(());
        }

        let checked = Self::check_start(&ports.platform, geometry.as_ref(), destination)
            .and_then(|()| {
                geometry
                    .zip(destination)
                    .ok_or_else(|| NavError::Validation("no route".into()))
            });
        let (geometry, destination) = match checked {
            Ok(v) => v,
            Err(err) => {
                ports.platform.notify(err.notice());
                return Err(err);
            }
        };

        info!("Navigation started ({:?}, {} steps)", token, geometry.len());
        ports.camera.bind(&mut ports.platform, token);
        self.last_fix = None;

        ports.platform.notify(Notice::success(
            "Navigation started",
            Some("Following your location every second"),
        ));

        let initial = ports.config.initial_fix_options();
        let watch = ports.config.navigation_fix_options();
        ports.platform.request_current_fix(token, initial);
        let handle = ports.platform.watch(token, watch);

        self.guidance = Some(Guidance {
            token,
            geometry,
            destination,
            progress: MatchedProgress {
                step_index: 0,
                distance_to_maneuver_m: 0.0,
            },
            instruction: None,
            subscription: Subscription::open(handle),
            phase: NavigationPhase::Starting,
        });
        Ok(())
    }

    /// Handle a fix delivery. Deliveries for another generation are dropped.
    pub fn handle_fix<P: Platform>(
        &mut self,
        ports: &mut SessionPorts<P>,
        token: SessionToken,
        kind: FixKind,
        result: Result<PositionFix, PositionError>,
    ) {
        if self.token() != Some(token) {
            debug!(
                "Dropping {:?} fix for stale navigation session {:?}",
                kind, token
            );
            return;
        }

        match result {
            Ok(fix) => {
                self.update(ports, fix);
                if kind == FixKind::Initial {
                    let zoom = ports.config.close_zoom;
                    ports.camera.move_to(&mut ports.platform, fix.position(), Some(zoom));
                }
            }
            Err(e) => {
                let err = NavError::from(e);
                warn!("Navigation {:?} fix failed: {}", kind, err);
                ports.platform.notify(err.notice());
                if err.is_fatal() {
                    self.teardown(ports);
                }
            }
        }
    }

    fn update<P: Platform>(&mut self, ports: &mut SessionPorts<P>, fix: PositionFix) {
        let Some(guidance) = self.guidance.as_mut() else {
            return;
        };
        let at = fix.position();

        ports.marker.place(
            &mut ports.platform,
            MarkerRole::Navigating,
            at,
            MarkerIcon::Navigation {
                rotation_deg: fix.rotation(),
            },
        );
        self.last_fix = Some(fix);

        let progress = self.matcher.advance(&guidance.geometry, guidance.progress.step_index, at);
        debug_assert!(progress.step_index >= guidance.progress.step_index);
        if progress.step_index != guidance.progress.step_index {
            debug!("Advanced to step {}", progress.step_index);
        }

        if let Some(step) = guidance.geometry.step(progress.step_index) {
            guidance.instruction = Some(NavigationInstruction::new(
                &step.maneuver,
                step.road_name.as_deref(),
                progress.distance_to_maneuver_m,
            ));
        }
        guidance.progress = progress;
        guidance.phase = NavigationPhase::Active;

        ports.camera.follow(&mut ports.platform, at);
    }

    /// Recenter on the traveler at the close zoom. Returns false when
    /// there is no position to recenter on.
    pub fn recenter<P: Platform>(&mut self, ports: &mut SessionPorts<P>) -> bool {
        let Some(fix) = self.last_fix.filter(|_| self.is_running()) else {
            return false;
        };
        let zoom = ports.config.close_zoom;
        ports.camera.recenter(&mut ports.platform, fix.position(), zoom);
        ports.platform.notify(Notice::success("Map recentered on your location", None));
        true
    }

    /// End guidance. Returns false if navigation was not running.
    ///
    /// `next` is the generation the camera moves to, so the final
    /// recenter's window is not tied to the ended session.
    pub fn stop<P: Platform>(&mut self, ports: &mut SessionPorts<P>, next: SessionToken) -> bool {
        if !self.is_running() {
            return false;
        }
        self.teardown(ports);
        ports.camera.bind(&mut ports.platform, next);

        if let Some(fix) = self.last_fix {
            let zoom = ports.config.close_zoom;
            ports.camera.move_to(&mut ports.platform, fix.position(), Some(zoom));
        }

        ports.platform.notify(Notice::success(
            "Navigation stopped",
            Some("Navigation configuration has been reset"),
        ));
        true
    }

    /// End guidance without the final recenter or a notice.
    pub fn shutdown<P: Platform>(&mut self, ports: &mut SessionPorts<P>) {
        if self.is_running() {
            self.teardown(ports);
        }
    }

    fn teardown<P: Platform>(&mut self, ports: &mut SessionPorts<P>) {
        if let Some(mut guidance) = self.guidance.take() {
            info!("Navigation stopped ({:?})", guidance.token);
            guidance.subscription.cancel(&mut ports.platform);
        }
        ports.marker.release(&mut ports.platform, MarkerRole::Navigating);
    }
}
