//! "Follow me" location tracking without a route.

use log::{debug, info, warn};

use super::{MarkerRole, SessionPorts, SessionToken, Subscription};
use crate::error::NavError;
use crate::ports::{FixKind, MarkerIcon, Notice, Platform, PositionError, PositionFix};

#[derive(Debug, Default)]
pub struct LocationTrackingSession {
    /// Set while tracking.
    token: Option<SessionToken>,
    subscription: Subscription,
    has_centered: bool,
    last_fix: Option<PositionFix>,
}

impl LocationTrackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.token
    }

    pub fn last_fix(&self) -> Option<PositionFix> {
        self.last_fix
    }

    /// Start tracking. A no-op when already tracking.
    pub fn start<P: Platform>(
        &mut self,
        ports: &mut SessionPorts<P>,
        token: SessionToken,
    ) -> Result<(), NavError> {
        if self.is_active() {
            debug!("Location tracking already active");
            return Ok(());
        }

        if !ports.platform.is_supported() {
            let err = NavError::Capability;
            ports.platform.notify(err.notice());
            return Err(err);
        }

        info!("Location tracking started ({:?})", token);
        self.token = Some(token);
        self.has_centered = false;
        self.last_fix = None;

        ports.platform.notify(Notice::info(
            "Location tracking started",
            Some("Following your current position"),
        ));

        let initial = ports.config.initial_fix_options();
        let watch = ports.config.tracking_fix_options();
        ports.platform.request_current_fix(token, initial);
        let handle = ports.platform.watch(token, watch);
        self.subscription = Subscription::open(handle);
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
        if self.token != Some(token) {
            debug!(
                "Dropping {:?} fix for stale tracking session {:?}",
                kind, token
            );
            return;
        }

        match result {
            Ok(fix) => self.update(ports, fix),
            Err(e) => {
                let err = NavError::from(e);
                warn!("Tracking {:?} fix failed: {}", kind, err);
                ports.platform.notify(err.notice());
                if err.is_fatal() {
                    self.teardown(ports);
                }
            }
        }
    }

    fn update<P: Platform>(&mut self, ports: &mut SessionPorts<P>, fix: PositionFix) {
        let at = fix.position();
        ports.marker.place(
            &mut ports.platform,
            MarkerRole::Tracking,
            at,
            MarkerIcon::UserLocation,
        );
        self.last_fix = Some(fix);

        // Only the first fix of a session moves the camera
        if !self.has_centered {
            self.has_centered = true;
            ports.camera.move_to(&mut ports.platform, at, None);
        }
    }

    /// Stop tracking. Returns false if tracking was not active.
    pub fn stop<P: Platform>(&mut self, ports: &mut SessionPorts<P>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.teardown(ports);
        ports.platform.notify(Notice::success("Location tracking stopped", None));
        true
    }

    /// Stop without notifying. Used when the host goes away.
    pub fn shutdown<P: Platform>(&mut self, ports: &mut SessionPorts<P>) {
        if self.is_active() {
            self.teardown(ports);
        }
    }

    fn teardown<P: Platform>(&mut self, ports: &mut SessionPorts<P>) {
        info!("Location tracking stopped ({:?})", self.token);
        self.token = None;
        self.subscription.cancel(&mut ports.platform);
        ports.marker.release(&mut ports.platform, MarkerRole::Tracking);
    }
}
