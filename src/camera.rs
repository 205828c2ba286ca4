//! Camera auto-centering.
//!
//! Moving the camera programmatically makes the map report the same
//! pan gesture a user drag does. Every programmatic move therefore
//! opens a short suppression window; pan signals inside it are ignored.
//! A pan outside the window while navigating hands control to the user
//! until they ask to recenter.

use std::time::Duration;

use log::debug;
use serde::Serialize;

use crate::geo::LatLng;
use crate::ports::{MapView, Scheduler};
use crate::session::SessionToken;

/// Identifies one scheduled end of a suppression window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub generation: SessionToken,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraState {
    /// Whether the camera follows the traveler.
    pub centered: bool,
    /// True only while a programmatic move's window is open.
    pub suppressed: bool,
}

#[derive(Debug)]
pub struct CameraController {
    state: CameraState,
    window: Duration,
    generation: SessionToken,
    pending: Option<TimerToken>,
    next_seq: u64,
}

impl CameraController {
    pub fn new(window: Duration) -> Self {
        Self {
            state: CameraState {
                centered: true,
                suppressed: false,
            },
            window,
            generation: SessionToken::default(),
            pending: None,
            next_seq: 0,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_centered(&self) -> bool {
        self.state.centered
    }

    /// Start a fresh lifecycle: centered, no window open, and any timer
    /// from the previous generation cancelled.
    pub fn bind<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S, generation: SessionToken) {
        self.cancel_pending(scheduler);
        self.generation = generation;
        self.state = CameraState {
            centered: true,
            suppressed: false,
        };
    }

    /// Move the camera and open a suppression window. `zoom` of `None`
    /// keeps the map's current zoom.
    pub fn move_to<P: MapView + Scheduler + ?Sized>(
        &mut self,
        platform: &mut P,
        at: LatLng,
        zoom: Option<f64>,
    ) {
        let zoom = zoom.unwrap_or_else(|| platform.zoom());
        self.cancel_pending(platform);

        self.state.suppressed = true;
        platform.set_view(at, zoom);

        let token = TimerToken {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending = Some(token);
        platform.schedule(self.window, token);
    }

    /// Follow the traveler unless the user has taken over.
    pub fn follow<P: MapView + Scheduler + ?Sized>(&mut self, platform: &mut P, at: LatLng) {
        if self.state.centered {
            self.move_to(platform, at, None);
        }
    }

    /// Explicit user request to follow again.
    pub fn recenter<P: MapView + Scheduler + ?Sized>(
        &mut self,
        platform: &mut P,
        at: LatLng,
        zoom: f64,
    ) {
        self.state.centered = true;
        self.move_to(platform, at, Some(zoom));
    }

    /// A suppression window elapsed. Returns false for stale timers.
    pub fn handle_timer(&mut self, token: TimerToken) -> bool {
        if self.pending != Some(token) {
            debug!("Ignoring stale camera timer {:?}", token);
            return false;
        }
        self.pending = None;
        self.state.suppressed = false;
        true
    }

    /// The map reported a pan gesture. Returns true when this gesture
    /// took control away from auto-centering.
    pub fn handle_user_pan(&mut self, navigating: bool) -> bool {
        if !navigating || self.state.suppressed || !self.state.centered {
            return false;
        }
        debug!("User panned the map, auto-centering off");
        self.state.centered = false;
        true
    }

    /// Cancel the open window's timer, if any.
    pub fn cancel_pending<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.pending.take() {
            scheduler.cancel(token);
        }
    }
}
