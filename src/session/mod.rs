//! Session plumbing shared by tracking and navigation.
//!
//! Both session kinds are plain state machines. The host-facing
//! resources they act on (platform ports, the camera, the one marker)
//! live in [`SessionPorts`], owned by the navigator and lent to
//! whichever session handles the current event.

pub mod navigation;
pub mod tracking;

use log::debug;

use crate::camera::CameraController;
use crate::config::NavigationConfig;
use crate::geo::LatLng;
use crate::ports::{MapView, MarkerHandle, MarkerIcon, PositionSource, WatchHandle};

/// Generation of one session lifecycle.
///
/// Every request a session issues carries its token; deliveries with
/// any other token belong to a lifecycle that has already ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SessionToken(pub u64);

/// Which mode currently owns the map marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRole {
    Tracking,
    Navigating,
}

/// The single traveler marker and its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveMarkerOwner {
    #[default]
    None,
    Tracking(MarkerHandle),
    Navigating(MarkerHandle),
}

impl ActiveMarkerOwner {
    pub fn role(&self) -> Option<MarkerRole> {
        match self {
            ActiveMarkerOwner::None => None,
            ActiveMarkerOwner::Tracking(_) => Some(MarkerRole::Tracking),
            ActiveMarkerOwner::Navigating(_) => Some(MarkerRole::Navigating),
        }
    }

    fn handle(&self) -> Option<MarkerHandle> {
        match *self {
            ActiveMarkerOwner::None => None,
            ActiveMarkerOwner::Tracking(h) | ActiveMarkerOwner::Navigating(h) => Some(h),
        }
    }

    /// Draw the marker at `at` for `role`, replacing whatever marker
    /// was on the map before.
    pub fn place<M: MapView + ?Sized>(
        &mut self,
        map: &mut M,
        role: MarkerRole,
        at: LatLng,
        icon: MarkerIcon,
    ) {
        if let Some(old) = self.handle() {
            map.remove_marker(old);
        }
        let handle = map.set_marker(at, icon);
        *self = match role {
            MarkerRole::Tracking => ActiveMarkerOwner::Tracking(handle),
            MarkerRole::Navigating => ActiveMarkerOwner::Navigating(handle),
        };
    }

    /// Remove the marker if `role` owns it.
    pub fn release<M: MapView + ?Sized>(&mut self, map: &mut M, role: MarkerRole) {
        if self.role() != Some(role) {
            return;
        }
        if let Some(handle) = self.handle() {
            map.remove_marker(handle);
        }
        *self = ActiveMarkerOwner::None;
    }
}

/// An open position subscription. Cancelling is idempotent.
#[derive(Debug, Default)]
pub(crate) struct Subscription {
    handle: Option<WatchHandle>,
}

impl Subscription {
    pub(crate) fn open(handle: WatchHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub(crate) fn cancel<S: PositionSource + ?Sized>(&mut self, source: &mut S) {
        if let Some(handle) = self.handle.take() {
            debug!("Clearing position watch {:?}", handle);
            source.clear_watch(handle);
        }
    }
}

/// Resources a session borrows while handling an event.
#[derive(Debug)]
pub struct SessionPorts<P> {
    pub platform: P,
    pub camera: CameraController,
    pub marker: ActiveMarkerOwner,
    pub config: NavigationConfig,
}

impl<P> SessionPorts<P> {
    pub fn new(platform: P, config: NavigationConfig) -> Self {
        Self {
            platform,
            camera: CameraController::new(config.suppression_window()),
            marker: ActiveMarkerOwner::None,
            config,
        }
    }
}
