//! Collaborator interfaces.
//!
//! Sessions never talk to the platform directly. Position updates,
//! map drawing, notifications and timers go through these traits,
//! which the embedding application implements (and tests fake).
//!
//! The platform is asynchronous but the sessions are not: requests
//! are issued through the traits, and results come back later when
//! the event loop calls the matching `handle_*` method on the
//! [`Navigator`](crate::navigator::Navigator), carrying the token the
//! request was issued with.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::TimerToken;
use crate::geo::LatLng;
use crate::session::SessionToken;

/// One reported position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub lat: f64,
    pub lng: f64,
    /// Direction of travel in degrees, when the device knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl PositionFix {
    pub fn new(lat: f64, lng: f64, heading: Option<f64>) -> Self {
        Self { lat, lng, heading }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Heading in degrees, 0 when absent or NaN.
    pub fn rotation(&self) -> f64 {
        self.heading.filter(|h| !h.is_nan()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorKind {
    PermissionDenied,
    Unavailable,
    Timeout,
}

/// A failed position request, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct PositionError {
    pub kind: PositionErrorKind,
    pub message: String,
}

impl PositionError {
    pub fn new(kind: PositionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Which request a delivered fix answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    /// The one-shot fix requested at session start.
    Initial,
    /// A delivery from the continuous subscription.
    Watch,
}

/// Accuracy and freshness requested from the position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerIcon {
    /// Plain dot used while tracking.
    UserLocation,
    /// Arrow rotated to the direction of travel.
    Navigation { rotation_deg: f64 },
}

pub trait PositionSource {
    /// False when the platform has no positioning at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Request a single fix, answered with `FixKind::Initial`.
    fn request_current_fix(&mut self, token: SessionToken, options: FixOptions);

    /// Open a continuous subscription, answered with `FixKind::Watch`.
    fn watch(&mut self, token: SessionToken, options: FixOptions) -> WatchHandle;

    fn clear_watch(&mut self, handle: WatchHandle);
}

/// The map widget. User pan gestures are reported back through
/// [`Navigator::handle_user_pan`](crate::navigator::Navigator::handle_user_pan).
pub trait MapView {
    fn set_marker(&mut self, at: LatLng, icon: MarkerIcon) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn set_view(&mut self, at: LatLng, zoom: f64);
    fn zoom(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: Option<String>,
}

impl Notice {
    fn with(level: NoticeLevel, title: &str, detail: Option<&str>) -> Self {
        Self {
            level,
            title: title.to_string(),
            detail: detail.map(str::to_string),
        }
    }

    pub fn success(title: &str, detail: Option<&str>) -> Self {
        Self::with(NoticeLevel::Success, title, detail)
    }

    pub fn info(title: &str, detail: Option<&str>) -> Self {
        Self::with(NoticeLevel::Info, title, detail)
    }

    pub fn error(title: &str, detail: Option<&str>) -> Self {
        Self::with(NoticeLevel::Error, title, detail)
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// One-shot timers, answered through
/// [`Navigator::handle_timer`](crate::navigator::Navigator::handle_timer).
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, token: TimerToken);
    fn cancel(&mut self, token: TimerToken);
}

/// Everything a session needs from the host.
pub trait Platform: PositionSource + MapView + Notifier + Scheduler {}

impl<T: PositionSource + MapView + Notifier + Scheduler> Platform for T {}
