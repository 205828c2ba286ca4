//! Error taxonomy for navigation and tracking sessions.

use thiserror::Error;

use crate::ports::{Notice, PositionError, PositionErrorKind};

/// Errors surfaced by sessions, route decoding and configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    /// The platform offers no position source.
    #[error("Geolocation not supported")]
    Capability,

    /// Position access was denied.
    #[error("Location access denied: {0}")]
    Permission(String),

    /// Navigation was requested without a route or destination.
    #[error("No route available: {0}")]
    Validation(String),

    /// A single fix delivery failed or timed out.
    #[error("Position update failed: {0}")]
    TransientFix(String),

    /// Tracking was requested while navigation owns the marker.
    #[error("Navigation is active")]
    ModeConflict,

    /// A new destination was requested while guidance is running.
    #[error("Already navigating")]
    AlreadyNavigating,

    /// The route backend returned no usable route.
    #[error("Route not found: {0}")]
    Route(String),

    #[error("GPX import error: {0}")]
    Gpx(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl NavError {
    /// Whether the error ends the session that observed it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, NavError::TransientFix(_))
    }

    /// The user-facing notification for this error.
    pub fn notice(&self) -> Notice {
        match self {
            NavError::Capability => Notice::error(
                "Geolocation not supported",
                Some("Your device doesn't support location tracking"),
            ),
            NavError::Permission(_) => Notice::error(
                "Location access denied",
                Some("Please enable location permissions"),
            ),
            NavError::Validation(_) => Notice::error(
                "No route available",
                Some("Please calculate a route first"),
            ),
            NavError::TransientFix(msg) => Notice::error("Location update failed", Some(msg)),
            NavError::ModeConflict => Notice::error(
                "Navigation is active",
                Some("Stop navigation before tracking your location"),
            ),
            NavError::AlreadyNavigating => Notice::error(
                "Already navigating",
                Some("Stop navigation before choosing a new destination"),
            ),
            NavError::Route(msg) => Notice::error("Failed to get route", Some(msg)),
            NavError::Gpx(msg) => Notice::error("Failed to import route", Some(msg)),
            NavError::Config(msg) => Notice::error("Invalid configuration", Some(msg)),
        }
    }
}

impl From<PositionError> for NavError {
    fn from(e: PositionError) -> Self {
        match e.kind {
            PositionErrorKind::PermissionDenied => NavError::Permission(e.message),
            PositionErrorKind::Unavailable | PositionErrorKind::Timeout => {
                NavError::TransientFix(e.message)
            }
        }
    }
}
