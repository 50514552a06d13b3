//! Device geolocation collaborator.
//!
//! Permission prompts, GPS fixes and platform reverse geocoding live outside
//! this crate; the service only sees [`DeviceLocator`].

use async_trait::async_trait;
use coachfinder_core::{Coordinates, PlaceRecord};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("timed out waiting for a location fix")]
    Timeout,
}

#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn request_foreground_permission(&self) -> PermissionStatus;

    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] or [`LocationError::Timeout`]
    /// when no fix can be obtained.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;

    /// Zero records is a valid answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] when the platform geocoder fails.
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<PlaceRecord>, LocationError>;
}

/// The first place record, reduced to what the UI displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPlace {
    pub area: String,
    pub state: String,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseGeocodeOutcome {
    Found(ResolvedPlace),
    NotFound,
}

impl ReverseGeocodeOutcome {
    pub(crate) fn from_records(records: &[PlaceRecord]) -> Self {
        match records.first() {
            Some(record) => ReverseGeocodeOutcome::Found(ResolvedPlace {
                area: record.area().unwrap_or_default().to_owned(),
                state: record.state().unwrap_or_default().to_owned(),
                formatted: record.formatted(),
            }),
            None => ReverseGeocodeOutcome::NotFound,
        }
    }
}
