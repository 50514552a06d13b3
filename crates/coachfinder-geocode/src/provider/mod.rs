//! Geocoding provider abstractions.
//!
//! The service only talks to [`GeocodingProvider`] and [`NearbyProvider`];
//! each backend owns its request and response mapping.

mod nominatim;
mod places;

use std::time::Duration;

use async_trait::async_trait;
use coachfinder_core::{Coordinates, LocationCandidate};
use reqwest::Client;

use crate::error::GeocodeError;

pub use nominatim::NominatimProvider;
pub use places::PlacesProvider;

/// Free-text search against one backend.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Short stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Returns normalized candidates in provider order.
    ///
    /// `query` already carries the country qualifier. An empty `Vec` means the
    /// provider answered and nothing matched.
    ///
    /// # Errors
    ///
    /// Returns a provider-level [`GeocodeError`] on transport failure, non-2xx
    /// status, missing credentials or a malformed body.
    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, GeocodeError>;
}

/// Place lookup around a coordinate.
#[async_trait]
pub trait NearbyProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns place-level candidates near `origin`, unsorted and without
    /// distances.
    ///
    /// # Errors
    ///
    /// Returns a provider-level [`GeocodeError`] on any failure.
    async fn nearby(
        &self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<LocationCandidate>, GeocodeError>;
}

/// Shared `reqwest` client setup for every provider.
pub(crate) fn build_http_client(
    user_agent: &str,
    timeout_secs: u64,
) -> Result<Client, GeocodeError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(user_agent)
        .build()
        .map_err(GeocodeError::Client)
}

/// Sends a prepared request, requires a 2xx status, and returns the body text.
pub(crate) async fn send_for_text(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<String, GeocodeError> {
    let response = request
        .send()
        .await
        .map_err(|source| GeocodeError::ProviderTransport { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeocodeError::ProviderStatus {
            provider,
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| GeocodeError::ProviderTransport { provider, source })
}

/// Trims the base URL so paths can be appended with a single `/`.
pub(crate) fn normalise_base_url(base_url: &str) -> Result<String, GeocodeError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| GeocodeError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_owned())
}
