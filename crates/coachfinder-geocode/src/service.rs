//! Provider orchestration: text search with fallback, nearby search with
//! distance ranking, and reverse geocoding through the device collaborator.

use std::sync::Arc;

use coachfinder_core::{haversine_km, Coordinates, LocationCandidate, ProviderKind, SearchConfig};

use crate::error::GeocodeError;
use crate::geolocation::{DeviceLocator, LocationError, PermissionStatus, ReverseGeocodeOutcome};
use crate::provider::{GeocodingProvider, NearbyProvider, NominatimProvider, PlacesProvider};
use crate::retry::retry_with_backoff;

pub const MAX_TEXT_RESULTS: usize = 8;
pub const MAX_NEARBY_RESULTS: usize = 10;

pub struct LocationSearchService {
    primary: Arc<dyn GeocodingProvider>,
    fallback: Option<Arc<dyn GeocodingProvider>>,
    nearby: Arc<dyn NearbyProvider>,
    locator: Option<Arc<dyn DeviceLocator>>,
    config: SearchConfig,
}

impl LocationSearchService {
    /// Builds the HTTP providers named in `config`.
    ///
    /// Nearby search always uses the keyless Nominatim endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Client`] or [`GeocodeError::InvalidBaseUrl`]
    /// if a provider cannot be constructed.
    pub fn from_config(config: &SearchConfig) -> Result<Self, GeocodeError> {
        let nominatim = Arc::new(NominatimProvider::new(
            &config.nominatim_url,
            &config.user_agent,
            config.request_timeout_secs,
            &config.country_code,
        )?);
        let primary = build_provider(config.primary_provider, config, &nominatim)?;
        let fallback = config
            .fallback_provider
            .map(|kind| build_provider(kind, config, &nominatim))
            .transpose()?;

        tracing::debug!(
            primary = primary.name(),
            fallback = fallback.as_ref().map(|p| p.name()),
            "location search service configured"
        );
        Ok(Self::new(primary, fallback, nominatim, config.clone()))
    }

    #[must_use]
    pub fn new(
        primary: Arc<dyn GeocodingProvider>,
        fallback: Option<Arc<dyn GeocodingProvider>>,
        nearby: Arc<dyn NearbyProvider>,
        config: SearchConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            nearby,
            locator: None,
            config,
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: Arc<dyn DeviceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// `true` when `query` is long enough to be sent to a provider.
    #[must_use]
    pub fn is_searchable(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.config.min_search_length
    }

    /// Free-text location search.
    ///
    /// Queries shorter than `min_search_length` return an empty list without
    /// touching the network. The primary provider is tried first; any error
    /// from it moves on to the fallback. An empty answer is a valid result and
    /// is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::SearchFailed`] when every configured provider
    /// failed.
    pub async fn search_by_text(&self, query: &str) -> Result<Vec<LocationCandidate>, GeocodeError> {
        let trimmed = query.trim();
        if !self.is_searchable(trimmed) {
            return Ok(Vec::new());
        }
        let qualified = format!("{trimmed}, {}", self.config.country_name);

        let primary_err = match self.attempt(self.primary.as_ref(), &qualified).await {
            Ok(candidates) => return Ok(candidates),
            Err(e) => e,
        };

        let Some(fallback) = self.fallback.as_deref() else {
            tracing::warn!(
                provider = self.primary.name(),
                error = %primary_err,
                "location search failed, no fallback configured"
            );
            return Err(GeocodeError::SearchFailed {
                primary: Box::new(primary_err),
                fallback: None,
            });
        };

        tracing::warn!(
            provider = self.primary.name(),
            fallback = fallback.name(),
            error = %primary_err,
            "primary geocoder failed, trying fallback"
        );
        match self.attempt(fallback, &qualified).await {
            Ok(candidates) => Ok(candidates),
            Err(fallback_err) => {
                tracing::warn!(
                    provider = fallback.name(),
                    error = %fallback_err,
                    "fallback geocoder failed"
                );
                Err(GeocodeError::SearchFailed {
                    primary: Box::new(primary_err),
                    fallback: Some(Box::new(fallback_err)),
                })
            }
        }
    }

    async fn attempt(
        &self,
        provider: &dyn GeocodingProvider,
        query: &str,
    ) -> Result<Vec<LocationCandidate>, GeocodeError> {
        let mut candidates = retry_with_backoff(
            provider.name(),
            self.config.max_retries,
            self.config.retry_delay_ms,
            || provider.search(query),
        )
        .await?;
        candidates.truncate(MAX_TEXT_RESULTS);
        tracing::debug!(
            provider = provider.name(),
            count = candidates.len(),
            "location search succeeded"
        );
        Ok(candidates)
    }

    /// Nearby search with the configured default radius.
    ///
    /// # Errors
    ///
    /// See [`Self::search_nearby_within`].
    pub async fn search_nearby(
        &self,
        origin: Coordinates,
    ) -> Result<Vec<LocationCandidate>, GeocodeError> {
        self.search_nearby_within(origin, self.config.nearby_radius_km)
            .await
    }

    /// Place-level candidates within `radius_km` of `origin`, nearest first,
    /// each carrying its haversine distance.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidCoordinates`] for a non-finite or
    /// out-of-range origin, and [`GeocodeError::NearbyFailed`] when the
    /// provider fails.
    pub async fn search_nearby_within(
        &self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<LocationCandidate>, GeocodeError> {
        if !origin.is_valid() {
            return Err(GeocodeError::InvalidCoordinates {
                latitude: origin.latitude,
                longitude: origin.longitude,
            });
        }

        let raw = retry_with_backoff(
            self.nearby.name(),
            self.config.max_retries,
            self.config.retry_delay_ms,
            || self.nearby.nearby(origin, radius_km),
        )
        .await
        .map_err(|e| {
            tracing::warn!(provider = self.nearby.name(), error = %e, "nearby search failed");
            GeocodeError::NearbyFailed(Box::new(e))
        })?;

        let ranked = rank_by_distance(raw, origin, radius_km);
        tracing::debug!(
            provider = self.nearby.name(),
            radius_km,
            count = ranked.len(),
            "nearby search succeeded"
        );
        Ok(ranked)
    }

    /// Resolves `coordinates` to a display place through the device
    /// collaborator.
    ///
    /// # Errors
    ///
    /// Propagates the collaborator's [`LocationError`];
    /// [`LocationError::Unavailable`] when no collaborator is attached.
    pub async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodeOutcome, LocationError> {
        let locator = self.locator()?;
        let records = locator.reverse_geocode(coordinates).await?;
        Ok(ReverseGeocodeOutcome::from_records(&records))
    }

    /// Asks for permission, then returns the current device position.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::PermissionDenied`] when the user refuses, or
    /// whatever the collaborator reports while getting a fix.
    pub async fn current_location(&self) -> Result<Coordinates, LocationError> {
        let locator = self.locator()?;
        if locator.request_foreground_permission().await == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }
        locator.current_position().await
    }

    fn locator(&self) -> Result<&dyn DeviceLocator, LocationError> {
        self.locator
            .as_deref()
            .ok_or_else(|| LocationError::Unavailable("no device locator attached".to_string()))
    }
}

fn build_provider(
    kind: ProviderKind,
    config: &SearchConfig,
    nominatim: &Arc<NominatimProvider>,
) -> Result<Arc<dyn GeocodingProvider>, GeocodeError> {
    Ok(match kind {
        ProviderKind::Nominatim => Arc::clone(nominatim) as Arc<dyn GeocodingProvider>,
        ProviderKind::Places => Arc::new(PlacesProvider::new(
            &config.places_url,
            config.api_key.as_deref(),
            &config.user_agent,
            config.request_timeout_secs,
            &config.country_code,
            &config.country_name,
        )?),
    })
}

/// Sets `distance_km`, drops candidates beyond `radius_km`, sorts nearest
/// first and caps the list.
pub(crate) fn rank_by_distance(
    candidates: Vec<LocationCandidate>,
    origin: Coordinates,
    radius_km: f64,
) -> Vec<LocationCandidate> {
    let mut ranked: Vec<LocationCandidate> = candidates
        .into_iter()
        .filter_map(|mut c| {
            let d = haversine_km(origin, c.coordinates);
            if d.is_finite() && d <= radius_km {
                c.distance_km = Some(d);
                Some(c)
            } else {
                None
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(f64::INFINITY);
        let db = b.distance_km.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
    ranked.truncate(MAX_NEARBY_RESULTS);
    ranked
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
