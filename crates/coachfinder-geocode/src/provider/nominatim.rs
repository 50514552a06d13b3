//! Nominatim `/search` client. Free, keyless, always available.

use async_trait::async_trait;
use coachfinder_core::{Coordinates, LocationCandidate};
use reqwest::{Client, Url};

use super::{build_http_client, normalise_base_url, send_for_text, GeocodingProvider, NearbyProvider};
use crate::error::GeocodeError;
use crate::normalize::{normalize_nominatim, AreaPolicy};
use crate::types::NominatimPlace;

const PROVIDER: &str = "nominatim";
const SEARCH_LIMIT: usize = 8;
/// Nearby requests over-fetch because most raw records are roads and POIs.
const NEARBY_LIMIT: usize = 20;

pub struct NominatimProvider {
    client: Client,
    base_url: String,
    country_code: String,
}

impl NominatimProvider {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Client`] if the HTTP client cannot be built, or
    /// [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout_secs: u64,
        country_code: &str,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            client: build_http_client(user_agent, timeout_secs)?,
            base_url: normalise_base_url(base_url)?,
            country_code: country_code.to_ascii_lowercase(),
        })
    }

    /// Builds `<base>/search` with properly encoded query parameters.
    fn search_url(&self, params: &[(&str, &str)]) -> Result<Url, GeocodeError> {
        let raw = format!("{}/search", self.base_url);
        let mut url = Url::parse(&raw).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<Vec<NominatimPlace>, GeocodeError> {
        tracing::debug!(provider = PROVIDER, %url, "geocoding request");
        let body = send_for_text(PROVIDER, self.client.get(url)).await?;
        decode_places(&body)
    }
}

/// The body must be a JSON array; entries that do not look like a place are
/// skipped so one odd record cannot sink the rest.
fn decode_places(body: &str) -> Result<Vec<NominatimPlace>, GeocodeError> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|source| GeocodeError::ProviderParse {
            provider: PROVIDER,
            source,
        })?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(place) => Some(place),
            Err(error) => {
                tracing::warn!(provider = PROVIDER, %error, "skipping malformed result");
                None
            }
        })
        .collect())
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, GeocodeError> {
        let limit = SEARCH_LIMIT.to_string();
        let url = self.search_url(&[
            ("q", query),
            ("countrycodes", &self.country_code),
            ("format", "json"),
            ("limit", &limit),
            ("addressdetails", "1"),
        ])?;
        let raw = self.fetch(url).await?;
        let raw_count = raw.len();
        let candidates = normalize_nominatim(raw, AreaPolicy::Search);
        tracing::debug!(
            provider = PROVIDER,
            raw_count,
            count = candidates.len(),
            "search results normalized"
        );
        Ok(candidates)
    }
}

#[async_trait]
impl NearbyProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn nearby(
        &self,
        origin: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<LocationCandidate>, GeocodeError> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let radius_m = (radius_km * 1_000.0).round().max(0.0) as u64;
        let lat = origin.latitude.to_string();
        let lon = origin.longitude.to_string();
        let radius = radius_m.to_string();
        let limit = NEARBY_LIMIT.to_string();
        let url = self.search_url(&[
            ("format", "json"),
            ("q", ""),
            ("lat", &lat),
            ("lon", &lon),
            ("radius", &radius),
            ("limit", &limit),
            ("addressdetails", "1"),
        ])?;
        let raw = self.fetch(url).await?;
        let raw_count = raw.len();
        let candidates = normalize_nominatim(raw, AreaPolicy::RequirePlace);
        tracing::debug!(
            provider = PROVIDER,
            raw_count,
            count = candidates.len(),
            "nearby results normalized"
        );
        Ok(candidates)
    }
}
