//! Keyed Places autocomplete client. Better accuracy, needs an API key.

use async_trait::async_trait;
use coachfinder_core::LocationCandidate;
use reqwest::Client;

use super::{build_http_client, normalise_base_url, send_for_text, GeocodingProvider};
use crate::error::GeocodeError;
use crate::normalize::normalize_places;
use crate::types::{AutocompleteRequest, CountryComponent, PlacesResponse};

const PROVIDER: &str = "places";
const MAX_RESULT_COUNT: usize = 8;
const PLACE_TYPES: &[&str] = &["(regions)"];
const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location";

pub struct PlacesProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    country_code: String,
    country_name: String,
}

impl PlacesProvider {
    /// A provider without an API key can be constructed; every search on it
    /// fails with [`GeocodeError::MissingApiKey`] so the fallback still runs.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Client`] if the HTTP client cannot be built, or
    /// [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        user_agent: &str,
        timeout_secs: u64,
        country_code: &str,
        country_name: &str,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            client: build_http_client(user_agent, timeout_secs)?,
            base_url: normalise_base_url(base_url)?,
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
            country_code: country_code.to_ascii_lowercase(),
            country_name: country_name.to_owned(),
        })
    }

    // `Url::join` would read the colon in `places:autocomplete` as a scheme.
    fn autocomplete_url(&self) -> String {
        format!("{}/places:autocomplete", self.base_url)
    }
}

#[async_trait]
impl GeocodingProvider for PlacesProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, GeocodeError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GeocodeError::MissingApiKey { provider: PROVIDER })?;

        let body = AutocompleteRequest {
            input: query,
            types: PLACE_TYPES,
            components: vec![CountryComponent {
                country: &self.country_code,
            }],
            max_result_count: MAX_RESULT_COUNT,
        };

        let url = self.autocomplete_url();
        tracing::debug!(provider = PROVIDER, %url, "geocoding request");
        let request = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body);
        let text = send_for_text(PROVIDER, request).await?;

        let response: PlacesResponse =
            serde_json::from_str(&text).map_err(|source| GeocodeError::ProviderParse {
                provider: PROVIDER,
                source,
            })?;
        let raw_count = response.places.len();
        let candidates = normalize_places(response.places, &self.country_name);
        tracing::debug!(
            provider = PROVIDER,
            raw_count,
            count = candidates.len(),
            "search results normalized"
        );
        Ok(candidates)
    }
}
