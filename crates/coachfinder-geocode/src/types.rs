//! Wire types for the geocoding providers.
//!
//! Fields are optional wherever a provider has been seen to omit them; the
//! normalizer decides what a usable record is.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Nominatim `/search`
// ---------------------------------------------------------------------------

/// One entry of the JSON array returned by Nominatim `/search`.
///
/// `lat`/`lon` are strings on the public instance and numbers on some
/// self-hosted ones; both are parsed during normalization.
#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    /// Numeric on the public instance, string on some self-hosted ones.
    #[serde(default)]
    pub place_id: Option<serde_json::Value>,
    #[serde(default)]
    pub lat: Option<serde_json::Value>,
    #[serde(default)]
    pub lon: Option<serde_json::Value>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

// ---------------------------------------------------------------------------
// Places `places:autocomplete`
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteRequest<'a> {
    pub input: &'a str,
    pub types: &'a [&'a str],
    pub components: Vec<CountryComponent<'a>>,
    pub max_result_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CountryComponent<'a> {
    pub country: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PlacesResponse {
    /// Absent entirely when nothing matched.
    #[serde(default)]
    pub places: Vec<PlacesPlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacesPlace {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<DisplayName>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub location: Option<LatLng>,
}

/// `displayName` is a bare string in older responses and a localized text
/// object in current ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DisplayName {
    Plain(String),
    Localized { text: String },
}

impl DisplayName {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            DisplayName::Plain(text) | DisplayName::Localized { text } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}
