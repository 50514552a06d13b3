//! Location types shared by the geocoding client, the session layer, and the
//! center filter pipeline.

use serde::{Deserialize, Serialize};

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `true` when both components are finite and inside the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A normalized location search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCandidate {
    pub id: String,
    /// Short label, `"<area>, <state>"` with blank parts omitted.
    pub name: String,
    pub full_address: String,
    pub area: String,
    pub state: String,
    pub coordinates: Coordinates,
    /// Great-circle distance from the nearby-search origin. Only set by
    /// nearby search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// A place record as produced by a device reverse-geocoding facility.
///
/// Every field is optional because platform geocoders fill them in
/// inconsistently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl PlaceRecord {
    /// City-level name: city, then district, then subregion.
    #[must_use]
    pub fn area(&self) -> Option<&str> {
        [&self.city, &self.district, &self.subregion]
            .into_iter()
            .find_map(|field| non_blank(field.as_deref()))
    }

    #[must_use]
    pub fn state(&self) -> Option<&str> {
        non_blank(self.region.as_deref())
    }

    /// Human-readable single-line address built from the populated fields.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for field in [
            &self.name,
            &self.street,
            &self.city,
            &self.region,
            &self.postal_code,
            &self.country,
        ] {
            if let Some(value) = non_blank(field.as_deref()) {
                if !parts.contains(&value) {
                    parts.push(value);
                }
            }
        }
        parts.join(", ")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
