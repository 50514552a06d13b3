//! Normalization of provider responses into [`LocationCandidate`]s.
//!
//! Each provider has its own shape; everything downstream of this module
//! sees only candidates with finite coordinates and a non-blank name.

use std::collections::HashSet;

use coachfinder_core::{Coordinates, LocationCandidate};

use crate::types::{NominatimAddress, NominatimPlace, PlacesPlace};

/// Which address fields count as the "area" of a Nominatim record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaPolicy {
    /// Text search: city, town or district. Area may end up empty.
    Search,
    /// Nearby search: city, town, village or suburb. Records with none of
    /// these are roads and POIs and are dropped.
    RequirePlace,
}

/// `"<area>, <state>"` with blank parts left out.
#[must_use]
pub fn build_name(area: &str, state: &str) -> String {
    [area.trim(), state.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `true` when `name` is nothing but commas and whitespace.
#[must_use]
pub fn is_blank_name(name: &str) -> bool {
    name.chars().all(|c| c == ',' || c.is_whitespace())
}

/// Parses a provider coordinate pair, rejecting anything non-finite or out of
/// range. Each value may be a JSON number or a numeric string.
#[must_use]
pub fn parse_coordinates(lat: &serde_json::Value, lon: &serde_json::Value) -> Option<Coordinates> {
    let coordinates = Coordinates::new(coordinate(lat)?, coordinate(lon)?);
    coordinates.is_valid().then_some(coordinates)
}

fn coordinate(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_non_blank<'a>(fields: &[&'a Option<String>]) -> Option<&'a str> {
    fields
        .iter()
        .copied()
        .filter_map(Option::as_deref)
        .map(str::trim)
        .find(|v| !v.is_empty())
}

fn nominatim_area(address: &NominatimAddress, policy: AreaPolicy) -> Option<&str> {
    match policy {
        AreaPolicy::Search => first_non_blank(&[&address.city, &address.town, &address.district]),
        AreaPolicy::RequirePlace => first_non_blank(&[
            &address.city,
            &address.town,
            &address.village,
            &address.suburb,
        ]),
    }
}

/// Normalizes Nominatim `/search` results, preserving provider order.
#[must_use]
pub fn normalize_nominatim(places: Vec<NominatimPlace>, policy: AreaPolicy) -> Vec<LocationCandidate> {
    let candidates = places
        .into_iter()
        .enumerate()
        .filter_map(|(idx, place)| {
            let coordinates = match (&place.lat, &place.lon) {
                (Some(lat), Some(lon)) => parse_coordinates(lat, lon),
                _ => None,
            };
            let Some(coordinates) = coordinates else {
                tracing::warn!(
                    provider = "nominatim",
                    lat = ?place.lat,
                    lon = ?place.lon,
                    "dropping result with unparseable coordinates"
                );
                return None;
            };

            let area = match (nominatim_area(&place.address, policy), policy) {
                (Some(area), _) => area.to_string(),
                (None, AreaPolicy::Search) => String::new(),
                (None, AreaPolicy::RequirePlace) => return None,
            };
            let state = first_non_blank(&[&place.address.state])
                .unwrap_or_default()
                .to_string();

            let id = place
                .place_id
                .as_ref()
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| synthesized_id("nominatim", idx));

            Some(LocationCandidate {
                id,
                name: build_name(&area, &state),
                full_address: place.display_name.unwrap_or_default(),
                area,
                state,
                coordinates,
                distance_km: None,
            })
        });

    finish(candidates)
}

/// Normalizes Places autocomplete results, preserving provider order.
///
/// The response carries no structured address, so `state` is recovered from
/// the formatted address: the component before the country, minus any postal
/// code. `area` is the display name, or the first address component.
#[must_use]
pub fn normalize_places(places: Vec<PlacesPlace>, country_name: &str) -> Vec<LocationCandidate> {
    let candidates = places.into_iter().enumerate().filter_map(|(idx, place)| {
        let location = place.location?;
        let coordinates = location
            .latitude
            .zip(location.longitude)
            .map(|(lat, lng)| Coordinates::new(lat, lng))
            .filter(Coordinates::is_valid);
        let Some(coordinates) = coordinates else {
            tracing::warn!(
                provider = "places",
                latitude = ?location.latitude,
                longitude = ?location.longitude,
                "dropping result with invalid coordinates"
            );
            return None;
        };

        let full_address = place.formatted_address.unwrap_or_default();
        let components = address_components(&full_address, country_name);

        let area = place
            .display_name
            .as_ref()
            .map(|d| d.text().trim().to_string())
            .filter(|d| !d.is_empty())
            .or_else(|| components.first().map(|c| (*c).to_string()))
            .unwrap_or_default();
        let state = components
            .last()
            .filter(|_| components.len() > 1)
            .map(|c| strip_postal_code(c).to_string())
            .unwrap_or_default();

        Some(LocationCandidate {
            id: place
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| synthesized_id("places", idx)),
            name: build_name(&area, &state),
            full_address,
            area,
            state,
            coordinates,
            distance_km: None,
        })
    });

    finish(candidates)
}

/// Address components with the trailing country removed.
fn address_components<'a>(full_address: &'a str, country_name: &str) -> Vec<&'a str> {
    let mut components: Vec<&str> = full_address
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if components
        .last()
        .is_some_and(|c| c.eq_ignore_ascii_case(country_name))
    {
        components.pop();
    }
    components
}

/// `"Maharashtra 400092"` → `"Maharashtra"`.
fn strip_postal_code(component: &str) -> &str {
    component
        .trim_end_matches(|c: char| c.is_ascii_digit() || c.is_whitespace())
        .trim()
}

fn synthesized_id(provider: &str, idx: usize) -> String {
    format!("{provider}-{idx}")
}

/// Drops blank names and makes ids unique within the set.
fn finish(candidates: impl Iterator<Item = LocationCandidate>) -> Vec<LocationCandidate> {
    let mut seen = HashSet::new();
    candidates
        .filter(|c| !is_blank_name(&c.name))
        .enumerate()
        .map(|(idx, mut c)| {
            if seen.contains(&c.id) {
                let mut suffix = idx;
                let mut id = format!("{}-{suffix}", c.id);
                while seen.contains(&id) {
                    suffix += 1;
                    id = format!("{}-{suffix}", c.id);
                }
                c.id = id;
            }
            seen.insert(c.id.clone());
            c
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
