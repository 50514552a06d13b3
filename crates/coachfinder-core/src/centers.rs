//! Client-side filtering and sorting of coaching-center result sets.
//!
//! The backend returns centers unfiltered; the search screen narrows them by
//! free text, delivery mode, subject, rating, fee and distance, then orders
//! them. [`apply_center_query`] is the whole pipeline.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::geo::haversine_km;
use crate::location::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterMode {
    Offline,
    Online,
    Private,
}

impl std::str::FromStr for CenterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(CenterMode::Offline),
            "online" => Ok(CenterMode::Online),
            "private" => Ok(CenterMode::Private),
            other => Err(format!("unknown center mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingCenter {
    pub id: String,
    pub name: String,
    pub mode: CenterMode,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub monthly_fee: Option<f64>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CenterSort {
    /// Keep backend order.
    #[default]
    Relevance,
    RatingDesc,
    FeeAsc,
    FeeDesc,
    /// Nearest first. Requires [`CenterQuery::near`]; otherwise behaves like
    /// `Relevance`.
    Distance,
}

impl std::str::FromStr for CenterSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(CenterSort::Relevance),
            "rating" => Ok(CenterSort::RatingDesc),
            "fee" | "fee-asc" => Ok(CenterSort::FeeAsc),
            "fee-desc" => Ok(CenterSort::FeeDesc),
            "distance" => Ok(CenterSort::Distance),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CenterQuery {
    /// Case-insensitive substring matched against name, area and subjects.
    pub text: Option<String>,
    pub mode: Option<CenterMode>,
    pub subject: Option<String>,
    pub min_rating: Option<f64>,
    pub max_fee: Option<f64>,
    /// Reference point and radius in kilometres.
    pub near: Option<(Coordinates, f64)>,
    pub sort: CenterSort,
}

/// A center that survived filtering, with its distance from
/// [`CenterQuery::near`] when one was given.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCenter {
    pub center: CoachingCenter,
    pub distance_km: Option<f64>,
}

/// Filters then sorts `centers` according to `query`.
///
/// Sorting is stable, so ties keep backend order. Centers missing the field a
/// sort depends on are placed last. When `near` is set, centers without
/// coordinates are excluded because their distance cannot be checked.
#[must_use]
pub fn apply_center_query(centers: Vec<CoachingCenter>, query: &CenterQuery) -> Vec<RankedCenter> {
    let needle = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    let subject = query
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut ranked: Vec<RankedCenter> = centers
        .into_iter()
        .filter(|c| needle.as_deref().is_none_or(|n| matches_text(c, n)))
        .filter(|c| query.mode.is_none_or(|m| c.mode == m))
        .filter(|c| {
            subject
                .as_deref()
                .is_none_or(|s| c.subjects.iter().any(|cs| cs.to_lowercase() == s))
        })
        .filter(|c| {
            query
                .min_rating
                .is_none_or(|min| c.rating.is_some_and(|r| r >= min))
        })
        .filter(|c| {
            query
                .max_fee
                .is_none_or(|max| c.monthly_fee.is_some_and(|fee| fee <= max))
        })
        .filter_map(|center| {
            let Some((origin, radius_km)) = query.near else {
                return Some(RankedCenter {
                    center,
                    distance_km: None,
                });
            };
            let distance = haversine_km(origin, center.coordinates?);
            (distance <= radius_km).then_some(RankedCenter {
                center,
                distance_km: Some(distance),
            })
        })
        .collect();

    match query.sort {
        CenterSort::Relevance => {}
        CenterSort::RatingDesc => {
            ranked.sort_by(|a, b| cmp_missing_last(a.center.rating, b.center.rating, true));
        }
        CenterSort::FeeAsc => {
            ranked.sort_by(|a, b| {
                cmp_missing_last(a.center.monthly_fee, b.center.monthly_fee, false)
            });
        }
        CenterSort::FeeDesc => {
            ranked.sort_by(|a, b| {
                cmp_missing_last(a.center.monthly_fee, b.center.monthly_fee, true)
            });
        }
        CenterSort::Distance => {
            ranked.sort_by(|a, b| cmp_missing_last(a.distance_km, b.distance_km, false));
        }
    }

    ranked
}

fn matches_text(center: &CoachingCenter, needle: &str) -> bool {
    center.name.to_lowercase().contains(needle)
        || center
            .area
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(needle))
        || center
            .subjects
            .iter()
            .any(|s| s.to_lowercase().contains(needle))
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
