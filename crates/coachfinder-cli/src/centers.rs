//! `centers` command: filter and sort a local coaching-center listing.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use coachfinder_core::{
    apply_center_query, CenterMode, CenterQuery, CenterSort, CoachingCenter, Coordinates,
    RankedCenter,
};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct CenterArgs {
    /// Case-insensitive match on name, area or subject
    #[arg(long)]
    text: Option<String>,
    /// offline, online or private
    #[arg(long)]
    mode: Option<CenterMode>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    min_rating: Option<f64>,
    #[arg(long)]
    max_fee: Option<f64>,
    /// Latitude of the reference point for radius filtering
    #[arg(long, requires = "near_lon", allow_hyphen_values = true)]
    near_lat: Option<f64>,
    #[arg(long, requires = "near_lat", allow_hyphen_values = true)]
    near_lon: Option<f64>,
    /// Radius in kilometres around --near-lat/--near-lon
    #[arg(long, default_value = "10")]
    radius: f64,
    /// relevance, rating, fee, fee-desc or distance
    #[arg(long, default_value = "relevance")]
    sort: CenterSort,
}

impl CenterArgs {
    fn to_query(&self) -> anyhow::Result<CenterQuery> {
        let near = match (self.near_lat, self.near_lon) {
            (Some(lat), Some(lon)) => {
                let origin = Coordinates::new(lat, lon);
                anyhow::ensure!(origin.is_valid(), "invalid reference point ({lat}, {lon})");
                Some((origin, self.radius))
            }
            _ => None,
        };
        Ok(CenterQuery {
            text: self.text.clone(),
            mode: self.mode,
            subject: self.subject.clone(),
            min_rating: self.min_rating,
            max_fee: self.max_fee,
            near,
            sort: self.sort,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CenterRow<'a> {
    #[serde(flatten)]
    center: &'a CoachingCenter,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
}

/// Load centers from `file`, apply the filters and print the survivors.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// centers, or the reference point is invalid.
pub(crate) fn run_centers(file: &Path, args: &CenterArgs, json: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let centers: Vec<CoachingCenter> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of centers", file.display()))?;
    let total = centers.len();

    let ranked = apply_center_query(centers, &args.to_query()?);
    tracing::info!(total, matched = ranked.len(), "centers filtered");
    print_centers(&ranked, json)
}

fn print_centers(ranked: &[RankedCenter], json: bool) -> anyhow::Result<()> {
    if json {
        let rows: Vec<CenterRow<'_>> = ranked
            .iter()
            .map(|r| CenterRow {
                center: &r.center,
                distance_km: r.distance_km,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if ranked.is_empty() {
        println!("no centers match");
        return Ok(());
    }

    println!(
        "{:<28}{:<9}{:>7}{:>10}{:>8}  AREA",
        "NAME", "MODE", "RATING", "FEE", "KM"
    );
    for r in ranked {
        let c = &r.center;
        println!(
            "{:<28}{:<9}{:>7}{:>10}{:>8}  {}",
            c.name,
            mode_label(c.mode),
            fmt_opt(c.rating, 1),
            fmt_opt(c.monthly_fee, 0),
            fmt_opt(r.distance_km, 1),
            c.area.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn mode_label(mode: CenterMode) -> &'static str {
    match mode {
        CenterMode::Offline => "offline",
        CenterMode::Online => "online",
        CenterMode::Private => "private",
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args() -> CenterArgs {
        CenterArgs {
            text: None,
            mode: None,
            subject: None,
            min_rating: None,
            max_fee: None,
            near_lat: None,
            near_lon: None,
            radius: 10.0,
            sort: CenterSort::Relevance,
        }
    }

    #[test]
    fn near_requires_valid_point() {
        let mut a = args();
        a.near_lat = Some(95.0);
        a.near_lon = Some(72.0);
        assert!(a.to_query().is_err());

        a.near_lat = Some(19.0);
        let query = a.to_query().unwrap();
        assert_eq!(query.near.map(|(_, r)| r), Some(10.0));
    }

    #[test]
    fn run_centers_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"1","name":"Apex Classes","mode":"offline","subjects":["Maths"],"rating":4.5}}]"#
        )
        .unwrap();
        run_centers(file.path(), &args(), true).unwrap();
    }

    #[test]
    fn run_centers_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"id":"1"}}"#).unwrap();
        let err = run_centers(file.path(), &args(), false).unwrap_err();
        assert!(err.to_string().contains("not a JSON array"));
    }
}
