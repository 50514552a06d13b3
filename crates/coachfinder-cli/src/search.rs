//! Location search command handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use coachfinder_core::{Coordinates, LocationCandidate, SearchConfig};
use coachfinder_geocode::{LocationSearchService, SearchController, SearchSession};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run one free-text search and print the candidates.
///
/// # Errors
///
/// Returns an error if the service cannot be built or every provider fails.
pub(crate) async fn run_search(config: &SearchConfig, query: &str, json: bool) -> anyhow::Result<()> {
    let service = LocationSearchService::from_config(config)?;
    if !service.is_searchable(query) {
        eprintln!(
            "query must be at least {} characters",
            config.min_search_length
        );
        return Ok(());
    }
    let candidates = service.search_by_text(query).await?;
    tracing::info!(query, count = candidates.len(), "search complete");
    print_candidates(&candidates, json)
}

/// List places around `lat`/`lon`.
///
/// # Errors
///
/// Returns an error for invalid coordinates or a failed provider request.
pub(crate) async fn run_nearby(
    config: &SearchConfig,
    lat: f64,
    lon: f64,
    radius: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let service = LocationSearchService::from_config(config)?;
    let origin = Coordinates::new(lat, lon);
    let radius_km = radius.unwrap_or(config.nearby_radius_km);
    anyhow::ensure!(
        radius_km.is_finite() && radius_km > 0.0,
        "radius must be a positive number of kilometres"
    );
    let candidates = service.search_nearby_within(origin, radius_km).await?;
    tracing::info!(lat, lon, radius_km, count = candidates.len(), "nearby search complete");
    print_candidates(&candidates, json)
}

/// Feed stdin lines to a [`SearchController`] as if they were typed.
///
/// `:near <lat>,<lon>` runs a nearby search and `:clear` resets the session.
/// Settled sessions are printed as they change.
///
/// # Errors
///
/// Returns an error if the service cannot be built or stdin fails.
pub(crate) async fn run_interactive(config: &SearchConfig, json: bool) -> anyhow::Result<()> {
    let service = Arc::new(LocationSearchService::from_config(config)?);
    let mut controller = SearchController::new(service);

    let mut rx = controller.subscribe();
    let printer = tokio::spawn(async move {
        let mut last: Option<SearchSession> = None;
        while rx.changed().await.is_ok() {
            let session = rx.borrow_and_update().clone();
            if session.is_searching() || last.as_ref().is_some_and(|l| same_outcome(l, &session)) {
                continue;
            }
            if let Err(e) = print_session(&session, json) {
                tracing::warn!(error = %e, "failed to print session");
            }
            last = Some(session);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if let Some(raw) = line.strip_prefix(":near ") {
            match parse_coordinates(raw) {
                Some(origin) => controller.search_nearby(origin).await,
                None => eprintln!("expected ':near <lat>,<lon>'"),
            }
        } else if line.trim() == ":clear" {
            controller.clear();
        } else {
            controller.on_query_changed(&line);
        }
    }

    // The last line typed may still be waiting on its debounce timer.
    let wait = Duration::from_millis(config.debounce_ms)
        + Duration::from_secs(config.request_timeout_secs.saturating_mul(2).max(1));
    if tokio::time::timeout(wait, controller.flush()).await.is_err() {
        tracing::warn!("gave up waiting for the last search to finish");
    }

    drop(controller);
    printer.await.context("printer task failed")?;
    Ok(())
}

fn same_outcome(a: &SearchSession, b: &SearchSession) -> bool {
    a.results() == b.results()
        && a.search_error() == b.search_error()
        && a.nearby_error() == b.nearby_error()
}

fn parse_coordinates(raw: &str) -> Option<Coordinates> {
    let (lat, lon) = raw.split_once(',')?;
    let origin = Coordinates::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?);
    origin.is_valid().then_some(origin)
}

fn print_session(session: &SearchSession, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(session)?);
        return Ok(());
    }
    if let Some(err) = session.search_error().or(session.nearby_error()) {
        println!("error: {err}");
    }
    println!("[{}]", session.query());
    print_candidates(session.results(), false)
}

fn print_candidates(candidates: &[LocationCandidate], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(candidates)?);
        return Ok(());
    }
    if candidates.is_empty() {
        println!("no locations found");
        return Ok(());
    }

    println!("{:<32}{:<12}{:<12}{:>9}", "NAME", "LAT", "LON", "KM");
    for c in candidates {
        let distance = c
            .distance_km
            .map_or_else(|| "-".to_string(), |d| format!("{d:.1}"));
        println!(
            "{:<32}{:<12.5}{:<12.5}{:>9}",
            truncate(&c.name, 30),
            c.coordinates.latitude,
            c.coordinates.longitude,
            distance
        );
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_near_coordinates() {
        assert_eq!(
            parse_coordinates(" 19.076, 72.8777"),
            Some(Coordinates::new(19.076, 72.8777))
        );
        assert!(parse_coordinates("19.076").is_none());
        assert!(parse_coordinates("91,0").is_none());
        assert!(parse_coordinates("abc,def").is_none());
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Borivali", 30), "Borivali");
        assert_eq!(
            truncate("Chhatrapati Shivaji Maharaj Terminus", 10),
            "Chhatra..."
        );
    }
}
