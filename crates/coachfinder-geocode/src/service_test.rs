use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use coachfinder_core::PlaceRecord;

use super::*;

// -----------------------------------------------------------------------
// fakes
// -----------------------------------------------------------------------

enum Script {
    Ok(Vec<LocationCandidate>),
    Status(u16),
    MissingKey,
}

struct FakeProvider {
    name: &'static str,
    script: Script,
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl FakeProvider {
    fn new(name: &'static str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name,
            script,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn result(&self) -> Result<Vec<LocationCandidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Ok(c) => Ok(c.clone()),
            Script::Status(status) => Err(GeocodeError::ProviderStatus {
                provider: self.name,
                status: *status,
            }),
            Script::MissingKey => Err(GeocodeError::MissingApiKey {
                provider: self.name,
            }),
        }
    }
}

#[async_trait]
impl GeocodingProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>, GeocodeError> {
        *self.last_query.lock().unwrap() = Some(query.to_owned());
        self.result()
    }
}

#[async_trait]
impl NearbyProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn nearby(
        &self,
        _origin: Coordinates,
        _radius_km: f64,
    ) -> Result<Vec<LocationCandidate>, GeocodeError> {
        self.result()
    }
}

struct FakeLocator {
    permission: PermissionStatus,
    records: Vec<PlaceRecord>,
}

#[async_trait]
impl DeviceLocator for FakeLocator {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(MUMBAI)
    }

    async fn reverse_geocode(
        &self,
        _coordinates: Coordinates,
    ) -> Result<Vec<PlaceRecord>, LocationError> {
        Ok(self.records.clone())
    }
}

const MUMBAI: Coordinates = Coordinates::new(19.0760, 72.8777);
/// Degrees of latitude per kilometre at R = 6371 km.
const DEG_PER_KM: f64 = 180.0 / (std::f64::consts::PI * 6371.0);

fn candidate(id: &str, coordinates: Coordinates) -> LocationCandidate {
    LocationCandidate {
        id: id.to_owned(),
        name: format!("{id}, Maharashtra"),
        full_address: format!("{id}, Maharashtra, India"),
        area: id.to_owned(),
        state: "Maharashtra".to_owned(),
        coordinates,
        distance_km: None,
    }
}

fn north_of_mumbai(id: &str, km: f64) -> LocationCandidate {
    candidate(
        id,
        Coordinates::new(MUMBAI.latitude + km * DEG_PER_KM, MUMBAI.longitude),
    )
}

fn service(
    primary: Arc<FakeProvider>,
    fallback: Option<Arc<FakeProvider>>,
    nearby: Arc<FakeProvider>,
) -> LocationSearchService {
    LocationSearchService::new(
        primary,
        fallback.map(|f| f as Arc<dyn GeocodingProvider>),
        nearby,
        SearchConfig::default(),
    )
}

fn idle() -> Arc<FakeProvider> {
    FakeProvider::new("idle", Script::Ok(Vec::new()))
}

// -----------------------------------------------------------------------
// search_by_text
// -----------------------------------------------------------------------

#[tokio::test]
async fn short_query_returns_empty_without_calling_providers() {
    let primary = FakeProvider::new("primary", Script::Status(500));
    let fallback = FakeProvider::new("fallback", Script::Status(500));
    let svc = service(Arc::clone(&primary), Some(Arc::clone(&fallback)), idle());

    for query in ["", "a", "  a  ", " "] {
        assert!(svc.search_by_text(query).await.unwrap().is_empty());
    }
    assert_eq!(primary.calls() + fallback.calls(), 0);
}

#[tokio::test]
async fn query_is_trimmed_and_qualified_with_country() {
    let primary = FakeProvider::new("primary", Script::Ok(Vec::new()));
    let svc = service(Arc::clone(&primary), None, idle());

    svc.search_by_text("  Borivali ").await.unwrap();
    assert_eq!(
        primary.last_query.lock().unwrap().as_deref(),
        Some("Borivali, India")
    );
}

#[tokio::test]
async fn primary_failure_falls_back() {
    let primary = FakeProvider::new("places", Script::Status(403));
    let fallback = FakeProvider::new(
        "nominatim",
        Script::Ok(vec![candidate("Borivali", MUMBAI)]),
    );
    let svc = service(Arc::clone(&primary), Some(Arc::clone(&fallback)), idle());

    let out = svc.search_by_text("Borivali").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].name, "Borivali, Maharashtra");
    assert_eq!(primary.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn missing_key_falls_back() {
    let primary = FakeProvider::new("places", Script::MissingKey);
    let fallback = FakeProvider::new("nominatim", Script::Ok(vec![candidate("Thane", MUMBAI)]));
    let svc = service(primary, Some(fallback), idle());

    assert_eq!(svc.search_by_text("Thane").await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_primary_answer_does_not_fall_back() {
    let primary = FakeProvider::new("places", Script::Ok(Vec::new()));
    let fallback = FakeProvider::new("nominatim", Script::Ok(vec![candidate("X", MUMBAI)]));
    let svc = service(primary, Some(Arc::clone(&fallback)), idle());

    assert!(svc.search_by_text("zzzz").await.unwrap().is_empty());
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn both_failing_reports_both_causes() {
    let primary = FakeProvider::new("places", Script::Status(403));
    let fallback = FakeProvider::new("nominatim", Script::Status(503));
    let svc = service(primary, Some(fallback), idle());

    let err = svc.search_by_text("Borivali").await.unwrap_err();
    let GeocodeError::SearchFailed { primary, fallback } = err else {
        panic!("expected SearchFailed");
    };
    assert!(matches!(*primary, GeocodeError::ProviderStatus { status: 403, .. }));
    assert!(matches!(
        fallback.as_deref(),
        Some(GeocodeError::ProviderStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn primary_failure_without_fallback_is_search_failed() {
    let svc = service(FakeProvider::new("places", Script::Status(500)), None, idle());
    let err = svc.search_by_text("Borivali").await.unwrap_err();
    assert!(matches!(err, GeocodeError::SearchFailed { fallback: None, .. }));
}

#[tokio::test]
async fn text_results_are_capped_in_provider_order() {
    let many: Vec<_> = (0..12)
        .map(|i| candidate(&format!("p{i}"), MUMBAI))
        .collect();
    let svc = service(FakeProvider::new("places", Script::Ok(many)), None, idle());

    let out = svc.search_by_text("Mumbai").await.unwrap();
    assert_eq!(out.len(), MAX_TEXT_RESULTS);
    assert_eq!(out[0].id, "p0");
    assert_eq!(out[7].id, "p7");
}

// -----------------------------------------------------------------------
// nearby
// -----------------------------------------------------------------------

#[test]
fn ranking_filters_by_radius_and_sorts_nearest_first() {
    let raw = vec![
        north_of_mumbai("a", 2.1),
        north_of_mumbai("b", 15.0),
        north_of_mumbai("c", 5.5),
    ];
    let out = rank_by_distance(raw, MUMBAI, 10.0);
    let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "c"]);
    assert!((out[0].distance_km.unwrap() - 2.1).abs() < 1e-6);
    assert!((out[1].distance_km.unwrap() - 5.5).abs() < 1e-6);
}

#[test]
fn ranking_caps_at_ten() {
    let raw: Vec<_> = (0..15)
        .map(|i| north_of_mumbai(&format!("p{i}"), f64::from(i) * 0.5))
        .collect();
    let out = rank_by_distance(raw, MUMBAI, 10.0);
    assert_eq!(out.len(), MAX_NEARBY_RESULTS);
    assert!(out
        .windows(2)
        .all(|w| w[0].distance_km.unwrap() <= w[1].distance_km.unwrap()));
}

#[tokio::test]
async fn nearby_uses_configured_radius() {
    let nearby = FakeProvider::new(
        "nominatim",
        Script::Ok(vec![north_of_mumbai("far", 12.0), north_of_mumbai("near", 1.0)]),
    );
    let svc = service(idle(), None, nearby);
    let out = svc.search_nearby(MUMBAI).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "near");
}

#[tokio::test]
async fn nearby_rejects_invalid_origin() {
    let nearby = idle();
    let svc = service(idle(), None, Arc::clone(&nearby));
    let err = svc
        .search_nearby(Coordinates::new(f64::NAN, 72.0))
        .await
        .unwrap_err();
    assert!(matches!(err, GeocodeError::InvalidCoordinates { .. }));
    assert_eq!(nearby.calls(), 0);
}

#[tokio::test]
async fn nearby_provider_failure_is_wrapped() {
    let svc = service(idle(), None, FakeProvider::new("nominatim", Script::Status(502)));
    let err = svc.search_nearby(MUMBAI).await.unwrap_err();
    assert!(matches!(err, GeocodeError::NearbyFailed(_)));
}

// -----------------------------------------------------------------------
// geolocation
// -----------------------------------------------------------------------

#[tokio::test]
async fn reverse_geocode_without_locator_is_unavailable() {
    let svc = service(idle(), None, idle());
    assert!(matches!(
        svc.reverse_geocode(MUMBAI).await,
        Err(LocationError::Unavailable(_))
    ));
}

#[tokio::test]
async fn reverse_geocode_with_no_records_is_not_found() {
    let svc = service(idle(), None, idle()).with_locator(Arc::new(FakeLocator {
        permission: PermissionStatus::Granted,
        records: Vec::new(),
    }));
    assert_eq!(
        svc.reverse_geocode(MUMBAI).await.unwrap(),
        ReverseGeocodeOutcome::NotFound
    );
}

#[tokio::test]
async fn current_location_requires_permission() {
    let denied = service(idle(), None, idle()).with_locator(Arc::new(FakeLocator {
        permission: PermissionStatus::Denied,
        records: Vec::new(),
    }));
    assert_eq!(
        denied.current_location().await,
        Err(LocationError::PermissionDenied)
    );

    let granted = service(idle(), None, idle()).with_locator(Arc::new(FakeLocator {
        permission: PermissionStatus::Granted,
        records: Vec::new(),
    }));
    assert_eq!(granted.current_location().await.unwrap(), MUMBAI);
}
