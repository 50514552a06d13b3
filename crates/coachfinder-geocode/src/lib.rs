//! Location search for coachfinder: free-text geocoding with provider
//! fallback, nearby place search ranked by distance, and the debounced
//! session layer a UI drives.

pub mod controller;
pub mod debounce;
pub mod error;
pub mod geolocation;
pub mod normalize;
pub mod provider;
mod retry;
pub mod service;
pub mod session;
pub mod types;

pub use controller::SearchController;
pub use debounce::Debouncer;
pub use error::GeocodeError;
pub use geolocation::{
    DeviceLocator, LocationError, PermissionStatus, ResolvedPlace, ReverseGeocodeOutcome,
};
pub use provider::{GeocodingProvider, NearbyProvider, NominatimProvider, PlacesProvider};
pub use service::{LocationSearchService, MAX_NEARBY_RESULTS, MAX_TEXT_RESULTS};
pub use session::{SearchSession, SearchTicket, MAX_RECENT_SEARCHES};
