mod app_config;
pub mod centers;
mod config;
pub mod geo;
pub mod location;
pub mod store;

pub use app_config::{AppConfig, Environment, ProviderKind, SearchConfig};
pub use centers::{
    apply_center_query, CenterMode, CenterQuery, CenterSort, CoachingCenter, RankedCenter,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::haversine_km;
pub use location::{Coordinates, LocationCandidate, PlaceRecord};
pub use store::{AuthTokenStore, AuthTokens, FileStore, KeyValueStore, MemoryStore, StoreError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
