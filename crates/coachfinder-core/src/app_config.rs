use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Geocoding backends the search service knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Free Nominatim-compatible endpoint. No key required.
    Nominatim,
    /// Keyed Places-compatible autocomplete endpoint.
    Places,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Nominatim => "nominatim",
            ProviderKind::Places => "places",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nominatim" | "osm" => Ok(ProviderKind::Nominatim),
            "places" | "google" => Ok(ProviderKind::Places),
            other => Err(format!(
                "unknown geocoding provider '{other}' (expected 'nominatim' or 'places')"
            )),
        }
    }
}

/// Settings for the location search service.
///
/// Passed into the service at construction; nothing in the geocoding crate
/// reads the environment directly.
#[derive(Clone)]
pub struct SearchConfig {
    pub primary_provider: ProviderKind,
    /// `None` disables the second attempt entirely.
    pub fallback_provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub nominatim_url: String,
    pub places_url: String,
    /// Sent as `User-Agent`; Nominatim rejects anonymous clients.
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Appended to free-text queries, e.g. `"Borivali"` → `"Borivali, India"`.
    pub country_name: String,
    /// ISO 3166-1 alpha-2, lower case.
    pub country_code: String,
    pub min_search_length: usize,
    pub debounce_ms: u64,
    /// Extra attempts per provider on transient failures. `0` disables retry.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub nearby_radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            primary_provider: ProviderKind::Places,
            fallback_provider: Some(ProviderKind::Nominatim),
            api_key: None,
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            places_url: "https://places.googleapis.com/v1".to_string(),
            user_agent: "coachfinder/0.1 (location-search)".to_string(),
            request_timeout_secs: 10,
            country_name: "India".to_string(),
            country_code: "in".to_string(),
            min_search_length: 2,
            debounce_ms: 500,
            max_retries: 0,
            retry_delay_ms: 1_000,
            nearby_radius_km: 10.0,
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("primary_provider", &self.primary_provider)
            .field("fallback_provider", &self.fallback_provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("nominatim_url", &self.nominatim_url)
            .field("places_url", &self.places_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("country_name", &self.country_name)
            .field("country_code", &self.country_code)
            .field("min_search_length", &self.min_search_length)
            .field("debounce_ms", &self.debounce_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("nearby_radius_km", &self.nearby_radius_km)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub store_path: PathBuf,
    pub search: SearchConfig,
}
