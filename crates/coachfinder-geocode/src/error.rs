use thiserror::Error;

/// Errors returned by the location search service and its providers.
///
/// Provider-level variants (`ProviderTransport`, `ProviderStatus`,
/// `MissingApiKey`, `ProviderParse`) describe a single attempt against one
/// backend. The service folds them into `SearchFailed` or `NearbyFailed`
/// before returning, so callers of [`crate::LocationSearchService`] only ever
/// see those two plus `InvalidCoordinates`.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The `reqwest::Client` could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Network failure or timeout talking to a provider.
    #[error("{provider} request failed: {source}")]
    ProviderTransport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status.
    #[error("{provider} returned HTTP {status}")]
    ProviderStatus { provider: &'static str, status: u16 },

    /// A keyed provider was selected but no API key is configured.
    #[error("{provider} requires an API key but none is configured")]
    MissingApiKey { provider: &'static str },

    /// The response body did not have the expected shape.
    #[error("{provider} response could not be parsed: {source}")]
    ProviderParse {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Text search: every configured provider failed.
    #[error("location search failed: {primary}{}", describe_fallback(.fallback))]
    SearchFailed {
        primary: Box<GeocodeError>,
        fallback: Option<Box<GeocodeError>>,
    },

    /// Nearby search: the single nearby provider failed.
    #[error("nearby search failed: {0}")]
    NearbyFailed(#[source] Box<GeocodeError>),

    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

#[allow(clippy::ref_option)]
fn describe_fallback(fallback: &Option<Box<GeocodeError>>) -> String {
    match fallback {
        Some(err) => format!("; fallback: {err}"),
        None => "; no fallback configured".to_string(),
    }
}
