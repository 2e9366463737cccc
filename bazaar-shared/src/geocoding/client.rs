//! HTTP geocoding client
//!
//! Forward (`search`) and reverse (`reverse`) lookups against the
//! configured service. Failures are returned as they happen: there is no
//! retry and no fallback to another service.

use super::cache::{cache_key, GeocodeCache};
use super::config::{GeocoderConfig, Lookup};
use super::distance::{distance_between, Coordinates};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Errors returned by geocoding lookups
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// Transport failure, including timeouts
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Geocoding service returned HTTP {0}")]
    Status(u16),

    /// The service answered with an error status in its payload
    #[error("Geocoding service error {status}: {message}")]
    Service { status: String, message: String },

    /// The response body could not be understood
    #[error("Invalid geocoding response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// Request URL could not be built
    #[error("Invalid geocoding URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Formatted address
    pub address: String,

    /// Position of the place
    pub coordinates: Coordinates,
}

/// Geocoding client
///
/// Cheap to clone; the HTTP client and cache are shared.
#[derive(Clone)]
pub struct Geocoder {
    config: Arc<GeocoderConfig>,
    http: reqwest::Client,
    cache: Option<Arc<dyn GeocodeCache>>,
}

impl std::fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geocoder")
            .field("lookup", &self.config.lookup)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl Geocoder {
    /// Creates a client from configuration and an optional cache
    pub fn new(
        config: GeocoderConfig,
        cache: Option<Arc<dyn GeocodeCache>>,
    ) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("bazaar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            lookup = ?config.lookup,
            language = %config.language,
            timeout_seconds = config.timeout_seconds,
            cached = cache.is_some(),
            "Geocoder configured"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            cache,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    /// Looks up places matching a free-text address
    pub async fn search(&self, address: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let url = self.search_url(address)?;
        self.lookup(url).await
    }

    /// Looks up places at a position
    pub async fn reverse(&self, at: Coordinates) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let url = self.reverse_url(at)?;
        self.lookup(url).await
    }

    /// Distance between two positions in the configured unit and mode
    pub fn distance_between(&self, a: Coordinates, b: Coordinates) -> f64 {
        distance_between(a, b, self.config.units, self.config.distances)
    }

    pub(crate) fn search_url(&self, address: &str) -> Result<Url, GeocodeError> {
        let mut url = self.base_url(false)?;
        {
            let mut query = url.query_pairs_mut();
            match self.config.lookup {
                Lookup::Google => {
                    query.append_pair("address", address);
                    query.append_pair("language", &self.config.language);
                    if let Some(key) = &self.config.api_key {
                        query.append_pair("key", key);
                    }
                }
                Lookup::Nominatim => {
                    query.append_pair("q", address);
                    query.append_pair("format", "json");
                    query.append_pair("accept-language", &self.config.language);
                }
            }
        }
        Ok(url)
    }

    pub(crate) fn reverse_url(&self, at: Coordinates) -> Result<Url, GeocodeError> {
        let mut url = self.base_url(true)?;
        {
            let mut query = url.query_pairs_mut();
            match self.config.lookup {
                Lookup::Google => {
                    query.append_pair("latlng", &format!("{},{}", at.latitude, at.longitude));
                    query.append_pair("language", &self.config.language);
                    if let Some(key) = &self.config.api_key {
                        query.append_pair("key", key);
                    }
                }
                Lookup::Nominatim => {
                    query.append_pair("lat", &at.latitude.to_string());
                    query.append_pair("lon", &at.longitude.to_string());
                    query.append_pair("format", "json");
                    query.append_pair("accept-language", &self.config.language);
                }
            }
        }
        Ok(url)
    }

    fn base_url(&self, reverse: bool) -> Result<Url, GeocodeError> {
        let path = match (self.config.lookup, reverse) {
            (Lookup::Google, _) => "maps.googleapis.com/maps/api/geocode/json",
            (Lookup::Nominatim, false) => "nominatim.openstreetmap.org/search",
            (Lookup::Nominatim, true) => "nominatim.openstreetmap.org/reverse",
        };
        Ok(Url::parse(&format!("{}://{}", self.config.scheme(), path))?)
    }

    async fn lookup(&self, url: Url) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let key = cache_key(&self.config.cache_prefix, url.as_str());

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.read(&key).await {
                debug!("Geocode cache hit");
                return self.parse(&body);
            }
        }

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Geocoding service returned an error status");
            return Err(GeocodeError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let results = self.parse(&body)?;

        if let Some(cache) = &self.cache {
            cache
                .write(&key, &body, self.config.cache_ttl_seconds)
                .await;
        }

        debug!(results = results.len(), "Geocode lookup finished");
        Ok(results)
    }

    fn parse(&self, body: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
        match self.config.lookup {
            Lookup::Google => parse_google(body),
            Lookup::Nominatim => parse_nominatim(body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GooglePlace>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GooglePlace {
    formatted_address: String,
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

fn parse_google(body: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
    let response: GoogleResponse = serde_json::from_str(body)?;

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response
            .results
            .into_iter()
            .map(|place| GeocodeResult {
                address: place.formatted_address,
                coordinates: Coordinates {
                    latitude: place.geometry.location.lat,
                    longitude: place.geometry.location.lng,
                },
            })
            .collect()),
        _ => Err(GeocodeError::Service {
            message: response.error_message.unwrap_or_default(),
            status: response.status,
        }),
    }
}

// Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NominatimResponse {
    Many(Vec<NominatimPlace>),
    One(NominatimPlace),
    Error { error: String },
}

fn parse_nominatim(body: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
    let places = match serde_json::from_str::<NominatimResponse>(body)? {
        NominatimResponse::Many(places) => places,
        NominatimResponse::One(place) => vec![place],
        // Reverse lookups with nothing at the position
        NominatimResponse::Error { error } if error == "Unable to geocode" => Vec::new(),
        NominatimResponse::Error { error } => {
            return Err(GeocodeError::Service {
                status: "ERROR".to_string(),
                message: error,
            })
        }
    };

    Ok(places
        .into_iter()
        .filter_map(|place| {
            let latitude = place.lat.parse().ok()?;
            let longitude = place.lon.parse().ok()?;
            Some(GeocodeResult {
                address: place.display_name,
                coordinates: Coordinates {
                    latitude,
                    longitude,
                },
            })
        })
        .collect())
}
