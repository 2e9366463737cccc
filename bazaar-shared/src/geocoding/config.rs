//! Geocoder configuration
//!
//! Read once at startup. Defaults:
//!
//! | key        | default      |
//! |------------|--------------|
//! | timeout    | 5 seconds    |
//! | lookup     | `google`     |
//! | language   | `vi`         |
//! | use_https  | `true`       |
//! | api_key    | none         |
//! | cache      | `geocoder:`  |
//! | units      | `km`         |
//! | distances  | `spherical`  |

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Geocoding service to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
    /// Google Maps Geocoding API (needs an API key)
    Google,

    /// OpenStreetMap Nominatim
    Nominatim,
}

impl FromStr for Lookup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Lookup::Google),
            "nominatim" => Ok(Lookup::Nominatim),
            other => Err(format!("unknown geocoding lookup `{}`", other)),
        }
    }
}

/// Unit for reported distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Km,
    Mi,
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "km" => Ok(Units::Km),
            "mi" => Ok(Units::Mi),
            other => Err(format!("unknown distance unit `{}`", other)),
        }
    }
}

/// How distances between coordinates are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    /// Great-circle (haversine) distance
    Spherical,

    /// Flat-earth approximation, fine over short distances
    Linear,
}

impl FromStr for DistanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spherical" => Ok(DistanceMode::Spherical),
            "linear" => Ok(DistanceMode::Linear),
            other => Err(format!("unknown distance mode `{}`", other)),
        }
    }
}

/// Process-wide geocoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Request timeout (seconds)
    pub timeout_seconds: u64,

    /// Service to query
    pub lookup: Lookup,

    /// ISO-639 language code for results
    pub language: String,

    /// Query over HTTPS
    pub use_https: bool,

    /// Service API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Prefix for cache keys
    pub cache_prefix: String,

    /// Cache entry lifetime (seconds), `None` keeps entries forever
    pub cache_ttl_seconds: Option<u64>,

    /// Distance unit
    pub units: Units,

    /// Distance calculation
    pub distances: DistanceMode,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            lookup: Lookup::Google,
            language: "vi".to_string(),
            use_https: true,
            api_key: None,
            cache_prefix: "geocoder:".to_string(),
            cache_ttl_seconds: None,
            units: Units::Km,
            distances: DistanceMode::Spherical,
        }
    }
}

impl GeocoderConfig {
    /// Reads `GEOCODER_*` variables over the defaults
    ///
    /// # Environment Variables
    ///
    /// - `GEOCODER_TIMEOUT`
    /// - `GEOCODER_LOOKUP` (`google` | `nominatim`)
    /// - `GEOCODER_LANGUAGE`
    /// - `GEOCODER_USE_HTTPS`
    /// - `GEOCODER_API_KEY`
    /// - `GEOCODER_CACHE_PREFIX`
    /// - `GEOCODER_CACHE_TTL`
    /// - `GEOCODER_UNITS` (`km` | `mi`)
    /// - `GEOCODER_DISTANCES` (`spherical` | `linear`)
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        Ok(Self {
            timeout_seconds: parse_var("GEOCODER_TIMEOUT", defaults.timeout_seconds)?,
            lookup: parse_var("GEOCODER_LOOKUP", defaults.lookup)?,
            language: env::var("GEOCODER_LANGUAGE").unwrap_or(defaults.language),
            use_https: parse_var("GEOCODER_USE_HTTPS", defaults.use_https)?,
            api_key: env::var("GEOCODER_API_KEY").ok().filter(|k| !k.is_empty()),
            cache_prefix: env::var("GEOCODER_CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_ttl_seconds: match env::var("GEOCODER_CACHE_TTL") {
                Ok(v) => Some(
                    v.parse()
                        .map_err(|_| format!("GEOCODER_CACHE_TTL: invalid value `{}`", v))?,
                ),
                Err(_) => None,
            },
            units: parse_var("GEOCODER_UNITS", defaults.units)?,
            distances: parse_var("GEOCODER_DISTANCES", defaults.distances)?,
        })
    }

    /// URL scheme for lookups
    pub fn scheme(&self) -> &'static str {
        if self.use_https {
            "https"
        } else {
            "http"
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| format!("{}: invalid value `{}` ({})", name, value, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeocoderConfig::default();
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.lookup, Lookup::Google);
        assert_eq!(config.language, "vi");
        assert!(config.use_https);
        assert_eq!(config.scheme(), "https");
        assert_eq!(config.cache_prefix, "geocoder:");
        assert_eq!(config.units, Units::Km);
        assert_eq!(config.distances, DistanceMode::Spherical);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Google".parse::<Lookup>(), Ok(Lookup::Google));
        assert_eq!("nominatim".parse::<Lookup>(), Ok(Lookup::Nominatim));
        assert!("bing".parse::<Lookup>().is_err());

        assert_eq!("MI".parse::<Units>(), Ok(Units::Mi));
        assert_eq!("linear".parse::<DistanceMode>(), Ok(DistanceMode::Linear));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = GeocoderConfig {
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
