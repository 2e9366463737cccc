//! Geocoding
//!
//! Address lookups against Google or Nominatim, with answers cached
//! through a [`GeocodeCache`] delegate (Redis when configured, in-process
//! otherwise), plus distance calculations between coordinates.

pub mod cache;
pub mod client;
pub mod config;
pub mod distance;

pub use cache::{cache_key, GeocodeCache, MemoryCache, RedisCache};
pub use client::{GeocodeError, GeocodeResult, Geocoder};
pub use config::{DistanceMode, GeocoderConfig, Lookup, Units};
pub use distance::{distance_between, Coordinates};
