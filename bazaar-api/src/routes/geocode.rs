/// Geocoding endpoints
///
/// # Endpoints
///
/// - `GET /v1/geocode?address=` - Places matching an address
/// - `GET /v1/geocode/reverse?lat=&lon=` - Places at a position
/// - `GET /v1/geocode/distance?from_lat=&from_lon=&to_lat=&to_lon=` - Distance
///   in the configured unit

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Json,
};
use bazaar_shared::{
    geocoding::{Coordinates, GeocodeResult, Units},
    validation::{self, validate_present},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddressQuery {
    #[validate(
        custom(function = "validate_present"),
        length(max = 500, message = "must be at most 500 characters")
    )]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub distance: f64,
    pub units: Units,
}

fn coordinates(lat: f64, lon: f64, field: &str) -> ApiResult<Coordinates> {
    Coordinates::new(lat, lon).ok_or_else(|| ApiError::invalid(field, "is out of range"))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<Json<Vec<GeocodeResult>>> {
    validation::check(&query)
        .map_err(|errors| ApiError::ValidationError(errors.into_iter().map(Into::into).collect()))?;

    Ok(Json(state.geocoder.search(query.address.trim()).await?))
}

pub async fn reverse(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> ApiResult<Json<Vec<GeocodeResult>>> {
    let at = coordinates(query.lat, query.lon, "lat")?;
    Ok(Json(state.geocoder.reverse(at).await?))
}

pub async fn distance(
    State(state): State<AppState>,
    Query(query): Query<DistanceQuery>,
) -> ApiResult<Json<DistanceResponse>> {
    let from = coordinates(query.from_lat, query.from_lon, "from")?;
    let to = coordinates(query.to_lat, query.to_lon, "to")?;

    Ok(Json(DistanceResponse {
        distance: state.geocoder.distance_between(from, to),
        units: state.geocoder.config().units,
    }))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{bearer, json_body, test_app};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn get(uri: &str) -> axum::response::Response {
        test_app()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("authorization", bearer(1))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_distance_in_configured_units() {
        // One degree of longitude on the equator
        let response = get("/v1/geocode/distance?from_lat=0&from_lon=0&to_lat=0&to_lon=1").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["units"], "km");
        let distance = body["distance"].as_f64().unwrap();
        assert!((distance - 111.19).abs() < 0.01, "got {}", distance);
    }

    #[tokio::test]
    async fn test_distance_rejects_out_of_range_coordinates() {
        let response = get("/v1/geocode/distance?from_lat=91&from_lon=0&to_lat=0&to_lon=1").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["details"][0]["field"], "from");
    }

    #[tokio::test]
    async fn test_reverse_rejects_out_of_range_coordinates() {
        let response = get("/v1/geocode/reverse?lat=0&lon=181").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_address() {
        let response = get("/v1/geocode?address=").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["details"][0]["field"], "address");
    }

    #[tokio::test]
    async fn test_search_rejects_blank_address() {
        let response = get("/v1/geocode?address=%20%20").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["details"][0]["field"], "address");
    }
}
