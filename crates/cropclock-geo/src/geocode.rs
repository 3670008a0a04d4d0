//! Forward and reverse geocoding against a Nominatim (OpenStreetMap) endpoint.

use crate::types::{AddressHierarchy, Coordinate, GeoError, PlaceCandidate, ReverseGeocode};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// Place lookups used by location resolution.
pub trait Geocoder: Send + Sync {
    /// Name the place at `at`. Fails with [`GeoError::Lookup`] when no
    /// village, town, city or county is known there.
    async fn reverse_geocode(&self, at: Coordinate) -> Result<ReverseGeocode, GeoError>;

    /// Free-text search in provider relevance order. No matches is `Ok(vec![])`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PlaceCandidate>, GeoError>;
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    village: Option<String>,
    town: Option<String>,
    city: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl From<NominatimAddress> for AddressHierarchy {
    fn from(a: NominatimAddress) -> Self {
        Self {
            village: a.village,
            town: a.town,
            city: a.city,
            county: a.county,
            state: a.state,
            country: a.country,
        }
    }
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: PlaceId,
    lat: String,
    lon: String,
    display_name: String,
}

/// Numeric in current Nominatim releases, a string in older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlaceId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceId::Number(n) => write!(f, "{}", n),
            PlaceId::Text(s) => f.write_str(s),
        }
    }
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<PlaceCandidate> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        Some(PlaceCandidate {
            id: self.place_id.to_string(),
            display_name: self.display_name,
            coordinate: Coordinate::new(latitude, longitude),
        })
    }
}

/// HTTP geocoding client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct GeoClient {
    client: Client,
    base_url: String,
}

impl GeoClient {
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Geocoder for GeoClient {
    #[instrument(skip(self), level = "debug")]
    async fn reverse_geocode(&self, at: Coordinate) -> Result<ReverseGeocode, GeoError> {
        let url = format!("{}/reverse", self.base_url);
        let body: NominatimReverse = self
            .client
            .get(&url)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let address: AddressHierarchy = body.address.map(Into::into).unwrap_or_default();
        let label = address
            .locality()
            .map(str::to_string)
            .ok_or(GeoError::Lookup(at))?;

        tracing::debug!("Reverse geocoded {} to {}", at, label);
        Ok(ReverseGeocode { label, address })
    }

    #[instrument(skip(self), level = "debug")]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PlaceCandidate>, GeoError> {
        let url = format!("{}/search", self.base_url);
        let places: Vec<NominatimPlace> = self
            .client
            .get(&url)
            .query(&[
                ("q", query.to_string()),
                ("format", "json".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let candidates: Vec<PlaceCandidate> = places
            .into_iter()
            .filter_map(|p| {
                let name = p.display_name.clone();
                let candidate = p.into_candidate();
                if candidate.is_none() {
                    tracing::warn!("Skipping search result with bad coordinates: {}", name);
                }
                candidate
            })
            .collect();

        tracing::debug!("Search '{}' returned {} candidates", query, candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeoClient {
        GeoClient::with_base_url(&server.uri(), "cropclock-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_reverse_geocode_prefers_village() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Alanganallur, Madurai, Tamil Nadu, India",
                "address": {
                    "village": "Alanganallur",
                    "county": "Vadipatti",
                    "state": "Tamil Nadu",
                    "country": "India"
                }
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .reverse_geocode(Coordinate::new(10.05, 78.09))
            .await
            .unwrap();

        assert_eq!(result.label, "Alanganallur");
        assert_eq!(result.address.state.as_deref(), Some("Tamil Nadu"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_without_locality_is_lookup_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "state": "Tamil Nadu", "country": "India" }
            })))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .reverse_geocode(Coordinate::new(10.0, 78.0))
            .await
            .unwrap_err();

        assert!(matches!(err, GeoError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_reverse_geocode_missing_address_is_lookup_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "error": "Unable to geocode" })),
            )
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .reverse_geocode(Coordinate::new(0.0, -160.0))
            .await
            .unwrap_err();

        assert!(matches!(err, GeoError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_search_preserves_provider_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Madu"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"place_id": 11, "lat": "9.9252", "lon": "78.1198", "display_name": "Madurai, Tamil Nadu, India"},
                {"place_id": 12, "lat": "not-a-number", "lon": "0", "display_name": "Broken"},
                {"place_id": "13", "lat": "23.75", "lon": "90.39", "display_name": "Madhubani, Bihar, India"}
            ])))
            .mount(&mock_server)
            .await;

        let candidates = client_for(&mock_server).search("Madu", 5).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "11");
        assert_eq!(candidates[0].primary_label(), "Madurai");
        assert_eq!(candidates[1].id, "13");
        assert!((candidates[0].coordinate.latitude - 9.9252).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_search_no_matches_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let candidates = client_for(&mock_server).search("Zzyzx", 1).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_search_server_error_is_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).search("Madurai", 1).await.unwrap_err();
        assert!(matches!(err, GeoError::Network(_)));
    }
}
