use std::sync::Arc;
use std::time::Duration;

use mapcache::{
    maps_service::{MapsService, ServiceSettings},
    models::{
        DirectionsRequest, DistanceMatrixRequest, GeocodeRequest, PlacesSearchRequest,
        ReverseGeocodeRequest,
    },
    rate_limiter::RateLimiter,
    upstream::{Endpoints, GoogleMapsClient, MapsProvider},
    MapsError,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, api_key: &str) -> GoogleMapsClient {
    let endpoints = Endpoints {
        geocoding: format!("{}/geocode/json", server.uri()),
        places: format!("{}/place", server.uri()),
        directions: format!("{}/directions/json", server.uri()),
        distance_matrix: format!("{}/distancematrix/json", server.uri()),
    };
    GoogleMapsClient::new(api_key, endpoints, Duration::from_secs(5)).unwrap()
}

fn geocode_req(address: &str) -> GeocodeRequest {
    GeocodeRequest {
        address: address.to_string(),
        language: Some("zh-TW".to_string()),
        region: Some("tw".to_string()),
    }
}

fn taipei_101() -> serde_json::Value {
    json!({
        "status": "OK",
        "results": [{
            "formatted_address": "110台灣台北市信義區信義路五段7號",
            "place_id": "ChIJH56c2rarQjQRphD9gvC8BhI",
            "types": ["establishment", "point_of_interest"],
            "geometry": {
                "location": { "lat": 25.0339639, "lng": 121.5644722 },
                "location_type": "ROOFTOP"
            },
            "address_components": []
        }]
    })
}

#[tokio::test]
async fn test_geocode_sends_key_and_parses_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "台北101"))
        .and(query_param("language", "zh-TW"))
        .and(query_param("region", "tw"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(taipei_101()))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server, "test-key").geocode(&geocode_req("台北101")).await.unwrap();

    assert_eq!(resp.status, "OK");
    assert_eq!(resp.results[0].geometry.location.lat, 25.0339639);
    assert_eq!(resp.results[0].place_id, "ChIJH56c2rarQjQRphD9gvC8BhI");
}

#[tokio::test]
async fn test_zero_results_is_success() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&server)
        .await;

    let resp = client(&server, "test-key").geocode(&geocode_req("無此地址")).await.unwrap();

    assert_eq!(resp.status, "ZERO_RESULTS");
    assert!(resp.results.is_empty());
}

#[tokio::test]
async fn test_provider_error_status_carries_message() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let err = client(&server, "bad-key").geocode(&geocode_req("台北101")).await.unwrap_err();

    match err {
        MapsError::Provider { status, message } => {
            assert_eq!(status, "REQUEST_DENIED");
            assert_eq!(message, "The provided API key is invalid.");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server, "test-key").geocode(&geocode_req("台北101")).await.unwrap_err();

    assert!(matches!(err, MapsError::Transport(_)));
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;

    let err = client(&server, "").geocode(&geocode_req("台北101")).await.unwrap_err();

    assert!(matches!(err, MapsError::Configuration(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reverse_geocode_formats_latlng() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .and(query_param("latlng", "25.03396390,121.56447220"))
        .and(query_param("result_type", "street_address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(taipei_101()))
        .expect(1)
        .mount(&server)
        .await;

    let req = ReverseGeocodeRequest {
        latitude: 25.0339639,
        longitude: 121.5644722,
        language: None,
        result_type: Some("street_address".to_string()),
        location_type: None,
    };
    let resp = client(&server, "test-key").reverse_geocode(&req).await.unwrap();

    assert_eq!(resp.results.len(), 1);
}

#[tokio::test]
async fn test_text_search_path_and_params() {
    let server = MockServer::start().await;
    Mock::given(path("/place/textsearch/json"))
        .and(query_param("query", "心理諮商 台灣"))
        .and(query_param("location", "25.0339,121.5644"))
        .and(query_param("radius", "5000"))
        .and(query_param("type", "health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                { "place_id": "p1", "name": "信義諮商所", "rating": 4.7, "user_ratings_total": 120 },
                { "place_id": "p2", "name": "安心診所" }
            ],
            "next_page_token": "token-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = PlacesSearchRequest {
        query: Some("心理諮商 台灣".to_string()),
        location: Some("25.0339,121.5644".to_string()),
        radius: Some(5000),
        place_type: Some("health".to_string()),
        ..Default::default()
    };
    let resp = client(&server, "test-key").text_search(&req).await.unwrap();

    assert_eq!(resp.results.len(), 2);
    assert_eq!(resp.results[0].rating, Some(4.7));
    assert_eq!(resp.results[1].rating, None);
    assert_eq!(resp.next_page_token.as_deref(), Some("token-2"));
}

#[tokio::test]
async fn test_directions_params() {
    let server = MockServer::start().await;
    Mock::given(path("/directions/json"))
        .and(query_param("origin", "台北車站"))
        .and(query_param("destination", "台北101"))
        .and(query_param("mode", "transit"))
        .and(query_param("alternatives", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "routes": [{
                "summary": "板南線",
                "legs": [{
                    "distance": { "text": "5.4 公里", "value": 5400 },
                    "duration": { "text": "20 分鐘", "value": 1200 },
                    "start_address": "台北車站",
                    "end_address": "台北101",
                    "steps": []
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = DirectionsRequest {
        origin: "台北車站".to_string(),
        destination: "台北101".to_string(),
        mode: Some("transit".to_string()),
        language: None,
        region: None,
        alternatives: true,
        avoid: None,
        units: None,
    };
    let resp = client(&server, "test-key").directions(&req).await.unwrap();

    assert_eq!(resp.routes[0].legs[0].duration.value, 1200);
}

#[tokio::test]
async fn test_distance_matrix_joins_places_with_pipes() {
    let server = MockServer::start().await;
    Mock::given(path("/distancematrix/json"))
        .and(query_param("origins", "台北車站|板橋車站"))
        .and(query_param("destinations", "台北101"))
        .and(query_param("departure_time", "now"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "origin_addresses": ["台北車站", "板橋車站"],
            "destination_addresses": ["台北101"],
            "rows": [
                { "elements": [{
                    "status": "OK",
                    "distance": { "text": "5.4 公里", "value": 5400 },
                    "duration": { "text": "18 分鐘", "value": 1080 }
                }] },
                { "elements": [{ "status": "NOT_FOUND" }] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = DistanceMatrixRequest {
        origins: vec!["台北車站".to_string(), "板橋車站".to_string()],
        destinations: vec!["台北101".to_string()],
        departure_time: Some("now".to_string()),
        ..Default::default()
    };
    let resp = client(&server, "test-key").distance_matrix(&req).await.unwrap();

    assert_eq!(resp.rows.len(), 2);
    assert_eq!(resp.rows[0].elements[0].duration.as_ref().map(|d| d.value), Some(1080));
    assert_eq!(resp.rows[1].elements[0].status, "NOT_FOUND");
    assert!(resp.rows[1].elements[0].distance.is_none());
}

#[tokio::test]
async fn test_service_calls_provider_once_for_repeated_geocode() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .and(query_param("address", "台北101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(taipei_101()))
        .expect(1)
        .mount(&server)
        .await;

    let service = MapsService::new(
        Arc::new(client(&server, "test-key")),
        RateLimiter::new(10, 20),
        ServiceSettings::default(),
    );
    let cancel = CancellationToken::new();

    let first = service.geocode(&geocode_req("台北101"), &cancel).await.unwrap();
    let second = service.geocode(&geocode_req("台北101"), &cancel).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_service_does_not_cache_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OVER_QUERY_LIMIT",
            "results": []
        })))
        .expect(2)
        .mount(&server)
        .await;

    let service = MapsService::new(
        Arc::new(client(&server, "test-key")),
        RateLimiter::new(10, 20),
        ServiceSettings::default(),
    );
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        let err = service.geocode(&geocode_req("台北101"), &cancel).await.unwrap_err();
        assert!(matches!(err, MapsError::Provider { .. }));
    }
}
