//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles against stubbed upstream services.

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use geo_overlay::GeoError;
use tower::ServiceExt;

use common::{body_to_json, frames, hit, place, test_app, test_app_with, StubCapabilities};

// == Helper Functions ==

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == Map Endpoint Tests ==

#[tokio::test]
async fn test_click_opens_and_enriches_view() {
    let app = test_app();
    app.geocoder
        .reverse
        .lock()
        .unwrap()
        .insert(14, Ok(Some(place("Paradeplatz"))));

    let response = app
        .router
        .clone()
        .oneshot(post("/map/click", r#"{"lat":47.3697,"lon":8.5391}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["outcome"], "shown");
    assert_eq!(json["view"]["place"]["name"], "Paradeplatz");
    assert_eq!(json["view"]["title"], "Paradeplatz");
    assert_eq!(json["view"]["weather"]["temperature"]["state"], "pending");
    assert_eq!(json["view"]["labels"]["temperature"], "–");
    let id = json["view"]["id"].as_u64().unwrap();

    // Both enrichment stages answer immediately; let them land.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = app
        .router
        .oneshot(get(&format!("/views/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["weather"]["temperature"]["value"], 14.5);
    assert_eq!(json["weather"]["precipitation_probability"]["value"], 40.0);
    assert_eq!(json["labels"]["temperature"], "14.5 °C");
    assert_eq!(json["labels"]["precipitation_probability"], "40 %");
}

#[tokio::test]
async fn test_click_rate_limited() {
    let app = test_app();
    app.geocoder
        .reverse
        .lock()
        .unwrap()
        .insert(14, Err(GeoError::RateLimited));

    let response = app
        .router
        .oneshot(post("/map/click", r#"{"lat":47.0,"lon":8.0}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
    assert_eq!(*app.geocoder.reverse_calls.lock().unwrap(), vec![14]);
}

#[tokio::test]
async fn test_click_out_of_range_is_bad_request() {
    let app = test_app();

    let response = app
        .router
        .oneshot(post("/map/click", r#"{"lat":123.0,"lon":8.0}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_locate_suppresses_following_click() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(post("/map/locate", r#"{"lat":46.2,"lon":6.14}"#))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["outcome"], "shown");

    let response = app
        .router
        .clone()
        .oneshot(post("/map/click", r#"{"lat":46.2,"lon":6.14}"#))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["outcome"], "suppressed");

    app.clock.advance(Duration::from_secs(1));
    let response = app
        .router
        .oneshot(post("/map/click", r#"{"lat":46.2,"lon":6.14}"#))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["outcome"], "shown");
}

#[tokio::test]
async fn test_stats_count_cache_hits() {
    let app = test_app();

    for body in [r#"{"lat":47.37690,"lon":8.54170}"#, r#"{"lat":47.37701,"lon":8.54162}"#] {
        let response = app.router.clone().oneshot(post("/map/click", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.router.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
}

#[tokio::test]
async fn test_replaced_view_is_gone() {
    let app = test_app();

    let first = app
        .router
        .clone()
        .oneshot(post("/map/click", r#"{"lat":47.0,"lon":8.0}"#))
        .await
        .unwrap();
    let first_id = body_to_json(first.into_body()).await["view"]["id"].as_u64().unwrap();

    app.router
        .clone()
        .oneshot(post("/map/click", r#"{"lat":46.0,"lon":7.0}"#))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/views/{first_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Search Endpoint Tests ==

#[tokio::test]
async fn test_search_navigate_and_commit() {
    let app = test_app();
    *app.geocoder.hits.lock().unwrap() = vec![
        hit("Luzern", 47.05, 8.31),
        hit("Lugano", 46.0, 8.95),
    ];

    let response = app
        .router
        .clone()
        .oneshot(post("/search/submit", r#"{"text":"Lu"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["outcome"], "suggestions");
    assert_eq!(json["count"], 2);
    assert_eq!(json["search"]["message"], "2 results");

    let response = app
        .router
        .clone()
        .oneshot(post("/search/key", r#"{"key":"up"}"#))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["action"], "highlighted");
    assert_eq!(json["highlight"], 1);

    let response = app
        .router
        .clone()
        .oneshot(post("/search/key", r#"{"key":"enter"}"#))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["action"], "commit");
    assert_eq!(json["committed"]["outcome"], "shown");
    assert_eq!(json["committed"]["view"]["place"]["address"]["city"], "Lugano");
    assert!(app.geocoder.reverse_calls.lock().unwrap().is_empty());

    let response = app.router.oneshot(get("/search/suggestions")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["suggestions"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_short_input_is_skipped() {
    let app = test_app();

    let response = app
        .router
        .oneshot(post("/search/input", r#"{"text":"Zu"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["outcome"], "skipped");
}

#[tokio::test]
async fn test_dismiss_clears_suggestions() {
    let app = test_app();
    *app.geocoder.hits.lock().unwrap() = vec![hit("Chur", 46.85, 9.53)];

    app.router
        .clone()
        .oneshot(post("/search/submit", r#"{"text":"Chur"}"#))
        .await
        .unwrap();
    let response = app.router.oneshot(post_empty("/search/dismiss")).await.unwrap();

    let json = body_to_json(response.into_body()).await;
    assert!(json["suggestions"]["items"].as_array().unwrap().is_empty());
    assert_eq!(json["status"]["kind"], "idle");
    assert_eq!(json["message"], "");
}

#[tokio::test]
async fn test_commit_suggestion_by_index() {
    let app = test_app();
    *app.geocoder.hits.lock().unwrap() = vec![
        hit("Sion", 46.23, 7.36),
        hit("Sierre", 46.29, 7.53),
    ];

    app.router
        .clone()
        .oneshot(post("/search/submit", r#"{"text":"Si"}"#))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(post("/search/commit", r#"{"index":1}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["outcome"], "shown");
    assert_eq!(json["view"]["lat"], 46.29);
    assert_eq!(json["view"]["place"]["address"]["city"], "Sierre");
    assert!(app.geocoder.reverse_calls.lock().unwrap().is_empty());

    // The list closed with the commit.
    let response = app
        .router
        .oneshot(post("/search/commit", r#"{"index":0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_key_rejected() {
    let app = test_app();

    let response = app
        .router
        .oneshot(post("/search/key", r#"{"key":"tab"}"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == Timeline Endpoint Tests ==

#[tokio::test]
async fn test_timeline_controls() {
    let app = test_app();
    app.radar.responses.lock().unwrap().push_back(Ok(frames(3)));
    app.state.session.timeline().refresh().await.unwrap();

    let response = app.router.clone().oneshot(get("/timeline")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["index"], 2);
    assert_eq!(json["controls"]["play_enabled"], true);

    // Next from the last frame wraps to the first.
    let response = app
        .router
        .clone()
        .oneshot(post_empty("/timeline/next"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["index"], 0);
    assert_eq!(json["state"], "stopped");

    let response = app
        .router
        .clone()
        .oneshot(post_empty("/timeline/play"))
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["state"], "playing");

    let response = app
        .router
        .clone()
        .oneshot(post("/timeline/seek", r#"{"index":1}"#))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["index"], 1);
    assert_eq!(json["state"], "stopped");

    let response = app
        .router
        .oneshot(post("/timeline/seek", r#"{"index":9}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_play_without_frames_stays_stopped() {
    let app = test_app();

    let response = app.router.oneshot(post_empty("/timeline/play")).await.unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["state"], "stopped");
    assert!(json["index"].is_null());
}

// == Overlay Endpoint Tests ==

#[tokio::test]
async fn test_overlays_with_discovered_layer() {
    let document = r#"<Capabilities xmlns:ows="http://www.opengis.net/ows/1.1">
  <Contents>
    <Layer>
      <ows:Identifier>ch.meteoschweiz.ogd-radar-precip</ows:Identifier>
      <ResourceURL format="image/png" resourceType="tile"
        template="https://wmts.example/1.0.0/ch.meteoschweiz.ogd-radar-precip/default/{Time}/3857/{TileMatrix}/{TileCol}/{TileRow}.png"/>
    </Layer>
  </Contents>
</Capabilities>"#;
    let app = test_app_with(StubCapabilities(Ok(document.to_string())));
    app.radar.responses.lock().unwrap().push_back(Ok(frames(2)));
    app.state.session.timeline().refresh().await.unwrap();
    app.state.session.discover_overlay().await;

    let response = app.router.oneshot(get("/overlays")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json["radar"],
        "https://tilecache.example/v2/radar/1700000600/256/{z}/{x}/{y}/2/1_1.png"
    );
    assert_eq!(
        json["secondary"]["tile_template"],
        "https://wmts.example/1.0.0/ch.meteoschweiz.ogd-radar-precip/default/current/3857/{z}/{x}/{y}.png"
    );
}

#[tokio::test]
async fn test_overlays_without_secondary() {
    let app = test_app();
    app.state.session.discover_overlay().await;

    let response = app.router.oneshot(get("/overlays")).await.unwrap();

    let json = body_to_json(response.into_body()).await;
    assert!(json["secondary"].is_null());
    assert!(json["radar"].is_null());
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = test_app();

    let response = app
        .router
        .oneshot(post("/map/click", r#"{"lat": "#))
        .await
        .unwrap();

    // Axum returns 400 or 422 for JSON parsing errors
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}
