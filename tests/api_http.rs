// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /api/health
// - POST /api/analyze        (shape, cache header, validation)
// - POST /api/analyze-image  (validation, degraded result)
// - POST /api/analyze-source (validation)
// - image bodies above axum's default limit
// - per-client rate limits on the analysis routes

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use misinfo_verifier::cache::MemoryCache;
use misinfo_verifier::config::{OracleConfig, RateLimitConfig};
use misinfo_verifier::oracle::DisabledOracle;
use misinfo_verifier::service::MAX_IMAGE_BASE64_LEN;
use misinfo_verifier::{router, AppState, Verifier};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn heuristic_verifier() -> Verifier {
    Verifier::new(
        Arc::new(DisabledOracle),
        Arc::new(MemoryCache::new()),
        OracleConfig::default(),
    )
}

/// Heuristic-only router with an in-memory cache.
fn test_router() -> Router {
    router(AppState::new(heuristic_verifier()))
}

fn from_client(ip: &str, mut req: Request<Body>) -> Request<Body> {
    req.headers_mut()
        .insert("x-forwarded-for", ip.parse().expect("header value"));
    req
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("build POST")
}

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_ok_and_timestamp() {
    let app = test_router();
    let req = Request::builder()
        .method("GET")
        .uri("/api/health")
        .body(Body::empty())
        .expect("build GET /api/health");

    let resp = app.oneshot(req).await.expect("oneshot /api/health");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = read_json(resp).await;
    assert_eq!(v["status"], "ok");
    let ts = v["timestamp"].as_str().expect("timestamp string");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad ts {ts}");
}

#[tokio::test]
async fn analyze_returns_full_result_shape() {
    let app = test_router();
    let payload = json!({
        "content": "Scientists confirm new finding. According to https://who.int, results are preliminary."
    });

    let resp = app
        .oneshot(post_json("/api/analyze", payload.to_string()))
        .await
        .expect("oneshot /api/analyze");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-analysis-cache").map(|h| h.to_str().unwrap()),
        Some("MISS")
    );

    let v = read_json(resp).await;
    for key in ["trustScore", "status", "message", "sources", "analysis"] {
        assert!(v.get(key).is_some(), "missing '{key}'");
    }
    for key in [
        "factualAccuracy",
        "bias",
        "sourceQuality",
        "flags",
        "highlights",
        "keywords",
        "checkedAt",
    ] {
        assert!(v["analysis"].get(key).is_some(), "missing 'analysis.{key}'");
    }
    assert_eq!(v["status"], "verified");
    assert_eq!(v["sources"][0]["name"], "who.int");
}

#[tokio::test]
async fn second_identical_request_is_a_cache_hit() {
    let app = test_router();
    let payload = json!({ "content": "BREAKING: share this immediately, urgent!" }).to_string();

    let first = app
        .clone()
        .oneshot(post_json("/api/analyze", payload.clone()))
        .await
        .unwrap();
    assert_eq!(first.headers()["x-analysis-cache"], "MISS");
    let a = read_json(first).await;

    let second = app
        .oneshot(post_json("/api/analyze", payload))
        .await
        .unwrap();
    assert_eq!(second.headers()["x-analysis-cache"], "HIT");
    let b = read_json(second).await;

    assert_eq!(a["trustScore"], b["trustScore"]);
    assert_eq!(a["status"], b["status"]);
    assert_eq!(a["analysis"]["flags"], b["analysis"]["flags"]);
    assert_eq!(b["analysis"]["highlights"], json!([]));
}

#[tokio::test]
async fn analyze_rejects_empty_missing_and_malformed_bodies() {
    let app = test_router();

    for body in [
        json!({ "content": "" }).to_string(),
        json!({ "content": "   \n " }).to_string(),
        json!({}).to_string(),
        json!({ "content": 42 }).to_string(),
        "{not json".to_string(),
    ] {
        let resp = app
            .clone()
            .oneshot(post_json("/api/analyze", body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
        let v = read_json(resp).await;
        assert_eq!(v["status"], "error");
        assert_eq!(v["trustScore"], 0);
        assert!(!v["message"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn analyze_image_validates_and_degrades() {
    let app = test_router();

    let bad_type = json!({ "imageBase64": "AAAA", "mimeType": "application/pdf" });
    let resp = app
        .clone()
        .oneshot(post_json("/api/analyze-image", bad_type.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = read_json(resp).await;
    assert!(v["message"].as_str().unwrap().contains("application/pdf"));

    let missing = json!({ "mimeType": "image/png" });
    let resp = app
        .clone()
        .oneshot(post_json("/api/analyze-image", missing.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // oracle disabled: valid input still answers 200 with an error-tier result
    let ok = json!({ "imageBase64": "data:image/png;base64,iVBORw0KGgo=", "mimeType": "" });
    let resp = app
        .oneshot(post_json("/api/analyze-image", ok.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["status"], "error");
    assert_eq!(v["isOriginal"], false);
    assert_eq!(v["technicalIndicators"]["artifacts"], 0);
}

#[tokio::test]
async fn analyze_source_validates_url() {
    let app = test_router();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/analyze-source",
            json!({ "url": "example.org" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(post_json(
            "/api/analyze-source",
            json!({ "url": "https://example.org/about" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["score"], 0);
    assert_eq!(v["recency"], "Unknown");
}

#[tokio::test]
async fn metrics_route_absent_when_disabled() {
    let app = test_router();
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_body_above_default_limit_reaches_validation() {
    let app = test_router();

    // ~3 MB: over axum's 2 MB default, under the image cap
    let big = json!({ "imageBase64": "A".repeat(3_000_000), "mimeType": "image/png" });
    let resp = app
        .clone()
        .oneshot(post_json("/api/analyze-image", big.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    // oracle disabled: an error-tier media result, not a rejected body
    assert_eq!(v["status"], "error");
    assert!(v.get("isOriginal").is_some());

    let oversized = json!({
        "imageBase64": "A".repeat(MAX_IMAGE_BASE64_LEN + 1),
        "mimeType": "image/png"
    });
    let resp = app
        .oneshot(post_json("/api/analyze-image", oversized.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = read_json(resp).await;
    assert!(v["message"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn analysis_routes_are_rate_limited_per_client() {
    let limits = RateLimitConfig {
        enabled: true,
        per_minute: 2,
        image_per_minute: 1,
        burst: 0,
        trust_forwarded_for: true,
    };
    let app = router(AppState::new(heuristic_verifier()).with_rate_limit(limits));
    let claim = json!({ "content": "plain statement without links" }).to_string();
    let source = json!({ "url": "https://example.org" }).to_string();

    // text and source share one budget
    let resp = app
        .clone()
        .oneshot(from_client("203.0.113.1", post_json("/api/analyze", claim.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .clone()
        .oneshot(from_client("203.0.113.1", post_json("/api/analyze-source", source)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .clone()
        .oneshot(from_client("203.0.113.1", post_json("/api/analyze", claim.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let v = read_json(resp).await;
    assert_eq!(v["status"], "error");
    assert_eq!(v["trustScore"], 0);
    assert_eq!(v["analysis"]["flags"], json!(["Rate limit exceeded"]));

    // another client is unaffected
    let resp = app
        .clone()
        .oneshot(from_client("203.0.113.2", post_json("/api/analyze", claim)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // images have their own budget
    let img = json!({ "imageBase64": "iVBORw0KGgo=", "mimeType": "image/png" }).to_string();
    let resp = app
        .clone()
        .oneshot(from_client("203.0.113.1", post_json("/api/analyze-image", img.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .clone()
        .oneshot(from_client("203.0.113.1", post_json("/api/analyze-image", img)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // health is never limited
    let resp = app
        .oneshot(
            from_client(
                "203.0.113.1",
                Request::get("/api/health").body(Body::empty()).unwrap(),
            ),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_rate_limit_never_rejects() {
    let limits = RateLimitConfig {
        enabled: false,
        per_minute: 1,
        ..RateLimitConfig::default()
    };
    let app = router(AppState::new(heuristic_verifier()).with_rate_limit(limits));
    for _ in 0..5 {
        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/analyze",
                json!({ "content": "same claim again" }).to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
