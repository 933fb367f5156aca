/// End-to-end API tests
///
/// Drive the full router (auth, routing, repositories) against real
/// Postgres and Redis:
/// cargo test -p fixr-api --test api_tests -- --ignored

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestContext, WEBHOOK_SECRET};
use fixr_shared::jobs::{KeyKind, Lane, RedisBroker};
use serde_json::json;

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_health_reports_both_stores() {
    let mut ctx = TestContext::new().await.unwrap();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = ctx.call(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["redis"], "connected");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_routes_require_token() {
    let mut ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .uri("/v1/categories")
        .body(Body::empty())
        .unwrap();
    let (status, body) = ctx.call(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_category_crud() {
    let mut ctx = TestContext::new().await.unwrap();

    let (status, created) = ctx
        .send("POST", "/v1/categories", Some(json!({ "name": "Cleaning", "color": "#22c55e" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Cleaning");
    assert_eq!(created["userId"], ctx.user_id.as_str());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .send("POST", "/v1/categories", Some(json!({ "name": "Cleaning" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = ctx.send("GET", &format!("/v1/categories/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = ctx
        .send(
            "PATCH",
            &format!("/v1/categories/{}", id),
            Some(json!({ "description": "Homes and offices" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Homes and offices");
    assert_eq!(updated["color"], "#22c55e");

    let (status, body) = ctx
        .send("PATCH", &format!("/v1/categories/{}", id), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, page) = ctx.send("GET", "/v1/categories?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["totalPages"], 1);

    let (status, _) = ctx.send("DELETE", &format!("/v1/categories/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send("DELETE", &format!("/v1/categories/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_invalid_body_is_unprocessable() {
    let mut ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send("POST", "/v1/services", Some(json!({ "name": "", "rate": 0 })))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_service_tree_through_api() {
    let mut ctx = TestContext::new().await.unwrap();

    let (_, root) = ctx
        .send("POST", "/v1/services", Some(json!({ "name": "Cleaning", "rate": 3000 })))
        .await;
    let root_id = root["id"].as_str().unwrap().to_string();

    let (status, child) = ctx
        .send(
            "POST",
            "/v1/services",
            Some(json!({ "name": "Windows", "parentServiceId": root_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let child_id = child["id"].as_str().unwrap().to_string();

    let (status, populated) = ctx.send("GET", &format!("/v1/services/{}", root_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(populated["children"].as_array().unwrap().len(), 1);
    assert_eq!(populated["children"][0]["id"], child_id.as_str());
    assert!(populated["category"].is_null());

    // roots only without a parent filter
    let (_, page) = ctx.send("GET", "/v1/services", None).await;
    assert_eq!(page["total"], 1);

    let (status, body) = ctx
        .send(
            "PATCH",
            &format!("/v1/services/{}", root_id),
            Some(json!({ "parentServiceId": child_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("cycle"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_other_owner_gets_not_found() {
    let mut owner = TestContext::new().await.unwrap();
    let mut stranger = TestContext::new().await.unwrap();

    let (_, service) = owner
        .send("POST", "/v1/services", Some(json!({ "name": "Private" })))
        .await;
    let uri = format!("/v1/services/{}", service["id"].as_str().unwrap());

    let (status, _) = stranger.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = stranger.send("PATCH", &uri, Some(json!({ "name": "Mine" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = stranger.send("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = owner.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    owner.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_user_created_webhook_queues_welcome_email() {
    let mut ctx = TestContext::new().await.unwrap();
    let broker = RedisBroker::new(ctx.redis.connection());

    let body = json!({ "email": "ada@example.com", "firstName": "Ada" }).to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/user-created")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "wrong")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, _) = ctx.call(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/user-created")
        .header("content-type", "application/json")
        .header("x-webhook-secret", WEBHOOK_SECRET)
        .body(Body::from(body))
        .unwrap();
    let (status, accepted) = ctx.call(request).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(accepted["taskId"].is_string());

    assert!(broker.len(Lane::Default, KeyKind::Pending).await.unwrap() >= 1);
}
