//! HTTP API integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use web_orders::{Config, Environment, InMemoryOrderStore, OrderService, RateLimitConfig};

use crate::support::server::{authed, start_server, test_config, PASSWORD, USER};
use crate::support::CountingStore;

async fn start() -> String {
    let service = Arc::new(OrderService::new(InMemoryOrderStore::new()));
    start_server(service, &test_config()).await
}

async fn start_with(config: Config) -> String {
    let service = Arc::new(OrderService::with_settings(
        InMemoryOrderStore::new(),
        config.service_settings(),
    ));
    start_server(service, &config).await
}

fn order_body(customer: &str) -> Value {
    json!({
        "customerName": customer,
        "items": [
            { "sku": "WID-001", "description": "Widget", "quantity": 2, "unitPrice": 9.99 },
            { "sku": "GAD-002", "description": "Gadget", "quantity": 1, "unitPrice": 25 }
        ]
    })
}

#[tokio::test]
async fn create_get_delete_scenario() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = authed(&client, Method::POST, format!("{base}/orders"))
        .json(&order_body("Ana"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers()["location"].to_str().unwrap().to_string();
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(location, format!("/orders/{id}"));
    assert_eq!(created["customerName"], "Ana");
    assert_eq!(created["items"][0]["unitPrice"], 9.99);
    assert!(created["createdAt"].as_str().unwrap().ends_with('Z'));

    let resp = authed(&client, Method::GET, format!("{base}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched, created);

    let resp = authed(&client, Method::GET, format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    let all: Value = resp.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);

    let resp = authed(&client, Method::DELETE, format!("{base}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = authed(&client, Method::GET, format!("{base}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.text().await.unwrap().is_empty());

    let resp = authed(&client, Method::DELETE, format!("{base}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_require_basic_auth() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.text().await.unwrap().is_empty());

    let resp = client
        .get(format!("{base}/orders"))
        .basic_auth(USER, Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{base}/orders/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = authed(&client, Method::GET, format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn validation_reports_every_violation() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = authed(&client, Method::POST, format!("{base}/orders"))
        .json(&json!({
            "customerName": "",
            "items": [{ "sku": "", "description": "Widget", "quantity": 0, "unitPrice": 1 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(
        errors[0],
        json!({ "errorMessage": "Customer name is required", "memberNames": ["customerName"] })
    );
    assert_eq!(errors[1]["memberNames"], json!(["items[0].sku"]));
    assert_eq!(errors[2]["errorMessage"], "Quantity must be greater than 0");

    let resp = authed(&client, Method::GET, format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    let all: Value = resp.json().await.unwrap();
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = authed(&client, Method::POST, format!("{base}/orders"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["statusCode"], 400);
    assert!(body["timestamp"].is_string());
    assert!(body.get("stackTrace").is_none());
}

#[tokio::test]
async fn update_replaces_contents() {
    let base = start().await;
    let client = reqwest::Client::new();

    let created: Value = authed(&client, Method::POST, format!("{base}/orders"))
        .json(&order_body("Ana"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let mut body = order_body("Bea");
    body["id"] = json!(999);
    body["createdAt"] = json!("2001-01-01T00:00:00Z");
    let resp = authed(&client, Method::PUT, format!("{base}/orders/{id}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["id"], id);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["customerName"], "Bea");

    let resp = authed(&client, Method::PUT, format!("{base}/orders/{}", id + 100))
        .json(&order_body("Cid"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = authed(&client, Method::PUT, format!("{base}/orders/{id}"))
        .json(&json!({ "customerName": "Cid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_integer_id_is_not_found() {
    let base = start().await;
    let client = reqwest::Client::new();

    for method in [Method::GET, Method::DELETE] {
        let resp = authed(&client, method, format!("{base}/orders/abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn login_checks_credentials() {
    let base = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/login"))
        .basic_auth(USER, Some(PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "username": USER, "message": "Login successful" }));

    let resp = client
        .post(format!("{base}/login"))
        .basic_auth(USER, Some("nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client.post(format!("{base}/login")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_store_state() {
    let base = start().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "healthy", "store": "memory" }));

    let (store, _) = CountingStore::failing(InMemoryOrderStore::new());
    let base = start_server(Arc::new(OrderService::new(store)), &test_config()).await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn internal_errors_are_generic_in_production() {
    let (store, _) = CountingStore::failing(InMemoryOrderStore::new());
    let base = start_server(Arc::new(OrderService::new(store)), &test_config()).await;
    let client = reqwest::Client::new();

    let resp = authed(&client, Method::GET, format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["message"], "An error occurred while processing your request");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn internal_errors_are_detailed_in_development() {
    let mut config = test_config();
    config.environment = Environment::Development;
    let (store, _) = CountingStore::failing(InMemoryOrderStore::new());
    let base = start_server(Arc::new(OrderService::new(store)), &config).await;
    let client = reqwest::Client::new();

    let resp = authed(&client, Method::GET, format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("lock poisoned"));
    assert!(body["details"].is_string());
    assert!(body["stackTrace"].is_string());
}

#[tokio::test]
async fn stream_sends_order_list_events() {
    let base = start().await;
    let client = reqwest::Client::new();

    authed(&client, Method::POST, format!("{base}/orders"))
        .json(&order_body("Ana"))
        .send()
        .await
        .unwrap();

    let mut resp = authed(&client, Method::GET, format!("{base}/orders/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let received = tokio::time::timeout(Duration::from_secs(2), async {
        let mut buffer = String::new();
        loop {
            let chunk = resp.chunk().await.unwrap().unwrap();
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            if let Some(line) = buffer.lines().find(|l| l.starts_with("data:")) {
                break line.trim_start_matches("data:").trim().to_string();
            }
        }
    })
    .await
    .unwrap();

    let orders: Value = serde_json::from_str(&received).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["customerName"], "Ana");
}

#[tokio::test]
async fn rate_limit_rejects_past_permits() {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        permits: 3,
        window: Duration::from_secs(60),
    };
    let base = start_with(config).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        let resp = authed(&client, Method::GET, format!("{base}/orders"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = authed(&client, Method::GET, format!("{base}/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["statusCode"], 429);
}

#[tokio::test]
async fn rate_limit_ignores_unverified_usernames() {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        permits: 2,
        window: Duration::from_secs(60),
    };
    let base = start_with(config).await;
    let client = reqwest::Client::new();

    let mut statuses = Vec::new();
    for i in 0..6 {
        let resp = client
            .get(format!("{base}/orders"))
            .basic_auth(format!("bogus{i}"), Some("x"))
            .send()
            .await
            .unwrap();
        statuses.push(resp.status());
    }

    assert_eq!(&statuses[..2], [StatusCode::UNAUTHORIZED; 2]);
    assert!(statuses[2..]
        .iter()
        .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let base = start().await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/health"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}
