//! Integration tests for the review ingestion and syndication API

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

use prodomatix_common::config::ServiceConfig;
use prodomatix_review::models::{
    MediaType, Product, Retailer, Review, ReviewMedia, ReviewStatus, Sentiment,
};
use prodomatix_review::services::reasoning::ChatClient;
use prodomatix_review::services::{
    ModerationPipeline, PayloadSigner, SummaryRegenerator, WebhookDispatcher,
};
use prodomatix_review::{db, AppState};

fn test_config() -> ServiceConfig {
    ServiceConfig {
        bind_address: "127.0.0.1:0".to_string(),
        database_path: "unused.db".into(),
        syndication_secret: "test-secret".to_string(),
        safety_api_key: None,
        reasoning_api_key: None,
    }
}

/// Test helper: create test app with in-memory database
///
/// A single connection keeps every query on the same in-memory database.
async fn create_test_app() -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    db::init_tables(&pool).await.expect("Failed to initialize schema");

    let state = AppState::new(pool.clone(), &test_config()).expect("Failed to build app state");
    (prodomatix_review::build_router(state), pool)
}

fn sample_product() -> Product {
    Product {
        id: Uuid::new_v4(),
        brand_id: None,
        name: "Citrus Juicer".to_string(),
        sku: "CJ-100".to_string(),
        description: Some("Compact juicer".to_string()),
        image_url: Some("https://cdn.example.com/cj-100.jpg".to_string()),
        ai_summary: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_retailer(api_key: &str, webhook_url: Option<String>) -> Retailer {
    Retailer {
        id: Uuid::new_v4(),
        name: "Acme Retail".to_string(),
        website: Some("https://acme.example.com".to_string()),
        api_key: Some(api_key.to_string()),
        webhook_url,
        webhook_secret: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn approved_review(product_id: Uuid) -> Review {
    Review {
        id: Uuid::new_v4(),
        product_id,
        retailer_id: None,
        rating: 5,
        title: Some("Great".to_string()),
        content: "Juices everything effortlessly".to_string(),
        reviewer_name: Some("Sam".to_string()),
        reviewer_email: None,
        is_verified: true,
        status: ReviewStatus::Approved,
        sentiment: Some(Sentiment::Positive),
        tags: vec!["Quality".to_string()],
        manufacturer_response: None,
        manufacturer_response_date: None,
        created_at: Utc::now(),
    }
}

async fn post_review(app: &Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reviews")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn get_syndication(
    app: &Router,
    api_key: Option<&str>,
    query: &str,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri(format!("/api/syndication{}", query));
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn review_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_module() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "prodomatix-review");
}

#[tokio::test]
async fn out_of_range_rating_is_rejected_without_side_effects() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    for rating in [0, 6] {
        let (status, body) = post_review(
            &app,
            json!({
                "productId": product.id,
                "rating": rating,
                "content": "A perfectly fine review body",
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    assert_eq!(review_count(&pool).await, 0);
}

#[tokio::test]
async fn fractional_rating_is_a_validation_error() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    // Same 400 shape as an out-of-range rating, not a body-deserialization
    // rejection
    let (status, body) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 4.5,
            "content": "A perfectly fine review body",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(review_count(&pool).await, 0);
}

#[tokio::test]
async fn short_content_is_rejected() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    let (status, _) = post_review(
        &app,
        json!({"productId": product.id, "rating": 4, "content": "meh"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(review_count(&pool).await, 0);
}

#[tokio::test]
async fn unknown_product_returns_404() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = post_review(
        &app,
        json!({"productId": Uuid::new_v4(), "rating": 4, "content": "A fine product overall"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn fallback_moderation_leaves_clean_review_pending() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    // No classifiers configured: the local fallback must classify, and it
    // never auto-approves.
    let (status, body) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 5,
            "content": "Honestly a great little machine",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["moderationStatus"], "pending");
    assert_eq!(body["isVerified"], false);

    let (sentiment, tags): (String, String) =
        sqlx::query_as("SELECT sentiment, tags FROM reviews LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(sentiment, "positive");
    assert!(tags.contains("local_scan"));
}

#[tokio::test]
async fn profane_content_is_rejected_by_fallback() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    let (status, body) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 1,
            "content": "this damn thing broke immediately",
        }),
    )
    .await;

    // Rejection is a successful moderation outcome, not an error
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["moderationStatus"], "rejected");

    let (status_col, sentiment, tags): (String, String, String) =
        sqlx::query_as("SELECT status, sentiment, tags FROM reviews LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status_col, "rejected");
    assert_eq!(sentiment, "negative");
    assert!(tags.contains("policy_violation"));
}

#[tokio::test]
async fn verified_buyer_flag_follows_completed_orders() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    sqlx::query(
        "INSERT INTO orders (id, product_id, customer_email, order_date, status) VALUES (?, ?, ?, ?, 'completed')",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product.id.to_string())
    .bind("buyer@example.com")
    .bind(Utc::now().to_rfc3339())
    .execute(&pool)
    .await
    .unwrap();

    let (_, body) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 4,
            "content": "Solid purchase, would buy again",
            "reviewerEmail": "buyer@example.com",
        }),
    )
    .await;
    assert_eq!(body["isVerified"], true);

    let (_, body) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 4,
            "content": "Solid purchase, would buy again",
            "reviewerEmail": "stranger@example.com",
        }),
    )
    .await;
    assert_eq!(body["isVerified"], false);
}

#[tokio::test]
async fn media_urls_are_typed_by_extension() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    let (status, _) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 4,
            "content": "Attaching some proof of use",
            "mediaUrls": [
                "https://cdn.example.com/unboxing.mp4",
                "https://cdn.example.com/photo.jpg",
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT url, type FROM review_media ORDER BY url")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], ("https://cdn.example.com/photo.jpg".to_string(), "image".to_string()));
    assert_eq!(rows[1], ("https://cdn.example.com/unboxing.mp4".to_string(), "video".to_string()));
}

#[tokio::test]
async fn global_incentive_code_is_returned() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    sqlx::query(
        "INSERT INTO incentives (id, code, description, is_active, product_id, created_at) VALUES (?, ?, ?, 1, NULL, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind("THANKS10")
    .bind("10% off your next order")
    .bind(Utc::now().to_rfc3339())
    .execute(&pool)
    .await
    .unwrap();

    let (_, body) = post_review(
        &app,
        json!({"productId": product.id, "rating": 4, "content": "Happy with this one"}),
    )
    .await;
    assert_eq!(body["incentiveCode"], "THANKS10");
}

#[tokio::test]
async fn product_specific_incentive_wins_over_global() {
    let (_, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    for (code, product_id) in [
        ("GLOBAL10", None),
        ("JUICER15", Some(product.id.to_string())),
    ] {
        sqlx::query(
            "INSERT INTO incentives (id, code, description, is_active, product_id, created_at) VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(code)
        .bind("promo")
        .bind(product_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .unwrap();
    }

    let incentive = db::incentives::find_active_for_product(&pool, product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(incentive.code, "JUICER15");
}

#[tokio::test]
async fn syndication_requires_api_key() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = get_syndication(&app, None, "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_API_KEY");

    let (status, body) = get_syndication(&app, Some("wrong-key"), "").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INVALID_API_KEY");
}

#[tokio::test]
async fn syndication_returns_only_approved_reviews() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();
    let retailer = sample_retailer("ret-key-1", None);
    db::retailers::insert_retailer(&pool, &retailer).await.unwrap();

    let approved = approved_review(product.id);
    db::reviews::insert_review(&pool, &approved).await.unwrap();

    let mut pending = approved_review(product.id);
    pending.id = Uuid::new_v4();
    pending.status = ReviewStatus::Pending;
    db::reviews::insert_review(&pool, &pending).await.unwrap();

    let mut rejected = approved_review(product.id);
    rejected.id = Uuid::new_v4();
    rejected.status = ReviewStatus::Rejected;
    db::reviews::insert_review(&pool, &rejected).await.unwrap();

    let (status, body) = get_syndication(&app, Some("ret-key-1"), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["retailer"], "Acme Retail");
    assert_eq!(body["count"], 1);
    assert_eq!(body["reviews"][0]["id"], approved.id.to_string());
    assert_eq!(body["reviews"][0]["status"], "approved");
    assert_eq!(body["reviews"][0]["product"]["sku"], "CJ-100");
}

#[tokio::test]
async fn syndication_since_filter_windows_results() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();
    let retailer = sample_retailer("ret-key-2", None);
    db::retailers::insert_retailer(&pool, &retailer).await.unwrap();

    let review = approved_review(product.id);
    db::reviews::insert_review(&pool, &review).await.unwrap();

    // Without since: present
    let (_, body) = get_syndication(&app, Some("ret-key-2"), "").await;
    assert_eq!(body["count"], 1);

    // Since after creation: absent
    let future = (review.created_at + Duration::hours(1)).to_rfc3339();
    let (_, body) = get_syndication(
        &app,
        Some("ret-key-2"),
        &format!("?since={}", urlencode(&future)),
    )
    .await;
    assert_eq!(body["count"], 0);

    // Since before creation: present
    let past = (review.created_at - Duration::hours(1)).to_rfc3339();
    let (_, body) = get_syndication(
        &app,
        Some("ret-key-2"),
        &format!("?since={}", urlencode(&past)),
    )
    .await;
    assert_eq!(body["count"], 1);

    // Invalid since: silently ignored, falls back to unfiltered
    let (status, body) = get_syndication(&app, Some("ret-key-2"), "?since=garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn syndication_embeds_media() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();
    let retailer = sample_retailer("ret-key-3", None);
    db::retailers::insert_retailer(&pool, &retailer).await.unwrap();

    let review = approved_review(product.id);
    db::reviews::insert_review(&pool, &review).await.unwrap();
    db::reviews::insert_media(
        &pool,
        &[ReviewMedia {
            id: Uuid::new_v4(),
            review_id: review.id,
            url: "https://cdn.example.com/demo.webm".to_string(),
            media_type: MediaType::Video,
            created_at: Utc::now(),
        }],
    )
    .await
    .unwrap();

    let (_, body) = get_syndication(&app, Some("ret-key-3"), "").await;
    assert_eq!(body["reviews"][0]["media"][0]["type"], "video");
    assert_eq!(
        body["reviews"][0]["media"][0]["url"],
        "https://cdn.example.com/demo.webm"
    );
}

#[tokio::test]
async fn product_stats_aggregates_approved_reviews() {
    let (app, pool) = create_test_app().await;
    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    let mut first = approved_review(product.id);
    first.rating = 5;
    db::reviews::insert_review(&pool, &first).await.unwrap();

    let mut second = approved_review(product.id);
    second.id = Uuid::new_v4();
    second.rating = 4;
    db::reviews::insert_review(&pool, &second).await.unwrap();

    // Pending reviews must not count toward the public aggregate
    let mut pending = approved_review(product.id);
    pending.id = Uuid::new_v4();
    pending.rating = 1;
    pending.status = ReviewStatus::Pending;
    db::reviews::insert_review(&pool, &pending).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/reviews?productId={}", product.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["aggregates"]["reviewCount"], 2);
    assert_eq!(json["aggregates"]["ratingValue"], "4.5");
    assert_eq!(json["product"]["name"], "Citrus Juicer");
}

/// Minimal percent-encoding for the RFC 3339 '+' in query strings
fn urlencode(value: &str) -> String {
    value.replace('+', "%2B").replace(':', "%3A")
}

// ---------------------------------------------------------------------------
// Webhook dispatch
// ---------------------------------------------------------------------------

type ReceivedHits = Arc<Mutex<Vec<(HeaderMap, serde_json::Value)>>>;

/// Spawn a local webhook receiver that records every delivery
async fn spawn_receiver() -> (SocketAddr, ReceivedHits) {
    let hits: ReceivedHits = Arc::new(Mutex::new(Vec::new()));

    async fn receive(
        State(hits): State<ReceivedHits>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> StatusCode {
        hits.lock().await.push((headers, body));
        StatusCode::OK
    }

    let router = Router::new()
        .route("/hook", post(receive))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, hits)
}

#[tokio::test]
async fn webhook_failure_does_not_block_other_retailers() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();

    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    // One reachable receiver and one dead endpoint (connection refused)
    let (addr, hits) = spawn_receiver().await;
    let dead_port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    };

    let healthy = sample_retailer("key-a", Some(format!("http://{}/hook", addr)));
    db::retailers::insert_retailer(&pool, &healthy).await.unwrap();
    let mut unreachable = sample_retailer("key-b", Some(format!("http://127.0.0.1:{}/hook", dead_port)));
    unreachable.name = "Dead Retail".to_string();
    db::retailers::insert_retailer(&pool, &unreachable).await.unwrap();

    let review = approved_review(product.id);
    db::reviews::insert_review(&pool, &review).await.unwrap();

    let dispatcher = WebhookDispatcher::new(PayloadSigner::new("test-secret")).unwrap();
    dispatcher.dispatch(&pool, &review, &product).await;

    let hits = hits.lock().await;
    assert_eq!(hits.len(), 1, "healthy retailer must still be delivered");

    let (headers, body) = &hits[0];
    assert_eq!(headers.get("x-prodomatix-event").unwrap(), "review.created");
    assert!(headers.contains_key("x-prodomatix-signature"));
    assert_eq!(body["event"], "review.created");
    assert_eq!(body["data"]["reviewId"], review.id.to_string());
    assert_eq!(body["data"]["productSku"], "CJ-100");
    assert_eq!(body["data"]["isVerified"], true);
}

#[tokio::test]
async fn webhook_dispatch_with_no_subscribers_is_a_noop() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();

    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    // Retailer without a webhook URL is pull-only
    let pull_only = sample_retailer("key-c", None);
    db::retailers::insert_retailer(&pool, &pull_only).await.unwrap();

    let review = approved_review(product.id);
    let dispatcher = WebhookDispatcher::new(PayloadSigner::new("test-secret")).unwrap();
    // Must return without error and without hanging
    dispatcher.dispatch(&pool, &review, &product).await;
}

// ---------------------------------------------------------------------------
// Classifier-backed paths (local chat-completions stub)
// ---------------------------------------------------------------------------

type ChatRequests = Arc<Mutex<Vec<serde_json::Value>>>;

#[derive(Clone)]
struct ChatStub {
    requests: ChatRequests,
    reply: String,
}

async fn chat_completion(
    State(stub): State<ChatStub>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    stub.requests.lock().await.push(body);
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": stub.reply}}]
    }))
}

/// Spawn a local chat-completions endpoint that records every request
/// and answers with a fixed completion
async fn spawn_chat_stub(reply: &str) -> (ChatClient, ChatRequests) {
    let requests: ChatRequests = Arc::new(Mutex::new(Vec::new()));
    let stub = ChatStub {
        requests: requests.clone(),
        reply: reply.to_string(),
    };

    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completion))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = ChatClient::new("test-key".to_string())
        .unwrap()
        .with_endpoint(format!("http://{}/v1/chat/completions", addr));
    (client, requests)
}

#[tokio::test]
async fn reasoning_classifier_output_is_used_verbatim() {
    let (chat, _requests) = spawn_chat_stub(
        "```json\n{\"status\": \"approved\", \"sentiment\": \"positive\", \"reason\": null, \"tags\": [\"Quality\", \"Price\"]}\n```",
    )
    .await;

    let pipeline = ModerationPipeline::new(None, Some(chat));
    let result = pipeline
        .moderate("Great", "Excellent build quality for the price", 5)
        .await;

    // The local fallback never approves; an approval proves the classifier
    // decision came through untouched.
    assert_eq!(result.status, ReviewStatus::Approved);
    assert_eq!(result.sentiment, Sentiment::Positive);
    assert_eq!(result.tags, vec!["Quality", "Price"]);
}

#[tokio::test]
async fn approved_submission_delivers_webhook_before_drain_completes() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();

    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    let (addr, hits) = spawn_receiver().await;
    let retailer = sample_retailer("key-d", Some(format!("http://{}/hook", addr)));
    db::retailers::insert_retailer(&pool, &retailer).await.unwrap();

    let (chat, _requests) = spawn_chat_stub(
        "{\"status\": \"approved\", \"sentiment\": \"positive\", \"reason\": null, \"tags\": []}",
    )
    .await;

    let state = AppState {
        db: pool.clone(),
        moderation: Arc::new(ModerationPipeline::new(None, Some(chat))),
        webhooks: Arc::new(WebhookDispatcher::new(PayloadSigner::new("test-secret")).unwrap()),
        summaries: Arc::new(SummaryRegenerator::new(None)),
        background_tasks: tokio_util::task::TaskTracker::new(),
        startup_time: Utc::now(),
    };
    let tracker = state.background_tasks.clone();
    let app = prodomatix_review::build_router(state);

    let (status, body) = post_review(
        &app,
        json!({
            "productId": product.id,
            "rating": 5,
            "content": "Excellent build quality for the price",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["moderationStatus"], "approved");

    // The shutdown path closes the tracker and waits; every detached
    // webhook task must have run to completion by then.
    tracker.close();
    tracker.wait().await;

    let hits = hits.lock().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].1["data"]["productSku"], "CJ-100");
}

#[tokio::test]
async fn summary_skips_products_below_review_minimum() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();

    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    for _ in 0..2 {
        let mut review = approved_review(product.id);
        review.id = Uuid::new_v4();
        db::reviews::insert_review(&pool, &review).await.unwrap();
    }

    let (chat, requests) = spawn_chat_stub(
        "{\"pros\": [\"sturdy\"], \"cons\": [], \"verdict\": \"Fine.\"}",
    )
    .await;

    let regenerator = SummaryRegenerator::new(Some(chat));
    let result = regenerator.regenerate(&pool, product.id).await.unwrap();

    assert!(result.is_none());
    assert!(requests.lock().await.is_empty(), "no completion should be requested");

    let summary: Option<String> = sqlx::query_scalar("SELECT ai_summary FROM products WHERE id = ?")
        .bind(product.id.to_string())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(summary.is_none());
}

#[tokio::test]
async fn summary_draws_from_the_most_recent_reviews() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();

    let product = sample_product();
    db::products::insert_product(&pool, &product).await.unwrap();

    for i in 0..25 {
        let mut review = approved_review(product.id);
        review.id = Uuid::new_v4();
        review.content = format!("review number {}", i);
        review.created_at = Utc::now() - Duration::minutes(25 - i);
        db::reviews::insert_review(&pool, &review).await.unwrap();
    }

    let (chat, requests) = spawn_chat_stub(
        "{\"pros\": [\"sturdy\", \"quiet\"], \"cons\": [\"pricey\"], \"verdict\": \"Solid buy.\"}",
    )
    .await;

    let regenerator = SummaryRegenerator::new(Some(chat));
    let summary = regenerator.regenerate(&pool, product.id).await.unwrap().unwrap();
    assert_eq!(summary.verdict, "Solid buy.");

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    let prompt = requests[0]["messages"][0]["content"].as_str().unwrap();
    assert_eq!(prompt.matches("- Rating:").count(), 20);
    assert!(prompt.contains("review number 24"));
    assert!(!prompt.contains("review number 0\""));

    let stored: Option<String> = sqlx::query_scalar("SELECT ai_summary FROM products WHERE id = ?")
        .bind(product.id.to_string())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(stored.unwrap().contains("Solid buy."));
}
