use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::util::ServiceExt;

use trackline::config::Config;
use trackline::notify::{QueueEvent, QueueEventData, QueueEvents};
use trackline::payments;
use trackline::state::AppState;
use trackline::{build_router, db};

const TEST_SECRET: &str = "api-test-secret";

async fn test_app() -> (Router, tempfile::TempDir) {
    let uploads = tempfile::tempdir().expect("upload dir");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        skip_payment_secret: TEST_SECRET.to_string(),
        upload_folder: uploads.path().to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        host: "127.0.0.1".to_string(),
        port: 0,
    };

    let state = Arc::new(AppState {
        pool: Arc::new(pool),
        config: Arc::new(config),
        events: QueueEvents::new(16),
    });

    (build_router(state), uploads)
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed_reviewer(app: &Router, id: &str) {
    let (status, _) = send_json(
        app,
        "PUT",
        &format!("/api/profiles/{id}"),
        Some(json!({
            "username": id,
            "tiktok_handle": format!("@{id}"),
            "reviewer_name": format!("Reviewer {id}"),
            "is_reviewer": true,
            "skip_price_usd": 5.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn song_json(submitter: &str, title: &str) -> Value {
    json!({
        "submitter_id": submitter,
        "artist_name": "Mica",
        "tiktok_name": "@mica",
        "song_title": title,
        "song_story": "made it after a long shift",
        "song_link": "https://songs.example/night-drive"
    })
}

async fn enqueue(app: &Router, reviewer: &str, submitter: &str, title: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        &format!("/api/reviewers/{reviewer}/queue"),
        Some(song_json(submitter, title)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_works() {
    let (app, _uploads) = test_app().await;
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn submit_list_complete_and_history() {
    let (app, _uploads) = test_app().await;
    seed_reviewer(&app, "rev-1").await;

    let (status, submission) = send_json(
        &app,
        "POST",
        "/api/reviewers/rev-1/queue",
        Some(song_json("artist-1", "Night Drive")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submission["queue_position"], 0);
    assert_eq!(submission["status"], "pending");
    let id = submission["id"].as_str().unwrap().to_string();

    let (status, queue) = send_json(&app, "GET", "/api/reviewers/rev-1/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert_eq!(queue[0]["song_title"], "Night Drive");

    let (status, fetched) = send_json(&app, "GET", &format!("/api/submissions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());

    let (status, done) = send_json(
        &app,
        "POST",
        &format!("/api/reviewers/rev-1/queue/{id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "reviewed");

    let (_, queue) = send_json(&app, "GET", "/api/reviewers/rev-1/queue", None).await;
    assert!(queue.as_array().unwrap().is_empty());

    let (_, history) = send_json(&app, "GET", "/api/reviewers/rev-1/history", None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], id.as_str());
}

#[tokio::test]
async fn unknown_reviewer_queue_reads_empty_but_rejects_submissions() {
    let (app, _uploads) = test_app().await;

    let (status, queue) = send_json(&app, "GET", "/api/reviewers/ghost/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(queue.as_array().unwrap().is_empty());

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/reviewers/ghost/queue",
        Some(song_json("artist-1", "Night Drive")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn validation_failures_use_the_error_envelope() {
    let (app, _uploads) = test_app().await;
    seed_reviewer(&app, "rev-1").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/reviewers/rev-1/queue",
        Some(json!({ "submitter_id": "artist-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("song_title"));
}

#[tokio::test]
async fn move_endpoint_swaps_neighbors_and_guards_the_edges() {
    let (app, _uploads) = test_app().await;
    seed_reviewer(&app, "rev-1").await;

    let first = enqueue(&app, "rev-1", "artist-1", "First").await;
    let second = enqueue(&app, "rev-1", "artist-2", "Second").await;

    let (status, moved) = send_json(
        &app,
        "POST",
        &format!("/api/reviewers/rev-1/queue/{second}/move"),
        Some(json!({ "target_position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["queue_position"], 0);

    let (_, queue) = send_json(&app, "GET", "/api/reviewers/rev-1/queue", None).await;
    assert_eq!(queue[0]["id"], second.as_str());
    assert_eq!(queue[1]["id"], first.as_str());

    // Now at the head, it has no upward neighbor.
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/reviewers/rev-1/queue/{second}/move"),
        Some(json!({ "target_position": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_OPERATION");
}

#[tokio::test]
async fn skip_endpoint_requires_a_valid_proof() {
    let (app, _uploads) = test_app().await;
    seed_reviewer(&app, "rev-1").await;

    enqueue(&app, "rev-1", "artist-1", "First").await;
    let second = enqueue(&app, "rev-1", "artist-2", "Second").await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/reviewers/rev-1/queue/{second}/skip"),
        Some(json!({ "reference": "pay_9", "signature": "not-a-signature" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "PAYMENT_REQUIRED");

    let signature = payments::expected_signature("pay_9", &second, "rev-1", TEST_SECRET);
    let (status, skipped) = send_json(
        &app,
        "POST",
        &format!("/api/reviewers/rev-1/queue/{second}/skip"),
        Some(json!({ "reference": "pay_9", "signature": signature })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(skipped["queue_position"], -1);

    let (_, queue) = send_json(&app, "GET", "/api/reviewers/rev-1/queue", None).await;
    assert_eq!(queue[0]["id"], second.as_str());
}

#[tokio::test]
async fn queue_mutations_reach_event_subscribers() {
    let uploads = tempfile::tempdir().expect("upload dir");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");

    let state = Arc::new(AppState {
        pool: Arc::new(pool),
        config: Arc::new(Config {
            database_url: "sqlite::memory:".to_string(),
            skip_payment_secret: TEST_SECRET.to_string(),
            upload_folder: uploads.path().to_path_buf(),
            max_upload_bytes: 1024 * 1024,
            host: "127.0.0.1".to_string(),
            port: 0,
        }),
        events: QueueEvents::new(16),
    });
    let app = build_router(state.clone());
    let mut rx = state.events.subscribe();

    // Profile writes are silent; only queue mutations publish.
    seed_reviewer(&app, "rev-1").await;
    let id = enqueue(&app, "rev-1", "artist-1", "Night Drive").await;

    let event = rx.recv().await.unwrap();
    assert_eq!(
        event,
        QueueEvent {
            reviewer_id: "rev-1".to_string(),
            data: QueueEventData::Enqueued {
                submission_id: id.clone(),
                queue_position: 0,
            },
        }
    );

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/reviewers/rev-1/queue/{id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.data, QueueEventData::Completed { submission_id: id });
}

#[tokio::test]
async fn events_endpoint_responds_as_an_event_stream() {
    let (app, _uploads) = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/reviewers/rev-1/events")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
}

#[tokio::test]
async fn reviews_and_ratings_round_trip() {
    let (app, _uploads) = test_app().await;
    seed_reviewer(&app, "rev-1").await;
    let id = enqueue(&app, "rev-1", "artist-1", "Night Drive").await;

    for (rating, comment) in [(5, "hook is great"), (4, "solid")] {
        let (status, review) = send_json(
            &app,
            "POST",
            &format!("/api/submissions/{id}/reviews"),
            Some(json!({ "reviewer_id": "rev-1", "rating": rating, "comment": comment })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(review["rating"], rating);
    }

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/submissions/{id}/reviews"),
        Some(json!({ "reviewer_id": "rev-1", "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");

    let (status, listed) = send_json(
        &app,
        "GET",
        &format!("/api/submissions/{id}/reviews"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (status, rating) = send_json(
        &app,
        "GET",
        &format!("/api/submissions/{id}/rating"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating["average_rating"], 4.5);

    let (_, by_reviewer) = send_json(&app, "GET", "/api/reviewers/rev-1/reviews", None).await;
    assert_eq!(by_reviewer.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn profiles_and_directory_endpoints() {
    let (app, _uploads) = test_app().await;
    seed_reviewer(&app, "rev-1").await;

    let (status, body) = send_json(&app, "GET", "/api/profiles/rev-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tiktok_handle"], "@rev-1");
    assert_eq!(body["is_reviewer"], true);

    let (status, _) = send_json(&app, "GET", "/api/profiles/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    enqueue(&app, "rev-1", "artist-1", "First").await;

    let (status, directory) = send_json(&app, "GET", "/api/reviewers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(directory.as_array().unwrap().len(), 1);
    assert_eq!(directory[0]["queue_length"], 1);

    let (status, by_handle) =
        send_json(&app, "GET", "/api/reviewers/by-handle/@rev-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_handle["id"], "rev-1");

    let (status, as_reviewer) = send_json(&app, "GET", "/api/reviewers/rev-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_reviewer["id"], "rev-1");

    let (status, submissions) =
        send_json(&app, "GET", "/api/users/artist-1/submissions?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submissions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_accepts_media_and_rejects_the_rest() {
    let (app, uploads) = test_app().await;

    let boundary = "----trackline-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let stored: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(stored["url"].as_str().unwrap().starts_with("/uploads/"));
    let filename = stored["filename"].as_str().unwrap();
    assert!(uploads.path().join(filename).exists());

    // An executable dressed as a form upload is refused.
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"setup.exe\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/x-msdownload\r\n\r\n");
    body.extend_from_slice(b"MZ");
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
