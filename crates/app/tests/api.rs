use app::{AppState, app};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lessons_core::time::fixed_clock;
use serde_json::{Value, json};
use services::AppServices;
use tower::ServiceExt;

async fn test_app() -> Router {
    let services = AppServices::in_memory(fixed_clock())
        .await
        .unwrap()
        .with_hash_cost(4);
    app(AppState::new(services))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn signup(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/signup",
        Some(json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn lessons_are_served_by_day_and_week() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/api/lessons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 30);

    let (status, body) = send(&app, "GET", "/api/lessons/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dayNumber"], 1);
    assert_eq!(body["data"]["title"], "Introduction to DeFi");

    let (status, body) = send(&app, "GET", "/api/lessons/week/5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn out_of_range_day_and_week_use_error_envelope() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/api/lessons/31", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = send(&app, "GET", "/api/lessons/week/6", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, "GET", "/api/lessons/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn signup_login_and_duplicate() {
    let app = test_app().await;
    let id = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({ "email": "ALICE@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert!(body["data"].get("passwordHash").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/login",
        Some(json!({ "email": "alice@example.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = send(
        &app,
        "POST",
        "/api/signup",
        Some(json!({
            "username": "alice",
            "email": "alice2@example.com",
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn completing_a_day_advances_streak_and_moves_today() {
    let app = test_app().await;
    let id = signup(&app, "bob").await;

    let (_, lesson) = send(&app, "GET", "/api/lessons/1", None).await;
    let tasks = lesson["data"]["tasks"].clone();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/{id}/progress/tasks"),
        Some(json!({ "dayNumber": 1, "completedTasks": tasks })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"]["completed"], false);
    assert_eq!(body["data"]["newlyCompleted"], false);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/{id}/progress/quiz"),
        Some(json!({ "dayNumber": 1, "score": 13 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"]["completed"], true);
    assert_eq!(body["data"]["newlyCompleted"], true);
    assert_eq!(body["data"]["streak"]["currentStreak"], 1);

    let (_, body) = send(&app, "GET", &format!("/api/users/{id}/streak"), None).await;
    assert_eq!(body["data"]["currentStreak"], 1);
    assert_eq!(body["data"]["lastActiveDate"], "2023-11-14");

    let (_, body) = send(&app, "GET", &format!("/api/users/{id}/lessons/today"), None).await;
    assert_eq!(body["data"]["dayNumber"], 2);

    let (_, body) = send(&app, "GET", &format!("/api/users/{id}/progress/2"), None).await;
    assert_eq!(body["data"], Value::Null);

    let (_, body) = send(&app, "GET", &format!("/api/users/{id}/progress/week/1"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bad_requests_are_validation_errors() {
    let app = test_app().await;
    let id = signup(&app, "carol").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/{id}/progress/tasks"),
        Some(json!({ "dayNumber": 1, "completedTasks": ["Not a real task"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/{id}/progress/quiz"),
        Some(json!({ "dayNumber": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, "GET", "/api/users/not-a-uuid/progress", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "GET",
        "/api/users/00000000-0000-4000-8000-000000000000/progress",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn daily_quiz_is_stable_across_requests() {
    let app = test_app().await;
    let (status, first) = send(&app, "GET", "/api/quiz/7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["questions"].as_array().unwrap().len(), 15);
    assert_eq!(first["data"]["questions"][0]["id"], "d7-easy-1");

    let (_, second) = send(&app, "GET", "/api/quiz/7", None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn weekly_review_and_quiz_round_trip() {
    let app = test_app().await;
    let id = signup(&app, "dana").await;

    let (_, body) = send(&app, "GET", &format!("/api/users/{id}/weekly-review/1"), None).await;
    assert_eq!(body["data"], Value::Null);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/{id}/weekly-review/1"),
        Some(json!({ "notes": "week one recap", "quizScore": 34 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/users/{id}/weekly-quiz/1"),
        Some(json!({ "score": 30, "missedQuestions": ["w1-q4"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalQuestions"], 40);

    let (_, body) = send(&app, "GET", &format!("/api/users/{id}/weekly-quiz/1"), None).await;
    assert_eq!(body["data"]["score"], 30);
    assert_eq!(body["data"]["missedQuestions"][0], "w1-q4");
}
