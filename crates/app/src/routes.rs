use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lessons_core::model::{DayNumber, UserId, WeekNumber};
use serde::{Deserialize, Serialize};
use services::{curriculum_week, lesson_day};

use crate::response::{AppError, ok};
use crate::state::AppState;

type ApiResult = Result<Response, AppError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/lessons", get(all_lessons))
        .route("/api/lessons/week/:week", get(lessons_for_week))
        .route("/api/lessons/:day", get(get_lesson))
        .route("/api/quiz/:day", get(daily_quiz))
        .route("/api/users/:user_id", get(get_user))
        .route("/api/users/:user_id/lessons/today", get(today_lesson))
        .route("/api/users/:user_id/streak", get(streak))
        .route("/api/users/:user_id/progress", get(all_progress))
        .route("/api/users/:user_id/progress/tasks", post(record_tasks))
        .route("/api/users/:user_id/progress/notes", post(record_notes))
        .route("/api/users/:user_id/progress/quiz", post(record_quiz))
        .route(
            "/api/users/:user_id/progress/week/:week",
            get(progress_for_week),
        )
        .route("/api/users/:user_id/progress/:day", get(progress_for_day))
        .route(
            "/api/users/:user_id/weekly-review/:week",
            get(weekly_review).post(submit_weekly_review),
        )
        .route(
            "/api/users/:user_id/weekly-quiz/:week",
            get(weekly_quiz_result).post(submit_weekly_quiz),
        )
        .with_state(state)
}

// ─── PATH PARSING ──────────────────────────────────────────────────────────────

fn parse_user(raw: &str) -> Result<UserId, AppError> {
    raw.parse::<UserId>()
        .map_err(|_| AppError::validation(format!("invalid user id: {raw}")))
}

fn parse_day(raw: &str) -> Result<DayNumber, AppError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| AppError::validation(format!("invalid day number: {raw}")))?;
    Ok(lesson_day(value)?)
}

fn parse_week(raw: &str) -> Result<WeekNumber, AppError> {
    let value: i64 = raw
        .parse()
        .map_err(|_| AppError::validation(format!("invalid week number: {raw}")))?;
    Ok(curriculum_week(value)?)
}

// ─── HEALTH ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: u64,
}

async fn health(State(state): State<AppState>) -> Response {
    Json(HealthResponse {
        status: "ok",
        uptime: state.uptime_seconds(),
    })
    .into_response()
}

// ─── ACCOUNTS ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SignupRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let user = state
        .services()
        .accounts()
        .signup(&body.username, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, ok(user)).into_response())
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    let user = state
        .services()
        .accounts()
        .login(&body.email, &body.password)
        .await?;
    Ok(ok(user).into_response())
}

async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let user = state.services().accounts().get_user(user_id).await?;
    Ok(ok(user).into_response())
}

// ─── LESSONS ───────────────────────────────────────────────────────────────────

async fn all_lessons(State(state): State<AppState>) -> ApiResult {
    let lessons = state.services().catalog().all_lessons().await?;
    Ok(ok(lessons).into_response())
}

async fn get_lesson(State(state): State<AppState>, Path(day): Path<String>) -> ApiResult {
    let lesson = state.services().catalog().get_lesson(parse_day(&day)?).await?;
    Ok(ok(lesson).into_response())
}

async fn lessons_for_week(State(state): State<AppState>, Path(week): Path<String>) -> ApiResult {
    let lessons = state
        .services()
        .catalog()
        .lessons_for_week(parse_week(&week)?)
        .await?;
    Ok(ok(lessons).into_response())
}

async fn today_lesson(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let lesson = state.services().progress().today_lesson(user_id).await?;
    Ok(ok(lesson).into_response())
}

async fn daily_quiz(State(state): State<AppState>, Path(day): Path<String>) -> ApiResult {
    let quiz = state.services().quizzes().daily_quiz(parse_day(&day)?).await?;
    Ok(ok(quiz).into_response())
}

// ─── PROGRESS ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksRequest {
    day_number: i64,
    completed_tasks: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotesRequest {
    day_number: i64,
    notes: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizScoreRequest {
    day_number: i64,
    score: u32,
}

async fn all_progress(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let progress = state.services().progress().all_progress(user_id).await?;
    Ok(ok(progress).into_response())
}

async fn progress_for_day(
    State(state): State<AppState>,
    Path((user_id, day)): Path<(String, String)>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let progress = state
        .services()
        .progress()
        .progress_for_day(user_id, parse_day(&day)?)
        .await?;
    Ok(ok(progress).into_response())
}

async fn progress_for_week(
    State(state): State<AppState>,
    Path((user_id, week)): Path<(String, String)>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let progress = state
        .services()
        .progress()
        .progress_for_week(user_id, parse_week(&week)?)
        .await?;
    Ok(ok(progress).into_response())
}

async fn record_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<TasksRequest>, JsonRejection>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let Json(body) = payload?;
    let update = state
        .services()
        .progress()
        .record_task_completion(user_id, lesson_day(body.day_number)?, &body.completed_tasks)
        .await?;
    Ok(ok(update).into_response())
}

async fn record_notes(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<NotesRequest>, JsonRejection>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let Json(body) = payload?;
    let update = state
        .services()
        .progress()
        .record_notes(user_id, lesson_day(body.day_number)?, body.notes)
        .await?;
    Ok(ok(update).into_response())
}

async fn record_quiz(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<QuizScoreRequest>, JsonRejection>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let Json(body) = payload?;
    let update = state
        .services()
        .progress()
        .record_quiz_score(user_id, lesson_day(body.day_number)?, body.score)
        .await?;
    Ok(ok(update).into_response())
}

async fn streak(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    state.services().accounts().get_user(user_id).await?;
    let streak = state.services().streaks().get(user_id).await?;
    Ok(ok(streak).into_response())
}

// ─── WEEKLY ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyReviewRequest {
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    quiz_score: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyQuizRequest {
    score: u32,
    #[serde(default)]
    total_questions: Option<u32>,
    #[serde(default)]
    missed_questions: Vec<String>,
}

async fn weekly_review(
    State(state): State<AppState>,
    Path((user_id, week)): Path<(String, String)>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let review = state
        .services()
        .weekly()
        .review(user_id, parse_week(&week)?)
        .await?;
    Ok(ok(review).into_response())
}

async fn submit_weekly_review(
    State(state): State<AppState>,
    Path((user_id, week)): Path<(String, String)>,
    payload: Result<Json<WeeklyReviewRequest>, JsonRejection>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let week = parse_week(&week)?;
    let Json(body) = payload?;
    let review = state
        .services()
        .weekly()
        .submit_review(user_id, week, body.notes, body.quiz_score)
        .await?;
    Ok(ok(review).into_response())
}

async fn weekly_quiz_result(
    State(state): State<AppState>,
    Path((user_id, week)): Path<(String, String)>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let result = state
        .services()
        .weekly()
        .quiz_result(user_id, parse_week(&week)?)
        .await?;
    Ok(ok(result).into_response())
}

async fn submit_weekly_quiz(
    State(state): State<AppState>,
    Path((user_id, week)): Path<(String, String)>,
    payload: Result<Json<WeeklyQuizRequest>, JsonRejection>,
) -> ApiResult {
    let user_id = parse_user(&user_id)?;
    let week = parse_week(&week)?;
    let Json(body) = payload?;
    let result = state
        .services()
        .weekly()
        .submit_quiz(
            user_id,
            week,
            body.score,
            body.total_questions,
            body.missed_questions,
        )
        .await?;
    Ok(ok(result).into_response())
}
