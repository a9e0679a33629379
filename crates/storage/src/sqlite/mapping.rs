use chrono::{DateTime, NaiveDate, Utc};
use lessons_core::model::{
    DailyQuiz, DayNumber, Lesson, LessonProgress, QuizQuestion, Streak, User, UserId, WeekNumber,
    WeeklyQuizResult, WeeklyReview,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, turning constraint violations into domain outcomes.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn user_id_from_str(v: &str) -> Result<UserId, StorageError> {
    v.parse::<UserId>().map_err(ser)
}

pub(crate) fn day_from_i64(v: i64) -> Result<DayNumber, StorageError> {
    DayNumber::new(v).map_err(ser)
}

pub(crate) fn week_from_i64(v: i64) -> Result<WeekNumber, StorageError> {
    WeekNumber::new(v).map_err(ser)
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn opt_u32_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|v| u32_from_i64(field, v)).transpose()
}

pub(crate) fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let reading_links: Vec<String> =
        from_json(&row.try_get::<String, _>("reading_links").map_err(ser)?)?;
    let tasks: Vec<String> = from_json(&row.try_get::<String, _>("tasks").map_err(ser)?)?;

    Lesson::new(
        day_from_i64(row.try_get("day_number").map_err(ser)?)?,
        week_from_i64(row.try_get("week_number").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        reading_links,
        tasks,
    )
    .map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    User::from_persisted(
        user_id_from_str(&id)?,
        row.try_get("username").map_err(ser)?,
        row.try_get("email").map_err(ser)?,
        row.try_get("password_hash").map_err(ser)?,
        row.try_get::<DateTime<Utc>, _>("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let completed_tasks: Vec<String> =
        from_json(&row.try_get::<String, _>("completed_tasks").map_err(ser)?)?;

    LessonProgress::from_persisted(
        user_id_from_str(&user_id)?,
        day_from_i64(row.try_get("day_number").map_err(ser)?)?,
        completed_tasks,
        row.try_get::<Option<String>, _>("notes").map_err(ser)?,
        opt_u32_from_i64("quiz_score", row.try_get("quiz_score").map_err(ser)?)?,
        row.try_get::<bool, _>("completed").map_err(ser)?,
        row.try_get::<Option<DateTime<Utc>>, _>("completed_at")
            .map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_streak_row(row: &SqliteRow) -> Result<Streak, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    Streak::from_persisted(
        user_id_from_str(&user_id)?,
        u32_from_i64("current_streak", row.try_get("current_streak").map_err(ser)?)?,
        u32_from_i64("longest_streak", row.try_get("longest_streak").map_err(ser)?)?,
        row.try_get::<Option<NaiveDate>, _>("last_active_date")
            .map_err(ser)?,
        row.try_get::<Option<i64>, _>("last_completed_day")
            .map_err(ser)?
            .map(day_from_i64)
            .transpose()?,
    )
    .map_err(ser)
}

pub(crate) fn map_quiz_row(row: &SqliteRow) -> Result<DailyQuiz, StorageError> {
    let questions: Vec<QuizQuestion> =
        from_json(&row.try_get::<String, _>("questions").map_err(ser)?)?;
    DailyQuiz::new(
        day_from_i64(row.try_get("day_number").map_err(ser)?)?,
        week_from_i64(row.try_get("week_number").map_err(ser)?)?,
        questions,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_review_row(row: &SqliteRow) -> Result<WeeklyReview, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    Ok(WeeklyReview::from_persisted(
        user_id_from_str(&user_id)?,
        week_from_i64(row.try_get("week_number").map_err(ser)?)?,
        row.try_get("review_notes").map_err(ser)?,
        opt_u32_from_i64("quiz_score", row.try_get("quiz_score").map_err(ser)?)?,
        row.try_get("completed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    ))
}

pub(crate) fn map_quiz_result_row(row: &SqliteRow) -> Result<WeeklyQuizResult, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let missed: Vec<String> =
        from_json(&row.try_get::<String, _>("missed_questions").map_err(ser)?)?;
    WeeklyQuizResult::new(
        user_id_from_str(&user_id)?,
        week_from_i64(row.try_get("week_number").map_err(ser)?)?,
        u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        u32_from_i64("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        missed,
        row.try_get("submitted_at").map_err(ser)?,
    )
    .map_err(ser)
}
