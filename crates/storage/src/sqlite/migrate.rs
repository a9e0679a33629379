use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Versioned schema migrations, recorded in `schema_migrations`.
///
/// Version 1 holds accounts, the curriculum, per-day progress and streaks.
/// Version 2 adds the quiz cache and weekly reviews.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lessons (
                    day_number INTEGER PRIMARY KEY CHECK (day_number BETWEEN 1 AND 30),
                    week_number INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 5),
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    reading_links TEXT NOT NULL,
                    tasks TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lesson_progress (
                    user_id TEXT NOT NULL,
                    day_number INTEGER NOT NULL CHECK (day_number BETWEEN 1 AND 30),
                    completed_tasks TEXT NOT NULL,
                    notes TEXT,
                    quiz_score INTEGER CHECK (quiz_score >= 0),
                    completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
                    completed_at TEXT,
                    PRIMARY KEY (user_id, day_number),
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS streaks (
                    user_id TEXT PRIMARY KEY,
                    current_streak INTEGER NOT NULL CHECK (current_streak >= 0),
                    longest_streak INTEGER NOT NULL CHECK (longest_streak >= current_streak),
                    last_active_date TEXT,
                    last_completed_day INTEGER,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_lessons_week
                    ON lessons (week_number, day_number);
            ",
        )
        .execute(&mut *tx)
        .await?;

        record_version(&mut tx, 1).await?;
        tx.commit().await?;
    }

    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS daily_quizzes (
                    day_number INTEGER PRIMARY KEY CHECK (day_number BETWEEN 1 AND 30),
                    week_number INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 5),
                    questions TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS weekly_reviews (
                    user_id TEXT NOT NULL,
                    week_number INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 5),
                    review_notes TEXT,
                    quiz_score INTEGER CHECK (quiz_score >= 0),
                    completed INTEGER NOT NULL DEFAULT 1 CHECK (completed IN (0, 1)),
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, week_number),
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS weekly_quiz_results (
                    id INTEGER PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    week_number INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 5),
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions > 0),
                    missed_questions TEXT NOT NULL,
                    submitted_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_weekly_quiz_results_user_week
                    ON weekly_quiz_results (user_id, week_number, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        record_version(&mut tx, 2).await?;
        tx.commit().await?;
    }

    Ok(())
}

async fn record_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
