use async_trait::async_trait;
use lessons_core::model::{DayNumber, LessonProgress, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, map_progress_row, to_json};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        day: DayNumber,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, day_number, completed_tasks, notes, quiz_score, completed, completed_at
            FROM lesson_progress
            WHERE user_id = ?1 AND day_number = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(day.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, day_number, completed_tasks, notes, quiz_score, completed, completed_at
            FROM lesson_progress
            WHERE user_id = ?1
            ORDER BY day_number ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_progress (
                user_id, day_number, completed_tasks, notes, quiz_score, completed, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id, day_number) DO UPDATE SET
                completed_tasks = excluded.completed_tasks,
                notes = excluded.notes,
                quiz_score = excluded.quiz_score,
                completed = excluded.completed,
                completed_at = excluded.completed_at
            ",
        )
        .bind(progress.user_id().to_string())
        .bind(i64::from(progress.day().value()))
        .bind(to_json(progress.completed_tasks())?)
        .bind(progress.notes())
        .bind(progress.quiz_score().map(i64::from))
        .bind(progress.is_completed())
        .bind(progress.completed_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}
