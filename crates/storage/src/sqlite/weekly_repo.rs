use async_trait::async_trait;
use lessons_core::model::{UserId, WeekNumber, WeeklyQuizResult, WeeklyReview};

use super::SqliteRepository;
use super::mapping::{db_err, map_quiz_result_row, map_review_row, to_json};
use crate::repository::{StorageError, WeeklyRepository};

#[async_trait]
impl WeeklyRepository for SqliteRepository {
    async fn upsert_review(&self, review: &WeeklyReview) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO weekly_reviews (
                user_id, week_number, review_notes, quiz_score, completed, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, week_number) DO UPDATE SET
                review_notes = excluded.review_notes,
                quiz_score = excluded.quiz_score,
                completed = excluded.completed,
                completed_at = excluded.completed_at
            ",
        )
        .bind(review.user_id().to_string())
        .bind(i64::from(review.week().value()))
        .bind(review.review_notes())
        .bind(review.quiz_score().map(i64::from))
        .bind(review.is_completed())
        .bind(review.completed_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_review(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyReview>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, week_number, review_notes, quiz_score, completed, completed_at
            FROM weekly_reviews
            WHERE user_id = ?1 AND week_number = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(week.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_review_row).transpose()
    }

    async fn append_quiz_result(&self, result: &WeeklyQuizResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO weekly_quiz_results (
                user_id, week_number, score, total_questions, missed_questions, submitted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(result.user_id().to_string())
        .bind(i64::from(result.week().value()))
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(to_json(result.missed_questions())?)
        .bind(result.submitted_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(res.last_insert_rowid())
    }

    async fn latest_quiz_result(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyQuizResult>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, week_number, score, total_questions, missed_questions, submitted_at
            FROM weekly_quiz_results
            WHERE user_id = ?1 AND week_number = ?2
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(week.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_quiz_result_row).transpose()
    }
}
