use async_trait::async_trait;
use lessons_core::model::{DailyQuiz, DayNumber};

use super::SqliteRepository;
use super::mapping::{db_err, map_quiz_row, to_json};
use crate::repository::{QuizRepository, StorageError};

#[async_trait]
impl QuizRepository for SqliteRepository {
    async fn get_quiz(&self, day: DayNumber) -> Result<Option<DailyQuiz>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT day_number, week_number, questions, created_at
            FROM daily_quizzes
            WHERE day_number = ?1
            ",
        )
        .bind(i64::from(day.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_quiz_row).transpose()
    }

    async fn save_quiz_if_absent(&self, quiz: &DailyQuiz) -> Result<DailyQuiz, StorageError> {
        sqlx::query(
            r"
            INSERT INTO daily_quizzes (day_number, week_number, questions, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(day_number) DO NOTHING
            ",
        )
        .bind(i64::from(quiz.day().value()))
        .bind(i64::from(quiz.week().value()))
        .bind(to_json(quiz.questions())?)
        .bind(quiz.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_quiz(quiz.day()).await?.ok_or(StorageError::NotFound)
    }
}
