use async_trait::async_trait;
use lessons_core::model::{DayNumber, Lesson, WeekNumber};

use super::SqliteRepository;
use super::mapping::{db_err, map_lesson_row, to_json};
use crate::repository::{LessonRepository, StorageError};

const LESSON_COLUMNS: &str =
    "day_number, week_number, title, description, reading_links, tasks";

#[async_trait]
impl LessonRepository for SqliteRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lessons (
                day_number, week_number, title, description, reading_links, tasks
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(day_number) DO UPDATE SET
                week_number = excluded.week_number,
                title = excluded.title,
                description = excluded.description,
                reading_links = excluded.reading_links,
                tasks = excluded.tasks
            ",
        )
        .bind(i64::from(lesson.day().value()))
        .bind(i64::from(lesson.week().value()))
        .bind(lesson.title())
        .bind(lesson.description())
        .bind(to_json(lesson.reading_links())?)
        .bind(to_json(lesson.tasks())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_lesson(&self, day: DayNumber) -> Result<Option<Lesson>, StorageError> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE day_number = ?1");
        let row = sqlx::query(&sql)
            .bind(i64::from(day.value()))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn lessons_for_week(&self, week: WeekNumber) -> Result<Vec<Lesson>, StorageError> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE week_number = ?1 ORDER BY day_number ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(week.value()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn all_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons ORDER BY day_number ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn count_lessons(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        u64::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid lesson count: {count}")))
    }
}
