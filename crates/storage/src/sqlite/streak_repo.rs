use async_trait::async_trait;
use lessons_core::model::{Streak, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, map_streak_row};
use crate::repository::{StorageError, StreakRepository};

#[async_trait]
impl StreakRepository for SqliteRepository {
    async fn get_streak(&self, user_id: UserId) -> Result<Option<Streak>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, current_streak, longest_streak, last_active_date, last_completed_day
            FROM streaks
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_streak_row).transpose()
    }

    async fn create_streak(&self, streak: &Streak) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO streaks (
                user_id, current_streak, longest_streak, last_active_date, last_completed_day
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(streak.user_id().to_string())
        .bind(i64::from(streak.current_streak()))
        .bind(i64::from(streak.longest_streak()))
        .bind(streak.last_active_date())
        .bind(streak.last_completed_day().map(|d| i64::from(d.value())))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn update_streak(
        &self,
        user_id: UserId,
        update: &(dyn for<'s> Fn(&'s mut Streak) + Send + Sync),
    ) -> Result<Streak, StorageError> {
        let id = user_id.to_string();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Writing first takes the database write lock before the row is read,
        // so concurrent advances for the same user serialize here.
        sqlx::query(
            r"
            INSERT INTO streaks (user_id, current_streak, longest_streak)
            VALUES (?1, 0, 0)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let row = sqlx::query(
            r"
            SELECT user_id, current_streak, longest_streak, last_active_date, last_completed_day
            FROM streaks
            WHERE user_id = ?1
            ",
        )
        .bind(&id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let mut streak = map_streak_row(&row)?;
        update(&mut streak);

        sqlx::query(
            r"
            UPDATE streaks SET
                current_streak = ?2,
                longest_streak = ?3,
                last_active_date = ?4,
                last_completed_day = ?5
            WHERE user_id = ?1
            ",
        )
        .bind(&id)
        .bind(i64::from(streak.current_streak()))
        .bind(i64::from(streak.longest_streak()))
        .bind(streak.last_active_date())
        .bind(streak.last_completed_day().map(|d| i64::from(d.value())))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(streak)
    }
}
