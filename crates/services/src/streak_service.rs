use std::sync::Arc;

use chrono::NaiveDate;
use lessons_core::model::{DayNumber, Streak, UserId};
use storage::repository::StreakRepository;
use tracing::info;

use crate::error::TrackerError;

/// Streak Engine: advances per-user streaks on day completions.
#[derive(Clone)]
pub struct StreakService {
    streaks: Arc<dyn StreakRepository>,
}

impl StreakService {
    #[must_use]
    pub fn new(streaks: Arc<dyn StreakRepository>) -> Self {
        Self { streaks }
    }

    /// Apply one completion that happened on `completed_on`.
    ///
    /// The read-modify-write is atomic per user; a missing record starts zeroed.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the streak cannot be loaded or stored.
    pub async fn advance(
        &self,
        user_id: UserId,
        completed_on: NaiveDate,
        day: DayNumber,
    ) -> Result<Streak, TrackerError> {
        let streak = self
            .streaks
            .update_streak(user_id, &|streak: &mut Streak| {
                streak.advance(completed_on, day);
            })
            .await?;

        info!(
            user = %user_id,
            day = day.value(),
            %completed_on,
            current = streak.current_streak(),
            longest = streak.longest_streak(),
            "streak advanced"
        );
        Ok(streak)
    }

    /// Current streak for a user; zeroed when none was recorded.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if repository access fails.
    pub async fn get(&self, user_id: UserId) -> Result<Streak, TrackerError> {
        Ok(self
            .streaks
            .get_streak(user_id)
            .await?
            .unwrap_or_else(|| Streak::empty(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn get_defaults_to_zeroed_streak() {
        let service = StreakService::new(Arc::new(InMemoryRepository::new()));
        let user = UserId::random();
        let streak = service.get(user).await.unwrap();
        assert_eq!(streak, Streak::empty(user));
    }

    #[tokio::test]
    async fn same_date_advance_is_idempotent() {
        let service = StreakService::new(Arc::new(InMemoryRepository::new()));
        let user = UserId::random();
        let today = date(2024, 6, 3);

        let first = service.advance(user, today, DayNumber::FIRST).await.unwrap();
        let second = service
            .advance(user, today, DayNumber::new(2).unwrap())
            .await
            .unwrap();

        assert_eq!(first.current_streak(), 1);
        assert_eq!(second.current_streak(), 1);
        assert_eq!(second.longest_streak(), 1);
    }

    #[tokio::test]
    async fn concurrent_same_day_advances_count_once() {
        let service = StreakService::new(Arc::new(InMemoryRepository::new()));
        let user = UserId::random();
        let today = date(2024, 6, 3);
        service
            .advance(user, date(2024, 6, 2), DayNumber::FIRST)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for raw in 2..=6_i64 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let day = DayNumber::new(raw).unwrap();
                service.advance(user, today, day).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let streak = service.get(user).await.unwrap();
        assert_eq!(streak.current_streak(), 2);
        assert_eq!(streak.longest_streak(), 2);
    }
}
