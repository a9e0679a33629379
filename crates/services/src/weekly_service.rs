use std::sync::Arc;

use lessons_core::model::{
    DEFAULT_WEEKLY_QUESTIONS, UserId, WeekNumber, WeeklyQuizResult, WeeklyReview,
};
use storage::repository::{UserRepository, WeeklyRepository};
use tracing::info;

use crate::Clock;
use crate::error::TrackerError;

/// End-of-week reviews and weekly quiz results.
#[derive(Clone)]
pub struct WeeklyService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    weekly: Arc<dyn WeeklyRepository>,
}

impl WeeklyService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        weekly: Arc<dyn WeeklyRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            weekly,
        }
    }

    /// Store the review for a week, replacing any earlier submission.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` for an unknown user.
    /// - `TrackerError::Storage` if persistence fails.
    pub async fn submit_review(
        &self,
        user_id: UserId,
        week: WeekNumber,
        notes: Option<String>,
        quiz_score: Option<u32>,
    ) -> Result<WeeklyReview, TrackerError> {
        self.require_user(user_id).await?;
        let review = WeeklyReview::submit(user_id, week, notes, quiz_score, self.clock.now());
        self.weekly.upsert_review(&review).await?;
        info!(user = %user_id, week = week.value(), "weekly review submitted");
        Ok(review)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user.
    pub async fn review(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyReview>, TrackerError> {
        self.require_user(user_id).await?;
        Ok(self.weekly.get_review(user_id, week).await?)
    }

    /// Append a weekly quiz attempt. `total_questions` defaults to 40.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` for an unknown user.
    /// - `TrackerError::Validation` if the score exceeds the total.
    /// - `TrackerError::Storage` if persistence fails.
    pub async fn submit_quiz(
        &self,
        user_id: UserId,
        week: WeekNumber,
        score: u32,
        total_questions: Option<u32>,
        missed_questions: Vec<String>,
    ) -> Result<WeeklyQuizResult, TrackerError> {
        self.require_user(user_id).await?;
        let result = WeeklyQuizResult::new(
            user_id,
            week,
            score,
            total_questions.unwrap_or(DEFAULT_WEEKLY_QUESTIONS),
            missed_questions,
            self.clock.now(),
        )?;
        self.weekly.append_quiz_result(&result).await?;
        Ok(result)
    }

    /// Most recent weekly quiz attempt, if any.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user.
    pub async fn quiz_result(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyQuizResult>, TrackerError> {
        self.require_user(user_id).await?;
        Ok(self.weekly.latest_quiz_result(user_id, week).await?)
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), TrackerError> {
        match self.users.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(TrackerError::not_found(format!("user {user_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lessons_core::model::{SignupDraft, User};
    use lessons_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    async fn setup(clock: Clock) -> (WeeklyService, UserId) {
        let repo = Arc::new(InMemoryRepository::new());
        let draft = SignupDraft::new("dana", "dana@example.com", "password123").unwrap();
        let user = User::new(UserId::random(), &draft, "hash".into(), fixed_now()).unwrap();
        repo.insert_user(&user).await.unwrap();
        (WeeklyService::new(clock, repo.clone(), repo), user.id())
    }

    #[tokio::test]
    async fn review_resubmission_replaces_previous() {
        let (service, user) = setup(fixed_clock()).await;
        let week = WeekNumber::new(1).unwrap();

        service
            .submit_review(user, week, Some("first pass".into()), None)
            .await
            .unwrap();
        service
            .submit_review(user, week, Some("  final  ".into()), Some(33))
            .await
            .unwrap();

        let review = service.review(user, week).await.unwrap().expect("review");
        assert_eq!(review.review_notes(), Some("final"));
        assert_eq!(review.quiz_score(), Some(33));
        assert!(review.is_completed());
    }

    #[tokio::test]
    async fn quiz_result_defaults_total_and_returns_latest() {
        let mut clock = fixed_clock();
        let (service, user) = setup(clock).await;
        let week = WeekNumber::new(4).unwrap();

        let first = service
            .submit_quiz(user, week, 31, None, vec!["q7".into()])
            .await
            .unwrap();
        assert_eq!(first.total_questions(), 40);

        clock.advance(Duration::minutes(5));
        let later = WeeklyService {
            clock,
            ..service.clone()
        };
        later.submit_quiz(user, week, 39, None, Vec::new()).await.unwrap();

        let latest = service.quiz_result(user, week).await.unwrap().expect("result");
        assert_eq!(latest.score(), 39);
    }

    #[tokio::test]
    async fn score_above_total_is_validation() {
        let (service, user) = setup(fixed_clock()).await;
        let err = service
            .submit_quiz(user, WeekNumber::new(2).unwrap(), 41, None, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (service, _) = setup(fixed_clock()).await;
        let err = service
            .review(UserId::random(), WeekNumber::new(1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }
}
