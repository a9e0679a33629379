use std::sync::Arc;
use std::time::Duration;

use lessons_core::model::{
    CompletionChange, DayNumber, Lesson, LessonProgress, Streak, User, UserId, WeekNumber,
};
use serde::Serialize;
use storage::repository::{LessonRepository, ProgressRepository, UserRepository};
use tracing::{info, warn};

use crate::Clock;
use crate::error::TrackerError;
use crate::notifier::{NotesNotification, Notifier};
use crate::quiz_service::QUESTIONS_PER_QUIZ;
use crate::streak_service::StreakService;

/// How long `record_notes` waits on the notifier before giving up.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of one progress write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub progress: LessonProgress,
    /// True only on the write that moved the day from incomplete to complete.
    pub newly_completed: bool,
    /// The advanced streak, present exactly when `newly_completed` is true.
    pub streak: Option<Streak>,
}

/// Progress Tracker: records task, notes and quiz writes for a user's day and
/// decides when the day is completed.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
    streaks: StreakService,
    notifier: Arc<dyn Notifier>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
        streaks: StreakService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            clock,
            users,
            lessons,
            progress,
            streaks,
            notifier,
        }
    }

    /// Replace the day's checked-off tasks with `tasks`.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` for an unknown user or lesson.
    /// - `TrackerError::Validation` for a task outside the lesson, or for a set
    ///   that would uncheck a task on a completed day.
    /// - `TrackerError::Storage` if persistence fails.
    pub async fn record_task_completion<S: AsRef<str> + Sync>(
        &self,
        user_id: UserId,
        day: DayNumber,
        tasks: &[S],
    ) -> Result<ProgressUpdate, TrackerError> {
        let (_, lesson, mut progress) = self.load(user_id, day).await?;
        let change = progress.replace_completed_tasks(&lesson, tasks, self.clock.now())?;
        self.persist(progress, change).await
    }

    /// Replace the day's notes and send them to the learner.
    ///
    /// Completion is never affected. Delivery failures and deliveries slower
    /// than the notify timeout are logged and dropped.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` for an unknown user or lesson.
    /// - `TrackerError::Storage` if persistence fails.
    pub async fn record_notes(
        &self,
        user_id: UserId,
        day: DayNumber,
        notes: impl Into<String>,
    ) -> Result<ProgressUpdate, TrackerError> {
        let (user, lesson, mut progress) = self.load(user_id, day).await?;
        progress.replace_notes(notes);
        let update = self.persist(progress, CompletionChange::Unchanged).await?;

        if let Some(notes) = update.progress.notes() {
            let notification = NotesNotification {
                to: user.email().to_owned(),
                day: day.value(),
                lesson_title: lesson.title().to_owned(),
                notes: notes.to_owned(),
                quiz_score: update.progress.quiz_score(),
                total_questions: QUESTIONS_PER_QUIZ,
            };
            match tokio::time::timeout(NOTIFY_TIMEOUT, self.notifier.send(&notification))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(user = %user_id, day = day.value(), error = %err, "notes notification failed");
                }
                Err(_) => {
                    warn!(
                        user = %user_id,
                        day = day.value(),
                        timeout = ?NOTIFY_TIMEOUT,
                        "notes notification timed out"
                    );
                }
            }
        }

        Ok(update)
    }

    /// Record the latest quiz score for the day.
    ///
    /// # Errors
    ///
    /// - `TrackerError::NotFound` for an unknown user or lesson.
    /// - `TrackerError::Storage` if persistence fails.
    pub async fn record_quiz_score(
        &self,
        user_id: UserId,
        day: DayNumber,
        score: u32,
    ) -> Result<ProgressUpdate, TrackerError> {
        let (_, lesson, mut progress) = self.load(user_id, day).await?;
        let change = progress.record_quiz_score(&lesson, score, self.clock.now())?;
        self.persist(progress, change).await
    }

    /// Stored progress for one day, `None` if the user has not touched it.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user.
    pub async fn progress_for_day(
        &self,
        user_id: UserId,
        day: DayNumber,
    ) -> Result<Option<LessonProgress>, TrackerError> {
        self.require_user(user_id).await?;
        Ok(self.progress.get_progress(user_id, day).await?)
    }

    /// Stored progress for the lessons of one week, ordered by day.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user.
    pub async fn progress_for_week(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Vec<LessonProgress>, TrackerError> {
        self.require_user(user_id).await?;
        let days: Vec<DayNumber> = self
            .lessons
            .lessons_for_week(week)
            .await?
            .iter()
            .map(Lesson::day)
            .collect();

        Ok(self
            .progress
            .list_progress(user_id)
            .await?
            .into_iter()
            .filter(|p| days.contains(&p.day()))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user.
    pub async fn all_progress(&self, user_id: UserId) -> Result<Vec<LessonProgress>, TrackerError> {
        self.require_user(user_id).await?;
        Ok(self.progress.list_progress(user_id).await?)
    }

    /// The first curriculum day the user has not completed; the last day once
    /// everything is done.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user.
    pub async fn current_day(&self, user_id: UserId) -> Result<DayNumber, TrackerError> {
        let progress = self.all_progress(user_id).await?;
        Ok(DayNumber::all()
            .find(|day| {
                !progress
                    .iter()
                    .any(|p| p.day() == *day && p.is_completed())
            })
            .unwrap_or(DayNumber::LAST))
    }

    /// Lesson for the user's current day.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown user or an unseeded day.
    pub async fn today_lesson(&self, user_id: UserId) -> Result<Lesson, TrackerError> {
        let day = self.current_day(user_id).await?;
        self.lesson(day).await
    }

    async fn require_user(&self, user_id: UserId) -> Result<User, TrackerError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| TrackerError::not_found(format!("user {user_id}")))
    }

    async fn lesson(&self, day: DayNumber) -> Result<Lesson, TrackerError> {
        self.lessons
            .get_lesson(day)
            .await?
            .ok_or_else(|| TrackerError::not_found(format!("lesson for day {day}")))
    }

    async fn load(
        &self,
        user_id: UserId,
        day: DayNumber,
    ) -> Result<(User, Lesson, LessonProgress), TrackerError> {
        let user = self.require_user(user_id).await?;
        let lesson = self.lesson(day).await?;
        let progress = self
            .progress
            .get_progress(user_id, day)
            .await?
            .unwrap_or_else(|| LessonProgress::new(user_id, day));
        Ok((user, lesson, progress))
    }

    /// Advance the streak once if this write completed the day, then store the row.
    ///
    /// A failed streak write leaves the row unwritten. Retrying on the same
    /// date does not move the counter.
    async fn persist(
        &self,
        progress: LessonProgress,
        change: CompletionChange,
    ) -> Result<ProgressUpdate, TrackerError> {
        let streak = match (change, progress.completion_date()) {
            (CompletionChange::JustCompleted, Some(completed_on)) => Some(
                self.streaks
                    .advance(progress.user_id(), completed_on, progress.day())
                    .await?,
            ),
            _ => None,
        };

        self.progress.upsert_progress(&progress).await?;
        if streak.is_some() {
            info!(user = %progress.user_id(), day = progress.day().value(), "day completed");
        }

        Ok(ProgressUpdate {
            newly_completed: streak.is_some(),
            progress,
            streak,
        })
    }
}
