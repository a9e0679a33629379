use async_trait::async_trait;
use lessons_core::model::{
    DailyQuiz, DayNumber, Lesson, LessonProgress, Streak, User, UserId, WeekNumber,
    WeeklyQuizResult, WeeklyReview,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read/write access to the curriculum.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist or replace the lesson for its day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch the lesson for a day, `None` if the day has not been seeded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_lesson(&self, day: DayNumber) -> Result<Option<Lesson>, StorageError>;

    /// Lessons belonging to a week, ordered by day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn lessons_for_week(&self, week: WeekNumber) -> Result<Vec<Lesson>, StorageError>;

    /// Every stored lesson ordered by day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn all_lessons(&self) -> Result<Vec<Lesson>, StorageError>;

    /// Number of stored lessons.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_lessons(&self) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id, username or email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Look up by normalized (lower-case) email.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
}

/// Per-user, per-day lesson progress. Writes are last-writer-wins.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        user_id: UserId,
        day: DayNumber,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// All progress rows for a user, ordered by day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(&self, user_id: UserId) -> Result<Vec<LessonProgress>, StorageError>;

    /// Insert or replace the row keyed by `(user_id, day)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;
}

#[async_trait]
pub trait StreakRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_streak(&self, user_id: UserId) -> Result<Option<Streak>, StorageError>;

    /// Store a streak unless the user already has one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn create_streak(&self, streak: &Streak) -> Result<(), StorageError>;

    /// Load the user's streak (zeroed if absent), apply `update`, store and
    /// return the result. No other writer can observe or change the streak
    /// between the read and the write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn update_streak(
        &self,
        user_id: UserId,
        update: &(dyn for<'s> Fn(&'s mut Streak) + Send + Sync),
    ) -> Result<Streak, StorageError>;
}

/// Cache of generated daily quizzes, one per lesson day.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_quiz(&self, day: DayNumber) -> Result<Option<DailyQuiz>, StorageError>;

    /// Store `quiz` unless one already exists for its day, then return the
    /// stored quiz (the existing one wins a race).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn save_quiz_if_absent(&self, quiz: &DailyQuiz) -> Result<DailyQuiz, StorageError>;
}

#[async_trait]
pub trait WeeklyRepository: Send + Sync {
    /// Insert or replace the review for `(user, week)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the review cannot be stored.
    async fn upsert_review(&self, review: &WeeklyReview) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_review(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyReview>, StorageError>;

    /// Append a quiz result; returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_quiz_result(&self, result: &WeeklyQuizResult) -> Result<i64, StorageError>;

    /// Most recent result for `(user, week)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn latest_quiz_result(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyQuizResult>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<BTreeMap<DayNumber, Lesson>>>,
    users: Arc<Mutex<HashMap<UserId, User>>>,
    progress: Arc<Mutex<BTreeMap<(UserId, DayNumber), LessonProgress>>>,
    streaks: Arc<Mutex<HashMap<UserId, Streak>>>,
    quizzes: Arc<Mutex<HashMap<DayNumber, DailyQuiz>>>,
    reviews: Arc<Mutex<HashMap<(UserId, WeekNumber), WeeklyReview>>>,
    quiz_results: Arc<Mutex<Vec<WeeklyQuizResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        lock(&self.lessons)?.insert(lesson.day(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, day: DayNumber) -> Result<Option<Lesson>, StorageError> {
        Ok(lock(&self.lessons)?.get(&day).cloned())
    }

    async fn lessons_for_week(&self, week: WeekNumber) -> Result<Vec<Lesson>, StorageError> {
        Ok(lock(&self.lessons)?
            .values()
            .filter(|lesson| lesson.week() == week)
            .cloned()
            .collect())
    }

    async fn all_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        Ok(lock(&self.lessons)?.values().cloned().collect())
    }

    async fn count_lessons(&self) -> Result<u64, StorageError> {
        Ok(lock(&self.lessons)?.len() as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = lock(&self.users)?;
        let taken = guard.contains_key(&user.id())
            || guard
                .values()
                .any(|u| u.email() == user.email() || u.username() == user.username());
        if taken {
            return Err(StorageError::Conflict);
        }
        guard.insert(user.id(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        day: DayNumber,
    ) -> Result<Option<LessonProgress>, StorageError> {
        Ok(lock(&self.progress)?.get(&(user_id, day)).cloned())
    }

    async fn list_progress(&self, user_id: UserId) -> Result<Vec<LessonProgress>, StorageError> {
        Ok(lock(&self.progress)?
            .values()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        lock(&self.progress)?.insert((progress.user_id(), progress.day()), progress.clone());
        Ok(())
    }
}

#[async_trait]
impl StreakRepository for InMemoryRepository {
    async fn get_streak(&self, user_id: UserId) -> Result<Option<Streak>, StorageError> {
        Ok(lock(&self.streaks)?.get(&user_id).cloned())
    }

    async fn create_streak(&self, streak: &Streak) -> Result<(), StorageError> {
        lock(&self.streaks)?
            .entry(streak.user_id())
            .or_insert_with(|| streak.clone());
        Ok(())
    }

    async fn update_streak(
        &self,
        user_id: UserId,
        update: &(dyn for<'s> Fn(&'s mut Streak) + Send + Sync),
    ) -> Result<Streak, StorageError> {
        // the guard spans the whole read-modify-write
        let mut guard = lock(&self.streaks)?;
        let streak = guard
            .entry(user_id)
            .or_insert_with(|| Streak::empty(user_id));
        update(streak);
        Ok(streak.clone())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn get_quiz(&self, day: DayNumber) -> Result<Option<DailyQuiz>, StorageError> {
        Ok(lock(&self.quizzes)?.get(&day).cloned())
    }

    async fn save_quiz_if_absent(&self, quiz: &DailyQuiz) -> Result<DailyQuiz, StorageError> {
        Ok(lock(&self.quizzes)?
            .entry(quiz.day())
            .or_insert_with(|| quiz.clone())
            .clone())
    }
}

#[async_trait]
impl WeeklyRepository for InMemoryRepository {
    async fn upsert_review(&self, review: &WeeklyReview) -> Result<(), StorageError> {
        lock(&self.reviews)?.insert((review.user_id(), review.week()), review.clone());
        Ok(())
    }

    async fn get_review(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyReview>, StorageError> {
        Ok(lock(&self.reviews)?.get(&(user_id, week)).cloned())
    }

    async fn append_quiz_result(&self, result: &WeeklyQuizResult) -> Result<i64, StorageError> {
        let mut guard = lock(&self.quiz_results)?;
        guard.push(result.clone());
        i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("quiz result id overflow".into()))
    }

    async fn latest_quiz_result(
        &self,
        user_id: UserId,
        week: WeekNumber,
    ) -> Result<Option<WeeklyQuizResult>, StorageError> {
        Ok(lock(&self.quiz_results)?
            .iter()
            .rev()
            .find(|r| r.user_id() == user_id && r.week() == week)
            .cloned())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonRepository>,
    pub users: Arc<dyn UserRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub streaks: Arc<dyn StreakRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub weekly: Arc<dyn WeeklyRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            lessons: Arc::new(repo.clone()),
            users: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            streaks: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            weekly: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lessons_core::model::SignupDraft;
    use lessons_core::time::fixed_now;

    fn build_user(name: &str) -> User {
        let draft = SignupDraft::new(name, format!("{name}@example.com"), "password123").unwrap();
        User::new(UserId::random(), &draft, "$2b$hash".into(), fixed_now()).unwrap()
    }

    fn build_lesson(day: i64, week: i64) -> Lesson {
        Lesson::new(
            DayNumber::new(day).unwrap(),
            WeekNumber::new(week).unwrap(),
            format!("Day {day}"),
            "",
            vec![],
            vec!["read".into(), "write".into()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_or_username_conflicts() {
        let repo = InMemoryRepository::new();
        let alice = build_user("alice");
        repo.insert_user(&alice).await.unwrap();

        let again = build_user("alice");
        let err = repo.insert_user(&again).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let found = repo.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id()), Some(alice.id()));
    }

    #[tokio::test]
    async fn lessons_filter_by_week_in_day_order() {
        let repo = InMemoryRepository::new();
        for (day, week) in [(9, 2), (1, 1), (8, 2), (2, 1)] {
            repo.upsert_lesson(&build_lesson(day, week)).await.unwrap();
        }

        let week2 = repo
            .lessons_for_week(WeekNumber::new(2).unwrap())
            .await
            .unwrap();
        let days: Vec<u8> = week2.iter().map(|l| l.day().value()).collect();
        assert_eq!(days, vec![8, 9]);
        assert_eq!(repo.count_lessons().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn update_streak_starts_from_zeroed_record() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let streak = repo
            .update_streak(user, &|s: &mut Streak| {
                s.advance(today, DayNumber::FIRST);
            })
            .await
            .unwrap();

        assert_eq!(streak.current_streak(), 1);
        assert_eq!(repo.get_streak(user).await.unwrap(), Some(streak));
    }

    #[tokio::test]
    async fn create_streak_does_not_overwrite() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        repo.update_streak(user, &|s: &mut Streak| {
            s.advance(today, DayNumber::FIRST);
        })
        .await
        .unwrap();

        repo.create_streak(&Streak::empty(user)).await.unwrap();
        let stored = repo.get_streak(user).await.unwrap().unwrap();
        assert_eq!(stored.current_streak(), 1);
    }
}
