use std::sync::Arc;

use lessons_core::model::{DayNumber, Lesson, WeekNumber};
use storage::curriculum;
use storage::repository::LessonRepository;
use tracing::{debug, info};

use crate::error::TrackerError;

/// Resolve a raw day number. Days outside the curriculum have no lesson.
///
/// # Errors
///
/// Returns `TrackerError::NotFound` when `raw` is outside `1..=30`.
pub fn lesson_day(raw: i64) -> Result<DayNumber, TrackerError> {
    DayNumber::new(raw).map_err(|_| TrackerError::not_found(format!("lesson for day {raw}")))
}

/// Resolve a raw week number.
///
/// # Errors
///
/// Returns `TrackerError::Validation` when `raw` is outside `1..=5`.
pub fn curriculum_week(raw: i64) -> Result<WeekNumber, TrackerError> {
    Ok(WeekNumber::new(raw)?)
}

/// Read access to the curriculum, plus first-run seeding.
#[derive(Clone)]
pub struct CatalogService {
    lessons: Arc<dyn LessonRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonRepository>) -> Self {
        Self { lessons }
    }

    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` if the day has no lesson, or
    /// `TrackerError::Storage` if repository access fails.
    pub async fn get_lesson(&self, day: DayNumber) -> Result<Lesson, TrackerError> {
        self.lessons
            .get_lesson(day)
            .await?
            .ok_or_else(|| TrackerError::not_found(format!("lesson for day {day}")))
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if repository access fails.
    pub async fn lessons_for_week(&self, week: WeekNumber) -> Result<Vec<Lesson>, TrackerError> {
        Ok(self.lessons.lessons_for_week(week).await?)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if repository access fails.
    pub async fn all_lessons(&self) -> Result<Vec<Lesson>, TrackerError> {
        Ok(self.lessons.all_lessons().await?)
    }

    /// Load the built-in curriculum when no lessons are stored yet.
    ///
    /// Returns the number of lessons written (0 when already seeded).
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the curriculum cannot be read or stored.
    pub async fn ensure_seeded(&self) -> Result<usize, TrackerError> {
        let existing = self.lessons.count_lessons().await?;
        if existing > 0 {
            debug!(existing, "curriculum already seeded");
            return Ok(0);
        }

        let lessons = curriculum::lessons()?;
        for lesson in &lessons {
            self.lessons.upsert_lesson(lesson).await?;
        }
        info!(count = lessons.len(), "seeded curriculum");
        Ok(lessons.len())
    }
}
