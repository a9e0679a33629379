use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{DayNumber, UserId};
use crate::model::lesson::Lesson;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("task is not part of day {day}: {task}")]
    UnknownTask { day: DayNumber, task: String },

    #[error("progress is for day {progress} but lesson is day {lesson}")]
    LessonMismatch {
        progress: DayNumber,
        lesson: DayNumber,
    },

    #[error("day {0} is already completed; every task must stay checked")]
    CompletedDayLocked(DayNumber),

    #[error("invalid persisted progress: {0}")]
    InvalidPersistedState(String),
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Outcome of re-evaluating the completion rule after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    /// The `completed` flag did not change (either still pending or already done).
    Unchanged,
    /// The day went from incomplete to complete during this write.
    JustCompleted,
}

impl CompletionChange {
    #[must_use]
    pub fn is_just_completed(self) -> bool {
        matches!(self, CompletionChange::JustCompleted)
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// A user's working state for one curriculum day.
///
/// `completed` is derived: it flips to `true` once every lesson task is checked
/// and a quiz score exists, and never flips back. All mutators take the lesson
/// so the task total always comes from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    user_id: UserId,
    #[serde(rename = "dayNumber")]
    day: DayNumber,
    completed_tasks: Vec<String>,
    notes: Option<String>,
    quiz_score: Option<u32>,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// Empty progress for a day the user has not touched yet.
    #[must_use]
    pub fn new(user_id: UserId, day: DayNumber) -> Self {
        Self {
            user_id,
            day,
            completed_tasks: Vec::new(),
            notes: None,
            quiz_score: None,
            completed: false,
            completed_at: None,
        }
    }

    /// Rehydrate progress from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPersistedState` if a completed record lacks
    /// a quiz score or completion timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        day: DayNumber,
        completed_tasks: Vec<String>,
        notes: Option<String>,
        quiz_score: Option<u32>,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if completed && quiz_score.is_none() {
            return Err(ProgressError::InvalidPersistedState(
                "completed without quiz score".into(),
            ));
        }
        if completed && completed_at.is_none() {
            return Err(ProgressError::InvalidPersistedState(
                "completed without completed_at".into(),
            ));
        }

        Ok(Self {
            user_id,
            day,
            completed_tasks,
            notes,
            quiz_score,
            completed,
            completed_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn day(&self) -> DayNumber {
        self.day
    }

    #[must_use]
    pub fn completed_tasks(&self) -> &[String] {
        &self.completed_tasks
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub fn quiz_score(&self) -> Option<u32> {
        self.quiz_score
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// UTC calendar date of completion, used by the streak transition.
    #[must_use]
    pub fn completion_date(&self) -> Option<NaiveDate> {
        self.completed_at.map(|at| at.date_naive())
    }

    /// Replace the checked-off tasks with `tasks` and re-evaluate completion.
    ///
    /// Tasks are matched against the lesson after trimming; duplicates collapse
    /// and the stored list follows the lesson's order.
    ///
    /// # Errors
    ///
    /// - `ProgressError::LessonMismatch` if `lesson` is for another day.
    /// - `ProgressError::UnknownTask` if a task is not in the lesson.
    /// - `ProgressError::CompletedDayLocked` if the day is complete and the new
    ///   set would uncheck a task.
    pub fn replace_completed_tasks<S: AsRef<str>>(
        &mut self,
        lesson: &Lesson,
        tasks: &[S],
        now: DateTime<Utc>,
    ) -> Result<CompletionChange, ProgressError> {
        self.ensure_lesson(lesson)?;

        for task in tasks {
            let task = task.as_ref().trim();
            if !lesson.has_task(task) {
                return Err(ProgressError::UnknownTask {
                    day: self.day,
                    task: task.to_owned(),
                });
            }
        }

        let normalized: Vec<String> = lesson
            .tasks()
            .iter()
            .filter(|known| tasks.iter().any(|t| t.as_ref().trim() == known.as_str()))
            .cloned()
            .collect();

        if self.completed && normalized.len() != lesson.total_tasks() {
            return Err(ProgressError::CompletedDayLocked(self.day));
        }

        self.completed_tasks = normalized;
        Ok(self.recompute_completion(lesson, now))
    }

    /// Record the score of the latest quiz attempt and re-evaluate completion.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::LessonMismatch` if `lesson` is for another day.
    pub fn record_quiz_score(
        &mut self,
        lesson: &Lesson,
        score: u32,
        now: DateTime<Utc>,
    ) -> Result<CompletionChange, ProgressError> {
        self.ensure_lesson(lesson)?;
        self.quiz_score = Some(score);
        Ok(self.recompute_completion(lesson, now))
    }

    /// Replace the notes; blank text clears them. Completion is untouched.
    pub fn replace_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.notes = Some(notes).filter(|n| !n.trim().is_empty());
    }

    /// True when every lesson task is checked and a quiz score exists.
    #[must_use]
    pub fn satisfies_completion(&self, lesson: &Lesson) -> bool {
        self.completed_tasks.len() == lesson.total_tasks() && self.quiz_score.is_some()
    }

    fn recompute_completion(&mut self, lesson: &Lesson, now: DateTime<Utc>) -> CompletionChange {
        if self.completed || !self.satisfies_completion(lesson) {
            return CompletionChange::Unchanged;
        }
        self.completed = true;
        self.completed_at = Some(now);
        CompletionChange::JustCompleted
    }

    fn ensure_lesson(&self, lesson: &Lesson) -> Result<(), ProgressError> {
        if lesson.day() == self.day {
            Ok(())
        } else {
            Err(ProgressError::LessonMismatch {
                progress: self.day,
                lesson: lesson.day(),
            })
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::WeekNumber;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn lesson(day: i64) -> Lesson {
        Lesson::new(
            DayNumber::new(day).unwrap(),
            WeekNumber::new(1).unwrap(),
            format!("Day {day}"),
            "",
            vec![],
            vec!["t1".into(), "t2".into(), "t3".into()],
        )
        .unwrap()
    }

    fn progress(day: i64) -> LessonProgress {
        LessonProgress::new(UserId::random(), DayNumber::new(day).unwrap())
    }

    #[test]
    fn partial_tasks_do_not_complete_even_with_quiz() {
        let lesson = lesson(2);
        let mut p = progress(2);
        p.record_quiz_score(&lesson, 4, fixed_now()).unwrap();

        let change = p
            .replace_completed_tasks(&lesson, &["t1", "t2"], fixed_now())
            .unwrap();

        assert_eq!(change, CompletionChange::Unchanged);
        assert!(!p.is_completed());
        assert_eq!(p.completed_at(), None);
    }

    #[test]
    fn all_tasks_plus_quiz_completes_once() {
        let lesson = lesson(2);
        let mut p = progress(2);
        let now = fixed_now();
        p.record_quiz_score(&lesson, 4, now).unwrap();
        p.replace_completed_tasks(&lesson, &["t1", "t2"], now).unwrap();

        let later = now + Duration::minutes(5);
        let change = p
            .replace_completed_tasks(&lesson, &["t1", "t2", "t3"], later)
            .unwrap();
        assert_eq!(change, CompletionChange::JustCompleted);
        assert!(p.is_completed());
        assert_eq!(p.completed_at(), Some(later));

        let again = p
            .replace_completed_tasks(&lesson, &["t1", "t2", "t3"], later + Duration::hours(1))
            .unwrap();
        assert_eq!(again, CompletionChange::Unchanged);
        assert_eq!(p.completed_at(), Some(later));
    }

    #[test]
    fn all_tasks_without_quiz_stays_pending() {
        let lesson = lesson(1);
        let mut p = progress(1);
        let change = p
            .replace_completed_tasks(&lesson, &["t1", "t2", "t3"], fixed_now())
            .unwrap();
        assert_eq!(change, CompletionChange::Unchanged);
        assert!(!p.is_completed());
    }

    #[test]
    fn quiz_after_tasks_completes() {
        let lesson = lesson(1);
        let mut p = progress(1);
        p.replace_completed_tasks(&lesson, &["t3", "t1", "t2"], fixed_now())
            .unwrap();
        let change = p.record_quiz_score(&lesson, 0, fixed_now()).unwrap();
        assert!(change.is_just_completed());
        assert_eq!(p.quiz_score(), Some(0));

        // a retake keeps the day complete and updates the score
        let change = p.record_quiz_score(&lesson, 9, fixed_now()).unwrap();
        assert_eq!(change, CompletionChange::Unchanged);
        assert_eq!(p.quiz_score(), Some(9));
        assert!(p.is_completed());
    }

    #[test]
    fn tasks_follow_lesson_order_and_dedupe() {
        let lesson = lesson(1);
        let mut p = progress(1);
        p.replace_completed_tasks(&lesson, &["t3", " t1 ", "t3"], fixed_now())
            .unwrap();
        assert_eq!(p.completed_tasks(), ["t1", "t3"]);
    }

    #[test]
    fn unknown_task_is_rejected_without_mutation() {
        let lesson = lesson(1);
        let mut p = progress(1);
        p.replace_completed_tasks(&lesson, &["t1"], fixed_now()).unwrap();

        let err = p
            .replace_completed_tasks(&lesson, &["t1", "bogus"], fixed_now())
            .unwrap_err();
        assert!(matches!(err, ProgressError::UnknownTask { ref task, .. } if task == "bogus"));
        assert_eq!(p.completed_tasks(), ["t1"]);
    }

    #[test]
    fn completed_day_cannot_uncheck_tasks() {
        let lesson = lesson(1);
        let mut p = progress(1);
        p.record_quiz_score(&lesson, 3, fixed_now()).unwrap();
        p.replace_completed_tasks(&lesson, &["t1", "t2", "t3"], fixed_now())
            .unwrap();

        let err = p
            .replace_completed_tasks(&lesson, &["t1"], fixed_now())
            .unwrap_err();
        assert_eq!(err, ProgressError::CompletedDayLocked(lesson.day()));
        assert!(p.is_completed());
        assert_eq!(p.completed_tasks().len(), 3);
    }

    #[test]
    fn mismatched_lesson_is_rejected() {
        let mut p = progress(1);
        let err = p.record_quiz_score(&lesson(2), 1, fixed_now()).unwrap_err();
        assert!(matches!(err, ProgressError::LessonMismatch { .. }));
        assert_eq!(p.quiz_score(), None);
    }

    #[test]
    fn notes_do_not_affect_completion() {
        let lesson = lesson(1);
        let mut p = progress(1);
        p.replace_completed_tasks(&lesson, &["t1", "t2", "t3"], fixed_now())
            .unwrap();
        p.replace_notes("blocks are chained by hashes");
        assert_eq!(p.notes(), Some("blocks are chained by hashes"));
        assert!(!p.is_completed());

        p.replace_notes("   ");
        assert_eq!(p.notes(), None);
    }

    #[test]
    fn from_persisted_rejects_completed_without_score() {
        let err = LessonProgress::from_persisted(
            UserId::random(),
            DayNumber::FIRST,
            vec![],
            None,
            None,
            true,
            Some(fixed_now()),
        )
        .unwrap_err();
        assert!(matches!(err, ProgressError::InvalidPersistedState(_)));
    }

    #[test]
    fn completion_date_uses_utc_calendar_day() {
        let lesson = lesson(1);
        let mut p = progress(1);
        p.replace_completed_tasks(&lesson, &["t1", "t2", "t3"], fixed_now())
            .unwrap();
        p.record_quiz_score(&lesson, 5, fixed_now()).unwrap();
        // fixed_now() is 2023-11-14T22:13:20Z
        assert_eq!(
            p.completion_date(),
            NaiveDate::from_ymd_opt(2023, 11, 14)
        );
    }
}
