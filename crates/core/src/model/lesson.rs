use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{DayNumber, WeekNumber};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson must have at least one task")]
    NoTasks,

    #[error("lesson task cannot be empty")]
    EmptyTask,

    #[error("duplicate task in lesson: {0}")]
    DuplicateTask(String),
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// One day of the curriculum: reading material plus a fixed list of tasks.
///
/// The task list is what progress is measured against; a day is only complete
/// once every task string has been checked off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(rename = "dayNumber")]
    day: DayNumber,
    #[serde(rename = "weekNumber")]
    week: WeekNumber,
    title: String,
    description: String,
    reading_links: Vec<String>,
    tasks: Vec<String>,
}

impl Lesson {
    /// Creates a lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank, the task list is empty,
    /// or a task is blank or repeated.
    pub fn new(
        day: DayNumber,
        week: WeekNumber,
        title: impl Into<String>,
        description: impl Into<String>,
        reading_links: Vec<String>,
        tasks: Vec<String>,
    ) -> Result<Self, LessonError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if tasks.is_empty() {
            return Err(LessonError::NoTasks);
        }

        let mut seen: Vec<&str> = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let trimmed = task.trim();
            if trimmed.is_empty() {
                return Err(LessonError::EmptyTask);
            }
            if seen.contains(&trimmed) {
                return Err(LessonError::DuplicateTask(trimmed.to_owned()));
            }
            seen.push(trimmed);
        }
        let tasks = tasks.iter().map(|t| t.trim().to_owned()).collect();

        Ok(Self {
            day,
            week,
            title,
            description: description.into().trim().to_owned(),
            reading_links,
            tasks,
        })
    }

    // Accessors
    #[must_use]
    pub fn day(&self) -> DayNumber {
        self.day
    }

    #[must_use]
    pub fn week(&self) -> WeekNumber {
        self.week
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn reading_links(&self) -> &[String] {
        &self.reading_links
    }

    #[must_use]
    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    #[must_use]
    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn has_task(&self, task: &str) -> bool {
        self.tasks.iter().any(|t| t == task)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> DayNumber {
        DayNumber::new(n).unwrap()
    }

    fn week(n: i64) -> WeekNumber {
        WeekNumber::new(n).unwrap()
    }

    #[test]
    fn lesson_new_trims_fields() {
        let lesson = Lesson::new(
            day(2),
            week(1),
            "  Understanding Blockchains ",
            " How blocks link ",
            vec![],
            vec![" t1".into(), "t2 ".into(), "t3".into()],
        )
        .unwrap();

        assert_eq!(lesson.title(), "Understanding Blockchains");
        assert_eq!(lesson.description(), "How blocks link");
        assert_eq!(lesson.tasks(), ["t1", "t2", "t3"]);
        assert_eq!(lesson.total_tasks(), 3);
        assert!(lesson.has_task("t2"));
        assert!(!lesson.has_task("t4"));
    }

    #[test]
    fn lesson_new_rejects_empty_title() {
        let err = Lesson::new(day(1), week(1), "  ", "", vec![], vec!["t".into()]).unwrap_err();
        assert_eq!(err, LessonError::EmptyTitle);
    }

    #[test]
    fn lesson_new_rejects_missing_or_bad_tasks() {
        let err = Lesson::new(day(1), week(1), "Intro", "", vec![], vec![]).unwrap_err();
        assert_eq!(err, LessonError::NoTasks);

        let err =
            Lesson::new(day(1), week(1), "Intro", "", vec![], vec!["   ".into()]).unwrap_err();
        assert_eq!(err, LessonError::EmptyTask);

        let err = Lesson::new(
            day(1),
            week(1),
            "Intro",
            "",
            vec![],
            vec!["same".into(), " same".into()],
        )
        .unwrap_err();
        assert_eq!(err, LessonError::DuplicateTask("same".into()));
    }
}
