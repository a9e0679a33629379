//! The built-in 30-day curriculum, embedded at compile time.

use lessons_core::model::{DayNumber, Lesson, WeekNumber};
use serde::Deserialize;

use crate::repository::StorageError;

const CURRICULUM_JSON: &str = include_str!("../data/curriculum.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonSeed {
    day_number: i64,
    week_number: i64,
    title: String,
    description: String,
    reading_links: Vec<String>,
    tasks: Vec<String>,
}

/// Parse and validate the embedded curriculum, ordered by day.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the embedded data is malformed.
pub fn lessons() -> Result<Vec<Lesson>, StorageError> {
    let seeds: Vec<LessonSeed> = serde_json::from_str(CURRICULUM_JSON)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let mut lessons = seeds
        .into_iter()
        .map(|seed| {
            let day = DayNumber::new(seed.day_number)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let week = WeekNumber::new(seed.week_number)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            Lesson::new(
                day,
                week,
                seed.title,
                seed.description,
                seed.reading_links,
                seed.tasks,
            )
            .map_err(|e| StorageError::Serialization(format!("day {day}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    lessons.sort_by_key(Lesson::day);
    Ok(lessons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessons_core::model::CURRICULUM_DAYS;

    #[test]
    fn embedded_curriculum_covers_every_day_once() {
        let lessons = lessons().unwrap();
        assert_eq!(lessons.len(), usize::from(CURRICULUM_DAYS));
        for (lesson, expected) in lessons.iter().zip(DayNumber::all()) {
            assert_eq!(lesson.day(), expected);
            assert_eq!(lesson.total_tasks(), 3);
        }
    }

    #[test]
    fn weeks_follow_curriculum_layout() {
        let lessons = lessons().unwrap();
        let week_of = |day: usize| lessons[day - 1].week().value();
        assert_eq!(week_of(1), 1);
        assert_eq!(week_of(7), 1);
        assert_eq!(week_of(8), 2);
        assert_eq!(week_of(14), 3);
        assert_eq!(week_of(21), 4);
        assert_eq!(week_of(28), 5);
        assert_eq!(week_of(30), 5);
        assert_eq!(lessons[0].title(), "Introduction to DeFi");
    }
}
