use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{UserId, WeekNumber};

/// Question count of a full weekly quiz when the caller does not say otherwise.
pub const DEFAULT_WEEKLY_QUESTIONS: u32 = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WeeklyError {
    #[error("score {score} exceeds total questions {total}")]
    ScoreAboveTotal { score: u32, total: u32 },

    #[error("weekly quiz must have at least one question")]
    NoQuestions,
}

//
// ─── WEEKLY REVIEW ─────────────────────────────────────────────────────────────
//

/// End-of-week reflection. Submitting one marks the week reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReview {
    user_id: UserId,
    #[serde(rename = "weekNumber")]
    week: WeekNumber,
    review_notes: Option<String>,
    quiz_score: Option<u32>,
    completed: bool,
    completed_at: DateTime<Utc>,
}

impl WeeklyReview {
    /// A freshly submitted review, completed at `now`.
    #[must_use]
    pub fn submit(
        user_id: UserId,
        week: WeekNumber,
        notes: Option<String>,
        quiz_score: Option<u32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            week,
            review_notes: notes.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()),
            quiz_score,
            completed: true,
            completed_at: now,
        }
    }

    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        week: WeekNumber,
        review_notes: Option<String>,
        quiz_score: Option<u32>,
        completed: bool,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            week,
            review_notes,
            quiz_score,
            completed,
            completed_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn week(&self) -> WeekNumber {
        self.week
    }

    #[must_use]
    pub fn review_notes(&self) -> Option<&str> {
        self.review_notes.as_deref()
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
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── WEEKLY QUIZ RESULT ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyQuizResult {
    user_id: UserId,
    #[serde(rename = "weekNumber")]
    week: WeekNumber,
    score: u32,
    total_questions: u32,
    missed_questions: Vec<String>,
    submitted_at: DateTime<Utc>,
}

impl WeeklyQuizResult {
    /// Creates a result.
    ///
    /// # Errors
    ///
    /// Returns `WeeklyError` if `total_questions` is zero or below `score`.
    pub fn new(
        user_id: UserId,
        week: WeekNumber,
        score: u32,
        total_questions: u32,
        missed_questions: Vec<String>,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, WeeklyError> {
        if total_questions == 0 {
            return Err(WeeklyError::NoQuestions);
        }
        if score > total_questions {
            return Err(WeeklyError::ScoreAboveTotal {
                score,
                total: total_questions,
            });
        }
        Ok(Self {
            user_id,
            week,
            score,
            total_questions,
            missed_questions,
            submitted_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn week(&self) -> WeekNumber {
        self.week
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn missed_questions(&self) -> &[String] {
        &self.missed_questions
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn review_submit_marks_completed_and_trims_notes() {
        let review = WeeklyReview::submit(
            UserId::random(),
            WeekNumber::new(2).unwrap(),
            Some("  liquidity pools clicked  ".into()),
            Some(31),
            fixed_now(),
        );
        assert!(review.is_completed());
        assert_eq!(review.review_notes(), Some("liquidity pools clicked"));
        assert_eq!(review.completed_at(), fixed_now());
    }

    #[test]
    fn quiz_result_rejects_score_above_total() {
        let err = WeeklyQuizResult::new(
            UserId::random(),
            WeekNumber::new(1).unwrap(),
            41,
            DEFAULT_WEEKLY_QUESTIONS,
            vec![],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            WeeklyError::ScoreAboveTotal {
                score: 41,
                total: 40
            }
        );
    }
}
