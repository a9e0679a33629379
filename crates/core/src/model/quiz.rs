use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{DayNumber, WeekNumber};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz must contain at least one question")]
    Empty,

    #[error("question {id} has an answer that is not among its options")]
    AnswerNotInOptions { id: String },

    #[error("question {id} has empty text")]
    EmptyQuestion { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    TrueFalse,
    Short,
    Scenario,
}

impl QuestionKind {
    /// Rotation used when laying out a difficulty tier.
    pub const ROTATION: [QuestionKind; 4] = [
        QuestionKind::Mcq,
        QuestionKind::TrueFalse,
        QuestionKind::Short,
        QuestionKind::Scenario,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    fn validate(&self) -> Result<(), QuizError> {
        if self.question.trim().is_empty() {
            return Err(QuizError::EmptyQuestion {
                id: self.id.clone(),
            });
        }
        if let Some(options) = &self.options {
            if !options.contains(&self.correct_answer) {
                return Err(QuizError::AnswerNotInOptions {
                    id: self.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The generated question set for one lesson day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuiz {
    #[serde(rename = "dayNumber")]
    day: DayNumber,
    #[serde(rename = "weekNumber")]
    week: WeekNumber,
    questions: Vec<QuizQuestion>,
    created_at: DateTime<Utc>,
}

impl DailyQuiz {
    /// Creates a quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if there are no questions, a question is blank, or
    /// an answer is missing from its option list.
    pub fn new(
        day: DayNumber,
        week: WeekNumber,
        questions: Vec<QuizQuestion>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        for question in &questions {
            question.validate()?;
        }
        Ok(Self {
            day,
            week,
            questions,
            created_at,
        })
    }

    #[must_use]
    pub fn day(&self) -> DayNumber {
        self.day
    }

    #[must_use]
    pub fn week(&self) -> WeekNumber {
        self.week
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn question(options: Option<Vec<String>>, answer: &str) -> QuizQuestion {
        QuizQuestion {
            id: "q1".into(),
            kind: QuestionKind::Mcq,
            difficulty: Difficulty::Easy,
            question: "What is DeFi?".into(),
            options,
            correct_answer: answer.into(),
            explanation: "See the reading.".into(),
        }
    }

    #[test]
    fn quiz_requires_questions() {
        let err = DailyQuiz::new(
            DayNumber::FIRST,
            WeekNumber::new(1).unwrap(),
            vec![],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuizError::Empty);
    }

    #[test]
    fn quiz_rejects_answer_outside_options() {
        let q = question(Some(vec!["a".into(), "b".into()]), "c");
        let err = DailyQuiz::new(
            DayNumber::FIRST,
            WeekNumber::new(1).unwrap(),
            vec![q],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuizError::AnswerNotInOptions { id: "q1".into() });
    }

    #[test]
    fn question_serializes_with_wire_names() {
        let q = question(None, "free text");
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"type\":\"mcq\""));
        assert!(json.contains("\"difficulty\":\"easy\""));
        assert!(json.contains("\"correctAnswer\":\"free text\""));
        assert!(!json.contains("options"));

        let back: QuizQuestion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
