//! Hand-written question banks for the opening curriculum days, embedded at
//! compile time. Days without a bank get template questions instead.

use lessons_core::model::{DayNumber, Difficulty, QuestionKind};
use serde::Deserialize;

use crate::repository::StorageError;

const QUIZ_BANKS_JSON: &str = include_str!("../data/quiz_banks.json");

/// Questions per difficulty tier in a bank.
pub const BANK_TIER_SIZE: usize = 5;

/// One hand-written question.
///
/// `answer` is set for mcq and true/false questions; short and scenario
/// questions are open-ended and carry only an explanation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BankedQuestion {
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub answer: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankSeed {
    day_number: i64,
    questions: Vec<BankedQuestion>,
}

/// Bank for `day`, ordered easy, medium, hard; `None` when the day has none.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the embedded data is malformed.
pub fn for_day(day: DayNumber) -> Result<Option<Vec<BankedQuestion>>, StorageError> {
    for seed in seeds()? {
        let seed_day = DayNumber::new(seed.day_number)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if seed_day == day {
            validate(seed_day, &seed.questions)?;
            return Ok(Some(seed.questions));
        }
    }
    Ok(None)
}

/// Days that have a hand-written bank, ascending.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the embedded data is malformed.
pub fn banked_days() -> Result<Vec<DayNumber>, StorageError> {
    let mut days = seeds()?
        .iter()
        .map(|seed| {
            DayNumber::new(seed.day_number).map_err(|e| StorageError::Serialization(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    days.sort();
    Ok(days)
}

fn seeds() -> Result<Vec<BankSeed>, StorageError> {
    serde_json::from_str(QUIZ_BANKS_JSON).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn validate(day: DayNumber, questions: &[BankedQuestion]) -> Result<(), StorageError> {
    let bad = |index: usize, reason: &str| {
        StorageError::Serialization(format!("quiz bank day {day}, question {}: {reason}", index + 1))
    };

    if questions.len() != BANK_TIER_SIZE * Difficulty::ALL.len() {
        return Err(StorageError::Serialization(format!(
            "quiz bank day {day} has {} questions",
            questions.len()
        )));
    }

    for (index, q) in questions.iter().enumerate() {
        if q.difficulty != Difficulty::ALL[index / BANK_TIER_SIZE] {
            return Err(bad(index, "out of difficulty order"));
        }
        if q.question.trim().is_empty() || q.explanation.trim().is_empty() {
            return Err(bad(index, "blank text"));
        }
        match (q.kind, &q.options, &q.answer) {
            (QuestionKind::Mcq, Some(options), Some(answer)) if options.contains(answer) => {}
            (QuestionKind::Mcq, ..) => return Err(bad(index, "mcq answer must be an option")),
            (QuestionKind::TrueFalse, None, Some(answer)) if answer == "True" || answer == "False" => {}
            (QuestionKind::TrueFalse, ..) => {
                return Err(bad(index, "true/false needs a True or False answer"));
            }
            (QuestionKind::Short | QuestionKind::Scenario, None, None) => {}
            (QuestionKind::Short | QuestionKind::Scenario, ..) => {
                return Err(bad(index, "open question with options or answer"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> DayNumber {
        DayNumber::new(n).unwrap()
    }

    #[test]
    fn opening_week_is_banked() {
        let days = banked_days().unwrap();
        assert_eq!(days, (1..=7).map(day).collect::<Vec<_>>());
        for d in days {
            assert!(for_day(d).unwrap().is_some(), "day {d}");
        }
    }

    #[test]
    fn later_days_have_no_bank() {
        assert!(for_day(day(8)).unwrap().is_none());
        assert!(for_day(day(30)).unwrap().is_none());
    }

    #[test]
    fn day_one_bank_has_specific_questions() {
        let bank = for_day(day(1)).unwrap().unwrap();
        assert_eq!(bank[0].question, "What does DeFi stand for?");
        assert_eq!(bank[0].answer.as_deref(), Some("Decentralized Finance"));
        assert_eq!(bank[2].answer.as_deref(), Some("Ethereum"));
        assert_eq!(bank[1].kind, QuestionKind::TrueFalse);
        assert_eq!(bank[1].answer.as_deref(), Some("False"));
        assert_eq!(bank[14].difficulty, Difficulty::Hard);
    }
}
