use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{DayNumber, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreakError {
    #[error("longest streak ({longest}) is shorter than current streak ({current})")]
    LongestBelowCurrent { current: u32, longest: u32 },

    #[error("active streak without a last active date")]
    MissingLastActiveDate,

    #[error("zero streak with a last active date ({last_active_date})")]
    ZeroWithLastActiveDate { last_active_date: NaiveDate },
}

/// How `Streak::advance` classified the gap since the last active date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Another completion on the same calendar day.
    SameDay,
    /// First completion on the day after the last active date.
    Extended,
    /// No prior activity, or a gap of two days or more.
    Restarted,
}

/// Consecutive-day activity counter for one user.
///
/// Only completion events move it, and only through `advance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    user_id: UserId,
    current_streak: u32,
    longest_streak: u32,
    last_active_date: Option<NaiveDate>,
    last_completed_day: Option<DayNumber>,
}

impl Streak {
    /// The zeroed record every account starts with.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            last_completed_day: None,
        }
    }

    /// Rehydrate a streak from storage.
    ///
    /// # Errors
    ///
    /// Returns `StreakError` if the stored counters are inconsistent.
    pub fn from_persisted(
        user_id: UserId,
        current_streak: u32,
        longest_streak: u32,
        last_active_date: Option<NaiveDate>,
        last_completed_day: Option<DayNumber>,
    ) -> Result<Self, StreakError> {
        if longest_streak < current_streak {
            return Err(StreakError::LongestBelowCurrent {
                current: current_streak,
                longest: longest_streak,
            });
        }
        match (current_streak, last_active_date) {
            (1.., None) => return Err(StreakError::MissingLastActiveDate),
            (0, Some(last_active_date)) => {
                return Err(StreakError::ZeroWithLastActiveDate { last_active_date });
            }
            _ => {}
        }
        Ok(Self {
            user_id,
            current_streak,
            longest_streak,
            last_active_date,
            last_completed_day,
        })
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    #[must_use]
    pub fn last_active_date(&self) -> Option<NaiveDate> {
        self.last_active_date
    }

    #[must_use]
    pub fn last_completed_day(&self) -> Option<DayNumber> {
        self.last_completed_day
    }

    /// Classify `today` against the last active date.
    ///
    /// Checked in order: same day, the following day, anything else.
    #[must_use]
    pub fn transition_for(&self, today: NaiveDate) -> StreakTransition {
        match self.last_active_date {
            Some(last) if last == today => StreakTransition::SameDay,
            Some(last) if last.checked_add_days(Days::new(1)) == Some(today) => {
                StreakTransition::Extended
            }
            _ => StreakTransition::Restarted,
        }
    }

    /// Apply one day-completion event that happened on `today`.
    ///
    /// Same-day repeats leave the counter alone, the next calendar day extends
    /// it, and anything else (including a date earlier than the last one)
    /// restarts it at 1.
    pub fn advance(&mut self, today: NaiveDate, day: DayNumber) -> StreakTransition {
        let transition = self.transition_for(today);
        self.current_streak = match transition {
            StreakTransition::SameDay => self.current_streak,
            StreakTransition::Extended => self.current_streak.saturating_add(1),
            StreakTransition::Restarted => 1,
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_active_date = Some(today);
        self.last_completed_day = Some(day);
        transition
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
