use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Number of lesson days in the curriculum.
pub const CURRICULUM_DAYS: u8 = 30;

/// Number of curriculum weeks (the last week is partial).
pub const CURRICULUM_WEEKS: u8 = 5;

/// Errors raised when building identifiers from raw values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("day number must be between 1 and {max}, got {value}")]
    DayOutOfRange { value: i64, max: u8 },

    #[error("week number must be between 1 and {max}, got {value}")]
    WeekOutOfRange { value: i64, max: u8 },

    #[error("failed to parse {kind} from string")]
    Parse { kind: &'static str },
}

/// Unique identifier for a user account
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

/// Lesson day within the curriculum, always in `1..=CURRICULUM_DAYS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DayNumber(u8);

impl DayNumber {
    pub const FIRST: DayNumber = DayNumber(1);
    pub const LAST: DayNumber = DayNumber(CURRICULUM_DAYS);

    /// Creates a `DayNumber`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::DayOutOfRange` when the value is outside the curriculum.
    pub fn new(value: i64) -> Result<Self, IdError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (1..=CURRICULUM_DAYS).contains(v))
            .map(Self)
            .ok_or(IdError::DayOutOfRange {
                value,
                max: CURRICULUM_DAYS,
            })
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// All days of the curriculum in order.
    pub fn all() -> impl Iterator<Item = DayNumber> {
        (1..=CURRICULUM_DAYS).map(DayNumber)
    }
}

/// Curriculum week, always in `1..=CURRICULUM_WEEKS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct WeekNumber(u8);

impl WeekNumber {
    /// Creates a `WeekNumber`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::WeekOutOfRange` when the value is outside the curriculum.
    pub fn new(value: i64) -> Result<Self, IdError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (1..=CURRICULUM_WEEKS).contains(v))
            .map(Self)
            .ok_or(IdError::WeekOutOfRange {
                value,
                max: CURRICULUM_WEEKS,
            })
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for DayNumber {
    type Error = IdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for WeekNumber {
    type Error = IdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayNumber> for u8 {
    fn from(day: DayNumber) -> Self {
        day.0
    }
}

impl From<WeekNumber> for u8 {
    fn from(week: WeekNumber) -> Self {
        week.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for DayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayNumber({})", self.0)
    }
}

impl fmt::Debug for WeekNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeekNumber({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WeekNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(UserId::new)
            .map_err(|_| IdError::Parse { kind: "UserId" })
    }
}

impl FromStr for DayNumber {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<i64>()
            .map_err(|_| IdError::Parse { kind: "DayNumber" })?;
        DayNumber::new(raw)
    }
}

impl FromStr for WeekNumber {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<i64>()
            .map_err(|_| IdError::Parse { kind: "WeekNumber" })?;
        WeekNumber::new(raw)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
