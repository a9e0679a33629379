use thiserror::Error;

use crate::model::{
    IdError, LessonError, ProgressError, QuizError, StreakError, UserError, WeeklyError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Streak(#[from] StreakError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Weekly(#[from] WeeklyError),
}
