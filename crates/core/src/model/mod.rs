mod ids;
mod lesson;
mod progress;
mod quiz;
mod streak;
mod user;
mod weekly;

pub use ids::{CURRICULUM_DAYS, CURRICULUM_WEEKS, DayNumber, IdError, UserId, WeekNumber};

pub use lesson::{Lesson, LessonError};
pub use progress::{CompletionChange, LessonProgress, ProgressError};
pub use quiz::{DailyQuiz, Difficulty, QuestionKind, QuizError, QuizQuestion};
pub use streak::{Streak, StreakError, StreakTransition};
pub use user::{
    PASSWORD_MIN_CHARS, SignupDraft, USERNAME_MAX_CHARS, USERNAME_MIN_CHARS, User, UserError,
    normalize_email,
};
pub use weekly::{DEFAULT_WEEKLY_QUESTIONS, WeeklyError, WeeklyQuizResult, WeeklyReview};
