#![forbid(unsafe_code)]

pub mod account_service;
pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod notifier;
pub mod progress_service;
pub mod quiz_service;
pub mod streak_service;
pub mod weekly_service;

pub use lessons_core::Clock;

pub use account_service::AccountService;
pub use app_services::AppServices;
pub use catalog_service::{CatalogService, curriculum_week, lesson_day};
pub use error::{AppServicesError, NotifyError, TrackerError};
pub use notifier::{EmailConfig, EmailNotifier, LogNotifier, NotesNotification, Notifier};
pub use progress_service::{NOTIFY_TIMEOUT, ProgressService, ProgressUpdate};
pub use quiz_service::{QUESTIONS_PER_QUIZ, QuizService, generate_questions};
pub use streak_service::StreakService;
pub use weekly_service::WeeklyService;
