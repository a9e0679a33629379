use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::account_service::AccountService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::notifier::{EmailNotifier, LogNotifier, Notifier};
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::streak_service::StreakService;
use crate::weekly_service::WeeklyService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    accounts: Arc<AccountService>,
    catalog: Arc<CatalogService>,
    progress: Arc<ProgressService>,
    streaks: Arc<StreakService>,
    quizzes: Arc<QuizService>,
    weekly: Arc<WeeklyService>,
}

impl AppServices {
    /// Wire services over existing storage.
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, notifier: Arc<dyn Notifier>) -> Self {
        let streaks = StreakService::new(Arc::clone(&storage.streaks));
        let progress = ProgressService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
            streaks.clone(),
            notifier,
        );

        Self {
            accounts: Arc::new(AccountService::new(
                clock,
                Arc::clone(&storage.users),
                Arc::clone(&storage.streaks),
            )),
            catalog: Arc::new(CatalogService::new(Arc::clone(&storage.lessons))),
            progress: Arc::new(progress),
            streaks: Arc::new(streaks),
            quizzes: Arc::new(QuizService::new(
                clock,
                Arc::clone(&storage.lessons),
                Arc::clone(&storage.quizzes),
            )),
            weekly: Arc::new(WeeklyService::new(
                clock,
                Arc::clone(&storage.users),
                Arc::clone(&storage.weekly),
            )),
        }
    }

    /// Build seeded services backed by in-memory storage, logging notifications.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the curriculum cannot be seeded.
    pub async fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        let services = Self::new(&Storage::in_memory(), clock, Arc::new(LogNotifier));
        services.catalog.ensure_seeded().await?;
        Ok(services)
    }

    /// Build services backed by `SQLite` storage and seed the curriculum on first run.
    ///
    /// Notes go out by email when `LESSONS_EMAIL_API_KEY` is set, otherwise
    /// they are logged.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or seeding fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;

        let email = EmailNotifier::from_env();
        let notifier: Arc<dyn Notifier> = if email.enabled() {
            info!("email notifications enabled");
            Arc::new(email)
        } else {
            Arc::new(LogNotifier)
        };

        let services = Self::new(&storage, clock, notifier);
        services.catalog.ensure_seeded().await?;
        Ok(services)
    }

    /// Override the bcrypt cost used for new passwords.
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.accounts = Arc::new(self.accounts.as_ref().clone().with_cost(cost));
        self
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn streaks(&self) -> Arc<StreakService> {
        Arc::clone(&self.streaks)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn weekly(&self) -> Arc<WeeklyService> {
        Arc::clone(&self.weekly)
    }
}
