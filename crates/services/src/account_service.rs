use std::sync::Arc;

use lessons_core::model::{SignupDraft, Streak, User, UserId, normalize_email};
use storage::repository::{StorageError, StreakRepository, UserRepository};
use tracing::info;

use crate::Clock;
use crate::error::TrackerError;

/// Signup, login and user lookup. Passwords are stored as bcrypt hashes.
#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    streaks: Arc<dyn StreakRepository>,
    hash_cost: u32,
}

impl AccountService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        streaks: Arc<dyn StreakRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            streaks,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost factor.
    #[must_use]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Register a new user and give them a zeroed streak.
    ///
    /// # Errors
    ///
    /// - `TrackerError::Validation` for a bad username, email, or password.
    /// - `TrackerError::Conflict` if the email or username is taken.
    /// - `TrackerError::Storage` if persistence fails.
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, TrackerError> {
        let draft = SignupDraft::new(username, email, password)?;

        if self.users.find_by_email(draft.email()).await?.is_some() {
            return Err(TrackerError::Conflict("email already registered".into()));
        }
        if self.users.find_by_username(draft.username()).await?.is_some() {
            return Err(TrackerError::Conflict("username already taken".into()));
        }

        let hash = bcrypt::hash(draft.password(), self.hash_cost)
            .map_err(|err| TrackerError::Validation(err.to_string()))?;
        let user = User::new(UserId::random(), &draft, hash, self.clock.now())?;

        match self.users.insert_user(&user).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => {
                return Err(TrackerError::Conflict(
                    "email or username already registered".into(),
                ));
            }
            Err(err) => return Err(err.into()),
        }
        self.streaks.create_streak(&Streak::empty(user.id())).await?;

        info!(user = %user.id(), username = user.username(), "user signed up");
        Ok(user)
    }

    /// Check credentials. Email matching ignores case and surrounding spaces.
    ///
    /// # Errors
    ///
    /// - `TrackerError::Unauthorized` for an unknown email or wrong password.
    /// - `TrackerError::Storage` if repository access fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, TrackerError> {
        let Ok(email) = normalize_email(email) else {
            return Err(TrackerError::Unauthorized);
        };
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(TrackerError::Unauthorized)?;

        if !bcrypt::verify(password, user.password_hash()).unwrap_or(false) {
            return Err(TrackerError::Unauthorized);
        }
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::NotFound` for an unknown id.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, TrackerError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| TrackerError::not_found(format!("user {user_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessons_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> (AccountService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = AccountService::new(fixed_clock(), repo.clone(), repo.clone()).with_cost(4);
        (service, repo)
    }

    #[tokio::test]
    async fn signup_creates_user_and_zeroed_streak() {
        let (service, repo) = service();
        let user = service
            .signup("alice", "Alice@Example.com", "password123")
            .await
            .unwrap();

        assert_eq!(user.email(), "alice@example.com");
        assert_ne!(user.password_hash(), "password123");
        let streak = repo.get_streak(user.id()).await.unwrap().expect("streak");
        assert_eq!(streak, Streak::empty(user.id()));
    }

    #[tokio::test]
    async fn duplicate_email_or_username_conflicts() {
        let (service, _) = service();
        service
            .signup("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        let err = service
            .signup("alice2", "ALICE@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));

        let err = service
            .signup("alice", "other@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_signup_is_validation() {
        let (service, _) = service();
        let err = service
            .signup("al", "alice@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));

        let err = service
            .signup("alice", "alice@example.com", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let (service, _) = service();
        let user = service
            .signup("bob", "bob@example.com", "hunter2hunter2")
            .await
            .unwrap();

        let logged_in = service
            .login(" BOB@example.com ", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(logged_in.id(), user.id());

        for (email, password) in [
            ("bob@example.com", "wrong-password"),
            ("nobody@example.com", "hunter2hunter2"),
            ("not-an-email", "hunter2hunter2"),
        ] {
            let err = service.login(email, password).await.unwrap_err();
            assert!(matches!(err, TrackerError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (service, _) = service();
        let err = service.get_user(UserId::random()).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }
}
