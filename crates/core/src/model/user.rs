use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::UserId;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username must be between 3 and 50 characters")]
    InvalidUsername,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must be at least 8 characters")]
    PasswordTooShort,

    #[error("password hash cannot be empty")]
    MissingPasswordHash,
}

/// Validated signup input. The password is still plain text here; hashing is
/// done by the account service before anything is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct SignupDraft {
    username: String,
    email: String,
    password: String,
}

impl SignupDraft {
    /// Validate signup fields.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for a bad username, email, or short password.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, UserError> {
        let username = username.into().trim().to_owned();
        let len = username.chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            return Err(UserError::InvalidUsername);
        }
        let email = normalize_email(&email.into())?;
        let password = password.into();
        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(UserError::PasswordTooShort);
        }
        Ok(Self {
            username,
            email,
            password,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for SignupDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupDraft")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Lower-cases and sanity-checks an email address (`local@domain.tld`).
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` when the shape is wrong.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@').ok_or(UserError::InvalidEmail)?;
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) || !domain_ok
    {
        return Err(UserError::InvalidEmail);
    }
    Ok(email)
}

/// A registered account.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    #[serde(skip_serializing)]
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from already-validated parts.
    ///
    /// # Errors
    ///
    /// Returns `UserError::MissingPasswordHash` if the hash is empty.
    pub fn new(
        id: UserId,
        draft: &SignupDraft,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(
            id,
            draft.username().to_owned(),
            draft.email().to_owned(),
            password_hash,
            created_at,
        )
    }

    /// Rehydrate a user from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError::MissingPasswordHash` if the hash is empty.
    pub fn from_persisted(
        id: UserId,
        username: String,
        email: String,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if password_hash.is_empty() {
            return Err(UserError::MissingPasswordHash);
        }
        Ok(Self {
            id,
            username,
            email,
            password_hash,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
