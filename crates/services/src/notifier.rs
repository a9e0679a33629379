use std::env;
use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::NotifyError;

/// What gets sent after a learner saves notes for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesNotification {
    pub to: String,
    pub day: u8,
    pub lesson_title: String,
    pub notes: String,
    pub quiz_score: Option<u32>,
    pub total_questions: u32,
}

impl NotesNotification {
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Day {} Learning Notes: {}", self.day, self.lesson_title)
    }

    /// Plain-text body: lesson header, the notes, and the score when present.
    #[must_use]
    pub fn text_body(&self) -> String {
        let mut body = format!(
            "Day {}: {}\n\nYOUR LEARNING NOTES:\n{}\n",
            self.day, self.lesson_title, self.notes
        );
        if let Some(score) = self.quiz_score {
            let percent = if self.total_questions == 0 {
                0
            } else {
                (f64::from(score) / f64::from(self.total_questions) * 100.0).round() as i64
            };
            let _ = write!(
                body,
                "\nQUIZ SCORE: {score}/{} ({percent}%)\n",
                self.total_questions
            );
        }
        body
    }
}

/// Outbound channel for notes notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` if delivery fails.
    async fn send(&self, notification: &NotesNotification) -> Result<(), NotifyError>;
}

/// Records notifications as log events instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &NotesNotification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            day = notification.day,
            subject = %notification.subject(),
            "notes notification"
        );
        Ok(())
    }
}

//
// ─── EMAIL ─────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: String,
    pub from: String,
}

impl EmailConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("LESSONS_EMAIL_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("LESSONS_EMAIL_BASE_URL").unwrap_or_else(|_| "https://api.resend.com".into());
        let from = env::var("LESSONS_EMAIL_FROM")
            .unwrap_or_else(|_| "Daily Lessons <onboarding@resend.dev>".into());
        Some(Self {
            base_url,
            api_key,
            from,
        })
    }
}

/// Upper bound on one email request, connect included.
pub const EMAIL_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends notes by email through a Resend-compatible `/emails` endpoint.
#[derive(Clone)]
pub struct EmailNotifier {
    client: Client,
    config: Option<EmailConfig>,
}

impl EmailNotifier {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(EmailConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<EmailConfig>) -> Self {
        let client = Client::builder()
            .timeout(EMAIL_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "email client builder failed, using defaults");
                Client::new()
            });
        Self { client, config }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &NotesNotification) -> Result<(), NotifyError> {
        let config = self.config.as_ref().ok_or(NotifyError::Disabled)?;

        let url = format!("{}/emails", config.base_url.trim_end_matches('/'));
        let payload = EmailRequest {
            from: &config.from,
            to: vec![notification.to.as_str()],
            subject: notification.subject(),
            text: notification.text_body(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    text: String,
}
