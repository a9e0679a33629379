//! Domain model for the 30-day curriculum tracker: lessons, per-user
//! progress, streaks, accounts, quizzes and weekly reviews.

pub mod error;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
