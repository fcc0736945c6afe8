//! # Reminders Feature
//!
//! Durable reminders with repeat cadences and scheduled delivery.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

pub mod repeat;
pub mod scheduler;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub use repeat::Repeat;
pub use scheduler::{Notifier, ReminderScheduler};

/// A persisted reminder.
///
/// `due_at` is the only field that ever "changes", and only by recreation:
/// when a repeating reminder fires, the store row is deleted and a new one
/// is inserted with an advanced `due_at`. All fields are immutable in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Store-assigned id (SQLite rowid), unique and immutable.
    pub id: i64,
    pub owner_id: i64,
    /// Non-empty user-supplied message body.
    pub text: String,
    /// Always carries the system's single fixed UTC offset.
    pub due_at: DateTime<FixedOffset>,
    pub repeat: Repeat,
}
