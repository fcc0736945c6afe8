//! # Features Layer
//!
//! Feature modules built on the core layer.

pub mod conversation;
pub mod reminders;

pub use conversation::{ConversationEngine, ReminderDraft, SessionStep, StepKind};
pub use reminders::{Notifier, Reminder, ReminderScheduler, Repeat};
