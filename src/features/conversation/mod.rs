//! # Conversation Feature
//!
//! Per-user multi-step capture of a reminder draft: message text, then a
//! time of day, then a repeat cadence.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod engine;

pub use engine::{ConversationEngine, ReminderDraft, SessionStep, StepKind};
