//! Error taxonomy for the reminder core.
//!
//! Nothing in here is fatal to the process. Conversation errors keep the
//! session on its current step; notifier errors leave the reminder in the
//! store for the next scheduler cycle. Storage failures travel as
//! `anyhow::Error` with context attached at the database layer.

use thiserror::Error;

/// Recoverable errors from the conversation state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// The reminder text was empty after trimming.
    #[error("reminder text is empty")]
    EmptyMessage,

    /// The time input did not look like `HH:MM`.
    #[error("time must be given as HH:MM")]
    InvalidTimeFormat,

    /// The time input parsed but the hour or minute is out of range.
    #[error("time {hour:02}:{minute:02} is out of range")]
    TimeOutOfRange { hour: u32, minute: u32 },

    /// An input arrived for a step no session is waiting on. Always a
    /// no-op: the stale event is answered, existing state is untouched.
    #[error("no session is awaiting this input")]
    SessionExpired,
}

/// A notifier could not deliver a message. Ordinary delivery failures
/// (recipient unreachable, connection gone) are reported this way, never
/// as a panic or a fatal error.
#[derive(Debug, Clone, Error)]
#[error("delivery failed: {0}")]
pub struct NotifierError(String);

impl NotifierError {
    pub fn new(reason: impl Into<String>) -> Self {
        NotifierError(reason.into())
    }
}
