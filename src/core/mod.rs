//! # Core Module
//!
//! Configuration, error taxonomy, and user-facing response text for the
//! reminder bot.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::{ConversationError, NotifierError};
