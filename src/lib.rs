// Core layer - configuration, error taxonomy, response text
pub mod core;

// Features layer - conversation capture and reminder scheduling
pub mod features;

// Gateway layer - framed-JSON transport between clients and the core
pub mod gateway;

// Infrastructure
pub mod database;

// Application layer
pub mod command_handler;

// Re-export core config for convenience
pub use core::Config;

pub use command_handler::CommandHandler;
pub use database::Database;
pub use features::{
    // Conversation
    ConversationEngine, ReminderDraft,
    // Reminders
    Notifier, Reminder, ReminderScheduler, Repeat,
};
pub use gateway::{ClientEvent, GatewayNotifier, GatewayServer, ServerEvent};
