//! User-facing reply text
//!
//! Every string a user can see lives here, so the transport layer stays
//! free of wording decisions and tests can assert against one place.

use chrono::{DateTime, FixedOffset};

use crate::core::error::ConversationError;
use crate::features::conversation::ReminderDraft;
use crate::features::reminders::{Reminder, Repeat};

/// Greeting sent when a client identifies itself on the gateway.
pub fn welcome() -> String {
    "👋 Hi! I'm your reminder bot. Your reminders are stored safely and survive restarts.".to_string()
}

/// Sent when a client speaks before identifying itself.
pub fn hello_required() -> String {
    "❌ Identify yourself with a Hello event first.".to_string()
}

pub fn prompt_text() -> String {
    "📝 What should I remind you about?".to_string()
}

pub fn prompt_time() -> String {
    "⏰ When? Send a time as HH:MM, e.g. 15:30".to_string()
}

pub fn prompt_repeat() -> String {
    "🔁 How often should it repeat? (none, daily, weekly, monthly)".to_string()
}

/// Retry prompt for a failed validation; the session stays on its step.
pub fn validation_retry(error: &ConversationError) -> String {
    match error {
        ConversationError::EmptyMessage => {
            "❌ That message is empty. Tell me what to remind you about.".to_string()
        }
        ConversationError::InvalidTimeFormat | ConversationError::TimeOutOfRange { .. } => {
            "❌ I couldn't read that time. Use HH:MM, e.g. 15:30".to_string()
        }
        ConversationError::SessionExpired => session_expired(),
    }
}

pub fn session_expired() -> String {
    "❌ That session has expired. Start a new reminder to try again.".to_string()
}

pub fn confirmation(draft: &ReminderDraft) -> String {
    format!(
        "✅ Reminder saved!\n💬 {}\n⏰ {}\n🔄 {}",
        draft.text,
        format_time(draft.due_at),
        repeat_label(draft.repeat)
    )
}

/// The message delivered when a reminder comes due.
pub fn fired(text: &str) -> String {
    format!("🔔 {text}")
}

pub fn render_list(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return "📌 You have no reminders.".to_string();
    }

    let mut out = String::from("📋 Your reminders:\n");
    for reminder in reminders {
        out.push_str(&format!(
            "\n#{} 🔔 {}\n⏰ {} · {}\n",
            reminder.id,
            reminder.text,
            format_time(reminder.due_at),
            repeat_label(reminder.repeat)
        ));
    }
    out.push_str("\nDelete one with a delete request for its #id.");
    out
}

pub fn deleted(id: i64) -> String {
    format!("🗑️ Reminder #{id} deleted.")
}

pub fn not_found(id: i64) -> String {
    format!("❌ Reminder #{id} not found — it may already be gone.")
}

pub fn generic_failure() -> String {
    "⚠️ Something went wrong on my side. Please try again.".to_string()
}

/// `DD.MM HH:MM`, the compact format the listing and confirmations use.
pub fn format_time(due_at: DateTime<FixedOffset>) -> String {
    due_at.format("%d.%m %H:%M").to_string()
}

pub fn repeat_label(repeat: Repeat) -> &'static str {
    match repeat {
        Repeat::None => "🚫 no repeat",
        Repeat::Daily => "🔁 daily",
        Repeat::Weekly => "📅 weekly",
        Repeat::Monthly => "🗓️ monthly",
    }
}
