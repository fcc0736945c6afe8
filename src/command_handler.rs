//! Routes gateway events into the conversation engine and the store.
//!
//! Free text on the wire cannot say whether it is a message body or a time,
//! so the router consults the session's current step: `AwaitingText` input
//! becomes `text_input`, `AwaitingTime` input becomes `time_input`, and
//! anything typed while idle (or while a repeat choice is pending) is not
//! this component's concern and is ignored.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, info};

use crate::core::error::ConversationError;
use crate::core::response;
use crate::database::Database;
use crate::features::conversation::{ConversationEngine, StepKind};
use crate::features::reminders::Repeat;
use crate::gateway::protocol::ClientEvent;

pub struct CommandHandler {
    engine: ConversationEngine,
    database: Database,
    offset: FixedOffset,
}

impl CommandHandler {
    pub fn new(database: Database, offset: FixedOffset) -> Self {
        CommandHandler {
            engine: ConversationEngine::new(),
            database,
            offset,
        }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Handle one client event. `Ok(None)` means the event produced no
    /// reply (it was not addressed to the bot's capture flow).
    pub async fn handle_event(&self, owner_id: i64, event: ClientEvent) -> Result<Option<String>> {
        match event {
            // Identification is the gateway's concern.
            ClientEvent::Hello { .. } => Ok(None),
            ClientEvent::StartReminder => {
                self.engine.start(owner_id);
                Ok(Some(response::prompt_text()))
            }
            ClientEvent::Message { text } => self.handle_message(owner_id, &text),
            ClientEvent::RepeatChoice { repeat } => {
                self.handle_repeat_choice(owner_id, repeat).await
            }
            ClientEvent::ListReminders => {
                let reminders = self.database.reminders_for(owner_id).await?;
                Ok(Some(response::render_list(&reminders)))
            }
            ClientEvent::DeleteReminder { id } => {
                if self.database.delete_owned(id, owner_id).await? {
                    info!("Deleted reminder {id} for user {owner_id}");
                    Ok(Some(response::deleted(id)))
                } else {
                    Ok(Some(response::not_found(id)))
                }
            }
        }
    }

    fn handle_message(&self, owner_id: i64, text: &str) -> Result<Option<String>> {
        match self.engine.current_step(owner_id) {
            None | Some(StepKind::AwaitingRepeat) => {
                debug!("Ignoring free text from user {owner_id} outside a capture step");
                Ok(None)
            }
            Some(StepKind::AwaitingText) => {
                Ok(Some(match self.engine.text_input(owner_id, text) {
                    Ok(()) => response::prompt_time(),
                    Err(e) => response::validation_retry(&e),
                }))
            }
            Some(StepKind::AwaitingTime) => Ok(Some(
                match self.engine.time_input(owner_id, text, self.now()) {
                    Ok(_) => response::prompt_repeat(),
                    Err(e) => response::validation_retry(&e),
                },
            )),
        }
    }

    async fn handle_repeat_choice(&self, owner_id: i64, repeat: Repeat) -> Result<Option<String>> {
        match self.engine.complete(owner_id, repeat) {
            Ok(draft) => {
                let id = self
                    .database
                    .add_reminder(owner_id, &draft.text, draft.due_at, draft.repeat)
                    .await?;
                info!(
                    "Stored reminder {id} for user {owner_id} (due {}, repeat {})",
                    draft.due_at, draft.repeat
                );
                Ok(Some(response::confirmation(&draft)))
            }
            Err(ConversationError::SessionExpired) => Ok(Some(response::session_expired())),
            Err(e) => Ok(Some(response::validation_retry(&e))),
        }
    }
}
