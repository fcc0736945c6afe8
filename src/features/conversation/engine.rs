//! The per-user conversation state machine.
//!
//! A session lives in a process-local map keyed by owner id; "idle" is the
//! absence of an entry. Draft fields ride inside the step variant, so a
//! step can only ever see the data its predecessors validated. Sessions
//! have no TTL: an abandoned one sits until the same user starts over,
//! which is a single trigger away (last-writer-wins).

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use regex::Regex;

use crate::core::error::ConversationError;
use crate::features::reminders::Repeat;

/// Which input a session is waiting for, with the draft accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    AwaitingText,
    AwaitingTime {
        text: String,
    },
    AwaitingRepeat {
        text: String,
        due_at: DateTime<FixedOffset>,
    },
}

/// Data-free view of a session step, for routing free-text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    AwaitingText,
    AwaitingTime,
    AwaitingRepeat,
}

/// A fully captured reminder, ready for insertion into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderDraft {
    pub text: String,
    pub due_at: DateTime<FixedOffset>,
    pub repeat: Repeat,
}

/// Turns a sequence of free-text inputs from one user into exactly one
/// completed [`ReminderDraft`], validating each step before advancing.
///
/// Every operation is an atomic read-modify-write on that user's map entry,
/// so two concurrent messages from the same user cannot race through the
/// same step. Sessions of different users never interact.
pub struct ConversationEngine {
    sessions: DashMap<i64, SessionStep>,
    time_format: Regex,
}

impl ConversationEngine {
    pub fn new() -> Self {
        ConversationEngine {
            sessions: DashMap::new(),
            time_format: Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").expect("valid time pattern"),
        }
    }

    /// Begin (or restart) a capture flow for this user. A re-entrant start
    /// replaces whatever session existed; there is no merging.
    pub fn start(&self, owner_id: i64) {
        if self.sessions.insert(owner_id, SessionStep::AwaitingText).is_some() {
            debug!("User {owner_id} restarted their reminder flow mid-capture");
        }
    }

    /// The step this user's session is on, if any. `None` means idle.
    pub fn current_step(&self, owner_id: i64) -> Option<StepKind> {
        self.sessions.get(&owner_id).map(|session| match session.value() {
            SessionStep::AwaitingText => StepKind::AwaitingText,
            SessionStep::AwaitingTime { .. } => StepKind::AwaitingTime,
            SessionStep::AwaitingRepeat { .. } => StepKind::AwaitingRepeat,
        })
    }

    /// Accept the reminder text. Empty input (after trimming) is a
    /// validation error and the session stays on this step.
    pub fn text_input(&self, owner_id: i64, input: &str) -> Result<(), ConversationError> {
        let mut entry = match self.sessions.entry(owner_id) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return Err(ConversationError::SessionExpired),
        };
        if !matches!(entry.get(), SessionStep::AwaitingText) {
            return Err(ConversationError::SessionExpired);
        }

        let text = input.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        entry.insert(SessionStep::AwaitingTime {
            text: text.to_string(),
        });
        Ok(())
    }

    /// Accept an `HH:MM` time and compute the due instant: today at that
    /// time in the fixed offset, rolled forward one day if it is not
    /// strictly after `now`. On any parse or range error the session (and
    /// the stored text) stays exactly where it was.
    pub fn time_input(
        &self,
        owner_id: i64,
        input: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, ConversationError> {
        let mut entry = match self.sessions.entry(owner_id) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return Err(ConversationError::SessionExpired),
        };
        let text = match entry.get() {
            SessionStep::AwaitingTime { text } => text.clone(),
            _ => return Err(ConversationError::SessionExpired),
        };

        let due_at = self.parse_due_time(input.trim(), now)?;
        entry.insert(SessionStep::AwaitingRepeat { text, due_at });
        Ok(due_at)
    }

    /// Accept the repeat choice and finish the flow. Only valid while the
    /// session awaits a repeat choice; anything else (stale button press,
    /// duplicate selection, concurrent restart) is answered with
    /// `SessionExpired` and changes nothing.
    pub fn complete(
        &self,
        owner_id: i64,
        repeat: Repeat,
    ) -> Result<ReminderDraft, ConversationError> {
        match self.sessions.entry(owner_id) {
            Entry::Occupied(entry) => {
                if !matches!(entry.get(), SessionStep::AwaitingRepeat { .. }) {
                    return Err(ConversationError::SessionExpired);
                }
                match entry.remove() {
                    SessionStep::AwaitingRepeat { text, due_at } => {
                        Ok(ReminderDraft { text, due_at, repeat })
                    }
                    _ => Err(ConversationError::SessionExpired),
                }
            }
            Entry::Vacant(_) => Err(ConversationError::SessionExpired),
        }
    }

    fn parse_due_time(
        &self,
        input: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, ConversationError> {
        let captures = self
            .time_format
            .captures(input)
            .ok_or(ConversationError::InvalidTimeFormat)?;
        let hour: u32 = captures[1]
            .parse()
            .map_err(|_| ConversationError::InvalidTimeFormat)?;
        let minute: u32 = captures[2]
            .parse()
            .map_err(|_| ConversationError::InvalidTimeFormat)?;
        if hour > 23 || minute > 59 {
            return Err(ConversationError::TimeOutOfRange { hour, minute });
        }

        let wall = now
            .date_naive()
            .and_hms_opt(hour, minute, 0)
            .ok_or(ConversationError::TimeOutOfRange { hour, minute })?;
        let due_at = now
            .offset()
            .from_local_datetime(&wall)
            .single()
            .ok_or(ConversationError::InvalidTimeFormat)?;

        // A time already past today rolls to tomorrow; a reminder never
        // fires into the past.
        if due_at <= now {
            Ok(due_at + Duration::days(1))
        } else {
            Ok(due_at)
        }
    }
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: i64 = 42;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        offset().with_ymd_and_hms(2026, 8, 30, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_full_flow_rolls_past_time_to_tomorrow() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "Buy milk").unwrap();

        // 09:00 entered at 09:30 means tomorrow 09:00.
        let due_at = engine.time_input(OWNER, "09:00", at(9, 30)).unwrap();
        assert_eq!(due_at, offset().with_ymd_and_hms(2026, 8, 31, 9, 0, 0).unwrap());

        let draft = engine.complete(OWNER, Repeat::Daily).unwrap();
        assert_eq!(draft.text, "Buy milk");
        assert_eq!(draft.due_at, due_at);
        assert_eq!(draft.repeat, Repeat::Daily);
        assert_eq!(engine.current_step(OWNER), None);
    }

    #[test]
    fn test_future_time_stays_today() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "Stand up").unwrap();

        let due_at = engine.time_input(OWNER, "15:30", at(9, 30)).unwrap();
        assert_eq!(due_at, at(15, 30));
    }

    #[test]
    fn test_exact_now_rolls_forward() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "x").unwrap();

        // Not strictly after now, so it rolls a day.
        let due_at = engine.time_input(OWNER, "09:30", at(9, 30)).unwrap();
        assert_eq!(due_at, offset().with_ymd_and_hms(2026, 8, 31, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_empty_text_is_rejected_and_step_kept() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);

        assert_eq!(
            engine.text_input(OWNER, "   "),
            Err(ConversationError::EmptyMessage)
        );
        assert_eq!(engine.current_step(OWNER), Some(StepKind::AwaitingText));

        engine.text_input(OWNER, "  trimmed  ").unwrap();
        assert_eq!(engine.current_step(OWNER), Some(StepKind::AwaitingTime));
    }

    #[test]
    fn test_bad_time_keeps_draft_intact() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "Water plants").unwrap();

        assert_eq!(
            engine.time_input(OWNER, "soonish", at(9, 0)),
            Err(ConversationError::InvalidTimeFormat)
        );
        assert_eq!(
            engine.time_input(OWNER, "24:00", at(9, 0)),
            Err(ConversationError::TimeOutOfRange { hour: 24, minute: 0 })
        );
        assert_eq!(
            engine.time_input(OWNER, "12:60", at(9, 0)),
            Err(ConversationError::TimeOutOfRange { hour: 12, minute: 60 })
        );
        assert_eq!(engine.current_step(OWNER), Some(StepKind::AwaitingTime));

        // The stored text survived all the failed attempts.
        engine.time_input(OWNER, "10:00", at(9, 0)).unwrap();
        let draft = engine.complete(OWNER, Repeat::None).unwrap();
        assert_eq!(draft.text, "Water plants");
    }

    #[test]
    fn test_boundary_times_parse() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "x").unwrap();
        engine.time_input(OWNER, "23:59", at(9, 0)).unwrap();

        engine.start(OWNER);
        engine.text_input(OWNER, "x").unwrap();
        let due_at = engine.time_input(OWNER, "0:00", at(9, 0)).unwrap();
        // Midnight already passed today, so tomorrow.
        assert_eq!(due_at, offset().with_ymd_and_hms(2026, 8, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_complete_without_session_is_expired_noop() {
        let engine = ConversationEngine::new();
        assert_eq!(
            engine.complete(OWNER, Repeat::Daily),
            Err(ConversationError::SessionExpired)
        );
    }

    #[test]
    fn test_complete_on_wrong_step_is_expired_and_preserves_state() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "Tea").unwrap();

        assert_eq!(
            engine.complete(OWNER, Repeat::Daily),
            Err(ConversationError::SessionExpired)
        );
        // The stale choice did not disturb the in-progress session.
        assert_eq!(engine.current_step(OWNER), Some(StepKind::AwaitingTime));
    }

    #[test]
    fn test_restart_overwrites_session() {
        let engine = ConversationEngine::new();
        engine.start(OWNER);
        engine.text_input(OWNER, "Old draft").unwrap();

        engine.start(OWNER);
        assert_eq!(engine.current_step(OWNER), Some(StepKind::AwaitingText));

        engine.text_input(OWNER, "New draft").unwrap();
        engine.time_input(OWNER, "18:00", at(9, 0)).unwrap();
        let draft = engine.complete(OWNER, Repeat::None).unwrap();
        assert_eq!(draft.text, "New draft");
    }

    #[test]
    fn test_users_do_not_interfere() {
        let engine = ConversationEngine::new();
        engine.start(1);
        engine.start(2);
        engine.text_input(1, "for one").unwrap();

        assert_eq!(engine.current_step(1), Some(StepKind::AwaitingTime));
        assert_eq!(engine.current_step(2), Some(StepKind::AwaitingText));
        assert_eq!(engine.current_step(3), None);
    }
}
