//! # Reminder Scheduler
//!
//! The one long-lived background task in the bot: polls the store on a
//! fixed interval, delivers due reminders, and re-enqueues repeating ones.
//!
//! Delivery is at-least-once: a send failure leaves the row untouched so
//! the next cycle retries it, and a crash between send and delete causes a
//! redelivery on restart. The same stored row is never fired twice within
//! one run because deletion happens before the next poll can observe it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::core::error::NotifierError;
use crate::database::Database;

/// Delivers a message to a user. Implemented by the transport; may fail
/// transiently, and ordinary delivery failures come back as `Err`, never
/// as a panic.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, owner_id: i64, text: &str) -> Result<(), NotifierError>;
}

/// Background dispatcher for due reminders.
pub struct ReminderScheduler<N> {
    database: Database,
    notifier: N,
    poll_interval: Duration,
    offset: FixedOffset,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(database: Database, notifier: N, poll_interval: Duration, offset: FixedOffset) -> Self {
        ReminderScheduler {
            database,
            notifier,
            poll_interval,
            offset,
        }
    }

    /// Run the polling loop until the shutdown channel fires (or its
    /// sender is dropped). A failed cycle is logged and retried on the
    /// next tick; nothing here brings the process down.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "⏰ Reminder scheduler started (polling every {:?})",
            self.poll_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Utc::now().with_timezone(&self.offset);
                    match self.run_cycle(now).await {
                        Ok(0) => {}
                        Ok(delivered) => debug!("Delivered {delivered} reminder(s) this cycle"),
                        Err(e) => error!("Reminder cycle failed, retrying next tick: {e:#}"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("⏰ Reminder scheduler stopped");
                    return;
                }
            }
        }
    }

    /// One dispatch cycle at the given instant. Public so tests can drive
    /// cycles deterministically instead of waiting on real time.
    ///
    /// Returns how many reminders were delivered.
    pub async fn run_cycle(&self, now: DateTime<FixedOffset>) -> Result<usize> {
        let due = self.database.due_reminders(now).await?;
        let mut delivered = 0;

        for reminder in due {
            if let Err(e) = self.notifier.send(reminder.owner_id, &reminder.text).await {
                // Leave the row in place; the next cycle retries it.
                warn!(
                    "Could not deliver reminder {} to user {}: {e}",
                    reminder.id, reminder.owner_id
                );
                continue;
            }
            delivered += 1;

            self.database.delete_reminder(reminder.id).await?;

            if let Some(next_due) = reminder.repeat.next_occurrence(now) {
                let successor_id = self
                    .database
                    .add_reminder(reminder.owner_id, &reminder.text, next_due, reminder.repeat)
                    .await?;
                debug!(
                    "Rescheduled reminder {} as {} (due {})",
                    reminder.id, successor_id, next_due
                );
            }
        }

        Ok(delivered)
    }
}
